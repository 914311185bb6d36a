//! SQLite-backed tag repository.

use std::sync::Arc;

use async_trait::async_trait;
use kimai_core::TagRepository;
use kimai_domain::{Result, Tag};
use rusqlite::params;
use tokio::task;

use super::manager::DbManager;
use super::rows::{map_join_error, map_sql_error, map_storage_error, placeholders, SqlParams};

pub struct SqliteTagRepository {
    db: Arc<DbManager>,
}

impl SqliteTagRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TagRepository for SqliteTagRepository {
    async fn list(&self) -> Result<Vec<Tag>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<Tag>> {
            let conn = db.get_connection()?;
            let mut stmt =
                conn.prepare("SELECT id, name FROM tags ORDER BY name").map_err(map_storage_error)?;
            stmt.query_map(&[], |row| Ok(Tag { id: row.get(0)?, name: row.get(1)? }))
                .map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn ensure(&self, names: &[String]) -> Result<Vec<Tag>> {
        let names: Vec<String> = names
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<Tag>> {
            let mut conn = db.get_connection()?;
            {
                let tx = conn.transaction().map_err(map_sql_error)?;
                for name in &names {
                    tx.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", params![name])
                        .map_err(map_sql_error)?;
                }
                tx.commit().map_err(map_sql_error)?;
            }

            let mut params = SqlParams::default();
            for name in &names {
                params.push(name.clone());
            }
            let sql = format!(
                "SELECT id, name FROM tags WHERE name IN ({}) ORDER BY name",
                placeholders(names.len())
            );
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map(&params.as_refs(), |row| Ok(Tag { id: row.get(0)?, name: row.get(1)? }))
                .map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }
}
