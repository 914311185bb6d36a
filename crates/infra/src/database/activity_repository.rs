//! SQLite-backed activity repository.
//!
//! Activities without a project are global and show up in every project
//! listing.

use std::sync::Arc;

use async_trait::async_trait;
use kimai_core::ActivityRepository;
use kimai_domain::{Activity, Result};
use rusqlite::{Row, ToSql};
use tokio::task;

use super::manager::DbManager;
use super::rows::{bool_to_int, int_to_bool, map_join_error, map_storage_error};

const ACTIVITY_COLUMNS: &str =
    "id, project_id, name, comment, visible, hourly_rate, fixed_rate, budget, time_budget";

const INSERT_ACTIVITY_SQL: &str = "INSERT INTO activities (
        project_id, name, comment, visible, hourly_rate, fixed_rate, budget, time_budget
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

pub struct SqliteActivityRepository {
    db: Arc<DbManager>,
}

impl SqliteActivityRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActivityRepository for SqliteActivityRepository {
    async fn find(&self, id: i64) -> Result<Option<Activity>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Option<Activity>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = ?1");
            conn.query_optional(&sql, &[&id], map_activity_row).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list(&self, project_id: Option<i64>) -> Result<Vec<Activity>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<Activity>> {
            let conn = db.get_connection()?;
            let sql = format!(
                "SELECT {ACTIVITY_COLUMNS} FROM activities
                 WHERE project_id IS NULL OR project_id = ?1
                 ORDER BY name, id"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map(&[&project_id], map_activity_row).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn create(&self, activity: Activity) -> Result<Activity> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Activity> {
            let conn = db.get_connection()?;
            let mut activity = activity;
            let visible = bool_to_int(activity.visible);
            let params: [&dyn ToSql; 8] = [
                &activity.project_id,
                &activity.name,
                &activity.comment,
                &visible,
                &activity.hourly_rate,
                &activity.fixed_rate,
                &activity.budget,
                &activity.time_budget,
            ];
            conn.execute(INSERT_ACTIVITY_SQL, &params).map_err(map_storage_error)?;
            activity.id = conn.last_insert_rowid();
            Ok(activity)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_activity_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        comment: row.get(3)?,
        visible: int_to_bool(row.get(4)?),
        hourly_rate: row.get(5)?,
        fixed_rate: row.get(6)?,
        budget: row.get(7)?,
        time_budget: row.get(8)?,
    })
}
