//! SQLite-backed user repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use kimai_common::storage::SqliteConnection;
use kimai_core::UserRepository;
use kimai_domain::query::Visibility;
use kimai_domain::{KimaiError, Result, Role, User};
use rusqlite::{Row, ToSql};
use tokio::task;

use super::manager::DbManager;
use super::rows::{
    bool_to_int, from_optional_timestamp, int_to_bool, map_join_error, map_storage_error,
    parse_column,
};

const USER_COLUMNS: &str = "id, username, email, alias, title, enabled, roles, timezone, \
     language, api_token, hourly_rate, internal_rate, created_at";

const INSERT_USER_SQL: &str = "INSERT INTO users (
        username, email, alias, title, enabled, roles, timezone, language,
        api_token, hourly_rate, internal_rate, created_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

const UPDATE_USER_SQL: &str = "UPDATE users SET
        username = ?2, email = ?3, alias = ?4, title = ?5, enabled = ?6, roles = ?7,
        timezone = ?8, language = ?9, api_token = ?10, hourly_rate = ?11, internal_rate = ?12
    WHERE id = ?1";

/// User accounts stored in SQLite.
pub struct SqliteUserRepository {
    db: Arc<DbManager>,
}

impl SqliteUserRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn find(&self, id: i64) -> Result<Option<User>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Option<User>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
            conn.query_optional(&sql, &[&id], map_user_row).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let db = Arc::clone(&self.db);
        let username = username.to_string();
        task::spawn_blocking(move || -> Result<Option<User>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
            conn.query_optional(&sql, &[&username], map_user_row).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<User>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<User>> {
            let conn = db.get_connection()?;
            let filter = match visibility {
                Visibility::Visible => " WHERE enabled = 1",
                Visibility::Hidden => " WHERE enabled = 0",
                Visibility::Both => "",
            };
            let sql = format!("SELECT {USER_COLUMNS} FROM users{filter} ORDER BY username");
            let mut stmt = conn.prepare(&sql).map_err(map_storage_error)?;
            stmt.query_map(&[], map_user_row).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn create(&self, user: User) -> Result<User> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<User> {
            let conn = db.get_connection()?;
            insert_user(&conn, user)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update(&self, user: &User) -> Result<()> {
        let db = Arc::clone(&self.db);
        let user = user.clone();
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let roles = encode_roles(&user.roles);
            let enabled = bool_to_int(user.enabled);
            let params: [&dyn ToSql; 12] = [
                &user.id,
                &user.username,
                &user.email,
                &user.alias,
                &user.title,
                &enabled,
                &roles,
                &user.timezone,
                &user.language,
                &user.api_token,
                &user.hourly_rate,
                &user.internal_rate,
            ];
            let changed = conn.execute(UPDATE_USER_SQL, &params).map_err(map_storage_error)?;
            if changed == 0 {
                return Err(KimaiError::not_found("User", user.id));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

fn insert_user(conn: &SqliteConnection, mut user: User) -> Result<User> {
    let created_at = user.created_at.unwrap_or_else(Utc::now);
    let roles = encode_roles(&user.roles);
    let enabled = bool_to_int(user.enabled);
    let created_ts = created_at.timestamp();
    let params: [&dyn ToSql; 12] = [
        &user.username,
        &user.email,
        &user.alias,
        &user.title,
        &enabled,
        &roles,
        &user.timezone,
        &user.language,
        &user.api_token,
        &user.hourly_rate,
        &user.internal_rate,
        &created_ts,
    ];
    conn.execute(INSERT_USER_SQL, &params).map_err(map_storage_error)?;
    user.id = conn.last_insert_rowid();
    user.created_at = Some(created_at);
    Ok(user)
}

fn encode_roles(roles: &[Role]) -> String {
    roles.iter().map(Role::as_str).collect::<Vec<_>>().join(",")
}

fn decode_roles(idx: usize, raw: &str) -> rusqlite::Result<Vec<Role>> {
    raw.split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(|role| parse_column::<Role>(idx, role))
        .collect()
}

fn map_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let roles: String = row.get(6)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        alias: row.get(3)?,
        title: row.get(4)?,
        enabled: int_to_bool(row.get(5)?),
        roles: decode_roles(6, &roles)?,
        timezone: row.get(7)?,
        language: row.get(8)?,
        api_token: row.get(9)?,
        hourly_rate: row.get(10)?,
        internal_rate: row.get(11)?,
        created_at: from_optional_timestamp(12, row.get(12)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_through_column() {
        let roles = vec![Role::User, Role::SuperAdmin];
        let encoded = encode_roles(&roles);
        assert_eq!(encoded, "ROLE_USER,ROLE_SUPER_ADMIN");
        assert_eq!(decode_roles(0, &encoded).unwrap(), roles);
        assert!(decode_roles(0, "").unwrap().is_empty());
    }
}
