//! Database connection manager backed by the shared SQLite pool.

use std::path::{Path, PathBuf};

use kimai_common::storage::{PoolHealth, SqliteConnection, SqlitePool, StorageConfig};
use kimai_domain::{DatabaseConfig, KimaiError, Result};
use tracing::info;

use crate::errors::InfraError;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Database manager that wraps an [`SqlitePool`].
pub struct DbManager {
    pool: SqlitePool,
    path: PathBuf,
}

impl DbManager {
    /// Create a new manager with the given pool size.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let config = StorageConfig::new(&path).with_pool_size(pool_size.max(1));
        let pool = SqlitePool::new(&config).map_err(map_storage_error)?;

        info!(db_path = %path.display(), max_connections = config.pool_size, "sqlite pool initialised");

        Ok(Self { pool, path })
    }

    /// Build a manager from the `[database]` configuration section.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::new(&config.path, config.pool_size)
    }

    /// Borrow the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Acquire a connection from the pool.
    pub fn get_connection(&self) -> Result<SqliteConnection> {
        self.pool.get().map_err(map_storage_error)
    }

    /// Ensure the full schema exists on the current database.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        create_schema(&conn)?;
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Verify the database is accessible and responding.
    pub fn health_check(&self) -> Result<PoolHealth> {
        let health = self.pool.health();
        if !health.healthy {
            return Err(KimaiError::Database(
                health.message.unwrap_or_else(|| "database is not responding".to_string()),
            ));
        }
        Ok(health)
    }

    /// Highest applied schema version.
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT MAX(version) FROM schema_version", &[], |row| row.get(0))
            .map_err(map_storage_error)
    }
}

fn create_schema(conn: &SqliteConnection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL).map_err(map_sql_error)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, CAST(strftime('%s','now') AS INTEGER))",
        &[&SCHEMA_VERSION],
    )
    .map_err(map_storage_error)?;
    Ok(())
}

fn map_sql_error(err: rusqlite::Error) -> KimaiError {
    KimaiError::from(InfraError::from(err))
}

fn map_storage_error(err: kimai_common::storage::StorageError) -> KimaiError {
    KimaiError::from(InfraError::from(err))
}
