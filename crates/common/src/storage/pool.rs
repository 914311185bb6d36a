//! SQLite connection pool
//!
//! r2d2-based pooling with pragmas applied on connection init.

use std::time::Instant;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::config::StorageConfig;
use super::connection::SqliteConnection;
use super::error::{StorageError, StorageResult};
use super::pragmas::apply_connection_pragmas;

/// Snapshot of pool state for health endpoints
#[derive(Debug, Clone, Serialize)]
pub struct PoolHealth {
    pub healthy: bool,
    pub connections: u32,
    pub idle_connections: u32,
    pub max_connections: u32,
    pub message: Option<String>,
}

/// SQLite connection pool
#[derive(Debug)]
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    config: StorageConfig,
}

impl SqlitePool {
    /// Create a pool for the database at `config.path`.
    ///
    /// The parent directory is created when missing. A test connection is
    /// acquired before returning so that bad paths fail early.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid, the directory
    /// cannot be created, or the first connection cannot be opened.
    #[instrument(skip(config), fields(db_path = ?config.path, pool_size = config.pool_size))]
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        config.validate()?;

        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pragma_config = config.clone();
        let manager = SqliteConnectionManager::file(&config.path).with_init(move |conn| {
            apply_connection_pragmas(conn, &pragma_config)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        });

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| {
                warn!("Failed to create connection pool: {}", e);
                StorageError::Connection(format!("Failed to create pool: {e}"))
            })?;

        info!("SQLite pool created with {} connections", config.pool_size);

        Ok(Self { pool, config: config.clone() })
    }

    /// Acquire a connection from the pool.
    ///
    /// # Errors
    /// Returns [`StorageError::Timeout`] when no connection frees up within
    /// the configured timeout.
    pub fn get(&self) -> StorageResult<SqliteConnection> {
        let start = Instant::now();
        match self.pool.get() {
            Ok(conn) => {
                debug!(elapsed_ms = start.elapsed().as_millis() as u64, "connection acquired");
                Ok(SqliteConnection::new(conn))
            }
            Err(e) => {
                if e.to_string().to_lowercase().contains("timed out") {
                    warn!("Connection timeout after {:?}", self.config.connection_timeout);
                    Err(StorageError::Timeout(self.config.connection_timeout.as_secs()))
                } else {
                    warn!("Connection error: {}", e);
                    Err(StorageError::Connection(format!("Failed to get connection: {e}")))
                }
            }
        }
    }

    /// Report pool utilisation and whether a connection can be acquired.
    pub fn health(&self) -> PoolHealth {
        let state = self.pool.state();
        let probe = self.pool.get().map_err(|e| e.to_string()).and_then(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0)).map_err(|e| e.to_string())
        });

        PoolHealth {
            healthy: probe.is_ok(),
            connections: state.connections,
            idle_connections: state.idle_connections,
            max_connections: self.config.pool_size,
            message: probe.err(),
        }
    }

    /// Configuration the pool was built with
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}
