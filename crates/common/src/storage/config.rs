//! Storage configuration
//!
//! Connection pool settings and SQLite pragma toggles.

use std::path::PathBuf;
use std::time::Duration;

use super::error::{StorageError, StorageResult};

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Database file path
    pub path: PathBuf,

    /// Connection pool size (default: 8)
    pub pool_size: u32,

    /// Connection timeout (default: 5s)
    pub connection_timeout: Duration,

    /// Busy timeout for SQLite operations (default: 5000ms)
    pub busy_timeout: Duration,

    /// Enable WAL journal mode (default: true)
    pub enable_wal: bool,

    /// Enable foreign key constraints (default: true)
    pub enable_foreign_keys: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("var/data/kimai.sqlite"),
            pool_size: 8,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_millis(5000),
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

impl StorageConfig {
    /// Create a new configuration with the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Set the connection pool size
    #[must_use]
    pub fn with_pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    /// Set the busy timeout
    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Toggle WAL journal mode
    #[must_use]
    pub fn with_wal(mut self, enabled: bool) -> Self {
        self.enable_wal = enabled;
        self
    }

    /// Ensure all values are within acceptable ranges.
    ///
    /// # Errors
    /// Returns [`StorageError::InvalidConfig`] for a zero or oversized pool,
    /// zero timeouts, or an empty path.
    pub fn validate(&self) -> StorageResult<()> {
        if self.pool_size == 0 {
            return Err(StorageError::InvalidConfig(
                "pool_size must be greater than 0".to_string(),
            ));
        }
        if self.pool_size > 64 {
            return Err(StorageError::InvalidConfig("pool_size too large (max: 64)".to_string()));
        }
        if self.connection_timeout.is_zero() || self.busy_timeout.is_zero() {
            return Err(StorageError::InvalidConfig("timeouts must be greater than 0".to_string()));
        }
        if self.path.as_os_str().is_empty() {
            return Err(StorageError::InvalidConfig("database path cannot be empty".to_string()));
        }
        Ok(())
    }
}
