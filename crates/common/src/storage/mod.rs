//! SQLite storage primitives
//!
//! Provides an r2d2 connection pool for SQLite databases, a connection
//! wrapper with storage-level error mapping, and the per-connection pragmas
//! applied to every pooled connection.

pub mod config;
pub mod connection;
pub mod error;
pub mod pool;
pub mod pragmas;

// Re-export commonly used types
pub use config::StorageConfig;
pub use connection::{SqliteConnection, SqliteStatement};
pub use error::{StorageError, StorageResult};
pub use pool::{PoolHealth, SqlitePool};
pub use pragmas::apply_connection_pragmas;
