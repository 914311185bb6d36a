//! Modular common utilities shared across Kimai crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error types
//! - `platform`: SQLite storage (pool, connection wrapper, pragmas)
//! - `observability`: tracing instrumentation
//! - `test-utils`: temporary directories for tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod storage;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

#[cfg(feature = "platform")]
pub use storage::{StorageConfig, StorageError, StorageResult};
