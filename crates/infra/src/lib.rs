//! # Kimai Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite repositories and the schema-owning `DbManager`
//! - Configuration loading (environment, TOML, JSON)
//! - Invoice document store and renderers
//! - HTTP client, marketplace catalogue and DeepL client
//! - XLIFF translation tooling and maintenance commands
//!
//! ## Architecture
//! - Implements traits defined in `kimai-core`
//! - Depends on `kimai-common` and `kimai-domain`
//! - Contains all "impure" code (I/O, network, filesystem)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod invoice;
pub mod maintenance;
pub mod marketplace;
pub mod translations;

// Re-export commonly used items
pub use database::{sqlite_repositories, DbManager};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use invoice::{default_renderers, FilesystemDocumentStore};
pub use marketplace::HttpMarketplace;
