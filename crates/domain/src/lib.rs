//! # Kimai Domain
//!
//! Business domain types and models for Kimai.
//!
//! This crate contains:
//! - Entities (users, customers, projects, activities, timesheets, invoices)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Query models, statistic models and permissions
//! - Pure helpers for durations, money and file names
//!
//! ## Architecture
//! - No dependencies on other Kimai crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod permissions;
pub mod query;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use permissions::{Permission, Role};
pub use types::*;
