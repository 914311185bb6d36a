//! Testing utilities shared by the Kimai crates
//!
//! - **[`temp`]**: self-cleaning temporary directories for databases,
//!   translation files and invoice documents.

pub mod temp;

pub use temp::TempDir;
