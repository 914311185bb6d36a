//! # Kimai application
//!
//! Wires the domain services to their two surfaces:
//! - the JSON API served by axum ([`http`], handlers in [`commands`])
//! - the `kimai` command line ([`cli`])
//!
//! [`AppContext`] is the dependency container both surfaces share.

pub mod cli;
pub mod commands;
pub mod context;
pub mod http;
pub mod utils;

pub use context::AppContext;
pub use http::router;
