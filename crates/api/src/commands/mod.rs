//! HTTP handlers, one module per resource

pub mod invoices;
pub mod plugins;
pub mod projects;
pub mod quick_entry;
pub mod reporting;
pub mod statistics;
pub mod system;
pub mod timesheets;
pub mod users;
