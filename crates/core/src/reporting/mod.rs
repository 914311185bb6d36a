//! Reports across projects

pub mod service;

pub use service::ReportingService;
