//! Customers, projects and activities

pub mod ports;
pub mod service;

pub use ports::{ActivityRepository, CustomerRepository, ProjectRepository};
pub use service::ProjectService;
