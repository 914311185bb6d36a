//! Timesheet tracking

pub mod ports;
pub mod rates;
pub mod service;
pub mod validator;

pub use ports::{TagRepository, TimesheetRepository};
pub use rates::{RateCalculator, RateContext, Rates};
pub use service::TimesheetService;
pub use validator::{TimesheetValidator, ValidationContext};
