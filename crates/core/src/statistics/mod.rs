//! Timesheet statistics

pub mod service;

pub use service::StatisticService;
