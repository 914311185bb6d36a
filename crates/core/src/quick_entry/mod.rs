//! Week based bulk time entry

pub mod service;

pub use service::QuickEntryService;
