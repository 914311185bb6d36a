//! # Kimai Core
//!
//! Business logic of the time tracker - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for persistence, documents and the marketplace
//! - Services implementing timesheets, invoices, statistics and reports
//! - Permission checks shared by all services
//!
//! ## Architecture Principles
//! - Only depends on `kimai-domain`
//! - No database, HTTP, or filesystem code
//! - All external dependencies via traits

pub mod access;
pub mod clock;
pub mod invoice;
pub mod plugin;
pub mod project;
pub mod quick_entry;
pub mod reporting;
pub mod repositories;
pub mod statistics;
pub mod timesheet;
pub mod user;

pub use clock::{Clock, FixedClock, SystemClock};
pub use invoice::ports::{InvoiceRepository, InvoiceTemplateRepository};
pub use invoice::{InvoiceDocumentStore, InvoiceRenderer, InvoiceService, RenderedInvoice};
pub use plugin::{Marketplace, PluginManager};
pub use project::{ActivityRepository, CustomerRepository, ProjectRepository, ProjectService};
pub use quick_entry::QuickEntryService;
pub use reporting::ReportingService;
pub use repositories::Repositories;
pub use statistics::StatisticService;
pub use timesheet::{TagRepository, TimesheetRepository, TimesheetService};
pub use user::{UserChecker, UserRepository, UserService};
