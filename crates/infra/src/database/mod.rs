//! Database implementations

pub mod activity_repository;
pub mod customer_repository;
pub mod invoice_repository;
pub mod invoice_template_repository;
pub mod manager;
pub mod project_repository;
pub(crate) mod rows;
pub mod tag_repository;
pub mod timesheet_repository;
pub mod user_repository;

use std::sync::Arc;

pub use activity_repository::SqliteActivityRepository;
pub use customer_repository::SqliteCustomerRepository;
pub use invoice_repository::SqliteInvoiceRepository;
pub use invoice_template_repository::SqliteInvoiceTemplateRepository;
use kimai_core::Repositories;
pub use manager::DbManager;
pub use project_repository::SqliteProjectRepository;
pub use tag_repository::SqliteTagRepository;
pub use timesheet_repository::SqliteTimesheetRepository;
pub use user_repository::SqliteUserRepository;

/// Wire every repository port to the same database manager.
pub fn sqlite_repositories(db: Arc<DbManager>) -> Repositories {
    Repositories {
        users: Arc::new(SqliteUserRepository::new(Arc::clone(&db))),
        customers: Arc::new(SqliteCustomerRepository::new(Arc::clone(&db))),
        projects: Arc::new(SqliteProjectRepository::new(Arc::clone(&db))),
        activities: Arc::new(SqliteActivityRepository::new(Arc::clone(&db))),
        timesheets: Arc::new(SqliteTimesheetRepository::new(Arc::clone(&db))),
        tags: Arc::new(SqliteTagRepository::new(Arc::clone(&db))),
        invoices: Arc::new(SqliteInvoiceRepository::new(Arc::clone(&db))),
        invoice_templates: Arc::new(SqliteInvoiceTemplateRepository::new(db)),
    }
}
