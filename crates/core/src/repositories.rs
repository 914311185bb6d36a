//! Bundle of repository ports handed to services

use std::sync::Arc;

use crate::invoice::ports::{InvoiceRepository, InvoiceTemplateRepository};
use crate::project::ports::{ActivityRepository, CustomerRepository, ProjectRepository};
use crate::timesheet::ports::{TagRepository, TimesheetRepository};
use crate::user::ports::UserRepository;

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub activities: Arc<dyn ActivityRepository>,
    pub timesheets: Arc<dyn TimesheetRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub invoices: Arc<dyn InvoiceRepository>,
    pub invoice_templates: Arc<dyn InvoiceTemplateRepository>,
}
