//! Query models for list endpoints and repositories

pub mod project;
pub mod timesheet;
pub mod visibility;

pub use project::{InvoiceArchiveQuery, ProjectQuery, ProjectQueryParams};
pub use timesheet::{
    BillableFilter, ExportFilter, SortOrder, TimesheetOrderBy, TimesheetQuery,
    TimesheetQueryParams, TimesheetState, UserFilter,
};
pub use visibility::{Visibility, VisibilityQuery};
