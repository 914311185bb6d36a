//! Entities and models

pub mod customer;
pub mod invoice;
pub mod page;
pub mod plugin;
pub mod quick_entry;
pub mod stats;
pub mod timesheet;
pub mod user;

pub use customer::{Activity, BudgetType, Customer, Project, ProjectInput};
pub use invoice::{
    Invoice, InvoiceDocument, InvoiceItem, InvoiceModel, InvoiceQuery, InvoiceStatus,
    InvoiceTemplate, InvoiceTemplateInput,
};
pub use page::Page;
pub use plugin::{MarketplacePlugin, PluginInfo, PluginOverview};
pub use quick_entry::{QuickEntryModel, QuickEntrySaveResult, QuickEntryWeek, MINUTE_INCREMENTS};
pub use stats::{
    ActivityDays, DailyStatistic, Day, Month, MonthlyStatistic, ProjectBudgetStatistic,
    ProjectDateRangeReport, ProjectDateRangeRow, ProjectDays, ProjectStatistic, Totals,
    UserDayGrouping, Year,
};
pub use timesheet::{
    MetaFieldInput, RestartCopy, RestartRequest, Tag, Timesheet, TimesheetInput, TimesheetPatch,
};
pub use user::User;
