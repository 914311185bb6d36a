//! Application constants
//!
//! Centralized location for domain-level constants.

pub const APP_NAME: &str = "Kimai";
pub const HOMEPAGE: &str = "https://www.kimai.org";
pub const PLUGIN_STORE_URL: &str = "https://www.kimai.org/store/";
pub const MARKETPLACE_URL: &str = "https://www.kimai.org/plugins.json";
pub const DEEPL_FREE_URL: &str = "https://api-free.deepl.com/v2/translate";

// API date-time format for query parameters and payloads
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// Paging
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 500;
pub const DEFAULT_RECENT_SIZE: u32 = 10;

// Timesheets
pub const DEFAULT_BEGIN_TIME: &str = "08:00";
pub const DEFAULT_ACTIVE_ENTRIES_LIMIT: u32 = 1;
pub const RATE_PRECISION: i32 = 4;

// Invoices
pub const DEFAULT_DUE_DAYS: u32 = 30;
pub const MAX_DUE_DAYS: u32 = 999;
pub const MAX_INVOICE_DOCUMENTS: usize = 99;
pub const INVOICE_DOCUMENT_NAME_LIMIT: usize = 20;

// Auth headers
pub const HEADER_AUTH_USER: &str = "X-AUTH-USER";
pub const HEADER_AUTH_TOKEN: &str = "X-AUTH-TOKEN";
