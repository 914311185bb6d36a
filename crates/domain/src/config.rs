//! Application configuration structures
//!
//! Every section has defaults so that partial TOML/JSON files are accepted.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ACTIVE_ENTRIES_LIMIT, DEFAULT_BEGIN_TIME, MARKETPLACE_URL, MAX_INVOICE_DOCUMENTS,
    DEEPL_FREE_URL,
};
use crate::impl_domain_status_conversions;
use crate::types::PluginInfo;
use crate::utils::duration::DurationFormat;
use crate::utils::rounding::RoundingConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub timesheet: TimesheetConfig,
    pub quick_entry: QuickEntryConfig,
    pub invoice: InvoiceConfig,
    pub locale: LocaleConfig,
    pub paths: PathsConfig,
    pub plugins: Vec<PluginInfo>,
    pub marketplace: MarketplaceConfig,
    pub deepl: DeeplConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "var/data/kimai.sqlite".to_string(), pool_size: 8 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1:8001".to_string() }
    }
}

/// How new timesheets get their begin and end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// Begin and end may be supplied by the client
    #[default]
    Default,
    /// Begin is always "now", end is set by stopping
    Punch,
}

impl_domain_status_conversions!(TrackingMode {
    Default => "default",
    Punch => "punch",
});

impl TrackingMode {
    /// Whether clients may send their own begin/end values.
    pub fn allows_api_times(&self) -> bool {
        matches!(self, Self::Default)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimesheetRules {
    pub allow_zero_duration: bool,
    pub allow_future_times: bool,
}

impl Default for TimesheetRules {
    fn default() -> Self {
        Self { allow_zero_duration: false, allow_future_times: true }
    }
}

/// Definition of a custom meta field on timesheets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFieldDefinition {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimesheetConfig {
    pub mode: TrackingMode,
    /// Wall-clock time used for prefilled entries, `HH:MM`
    pub default_begin: String,
    pub active_entries_hard_limit: u32,
    pub rules: TimesheetRules,
    pub rounding: RoundingConfig,
    pub meta_fields: Vec<MetaFieldDefinition>,
    /// Notation for duration input; auto-detected when unset
    pub duration_format: Option<DurationFormat>,
}

impl Default for TimesheetConfig {
    fn default() -> Self {
        Self {
            mode: TrackingMode::Default,
            default_begin: DEFAULT_BEGIN_TIME.to_string(),
            active_entries_hard_limit: DEFAULT_ACTIVE_ENTRIES_LIMIT,
            rules: TimesheetRules::default(),
            rounding: RoundingConfig::default(),
            meta_fields: Vec::new(),
            duration_format: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickEntryConfig {
    pub recent_activities: u32,
    pub recent_activity_weeks: Option<u32>,
    pub minimum_rows: u32,
}

impl Default for QuickEntryConfig {
    fn default() -> Self {
        Self { recent_activities: 5, recent_activity_weeks: None, minimum_rows: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceConfig {
    /// Directory holding uploaded and built-in invoice documents
    pub documents_dir: PathBuf,
    /// Directory for rendered invoices
    pub archive_dir: PathBuf,
    pub max_documents: usize,
    /// chrono format for generated invoice numbers
    pub number_format: String,
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("var/invoices/documents"),
            archive_dir: PathBuf::from("var/invoices/archive"),
            max_documents: MAX_INVOICE_DOCUMENTS,
            number_format: "%y%m%d".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    pub language: String,
    pub currency: String,
    /// Pattern with `%h`, `%m`, `%s` tokens
    pub duration_pattern: String,
    pub timezone: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            currency: "EUR".to_string(),
            duration_pattern: "%h:%m h".to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub translations: PathBuf,
    pub plugins: PathBuf,
    pub cache: PathBuf,
    /// Config file linted by the reload command
    pub config_file: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            translations: PathBuf::from("translations"),
            plugins: PathBuf::from("var/plugins"),
            cache: PathBuf::from("var/cache"),
            config_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    pub url: String,
    pub cache_ttl_secs: u64,
    pub timeout_secs: u64,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self { url: MARKETPLACE_URL.to_string(), cache_ttl_secs: 86_400, timeout_secs: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeeplConfig {
    pub url: String,
}

impl Default for DeeplConfig {
    fn default() -> Self {
        Self { url: DEEPL_FREE_URL.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"timesheet": {"mode": "punch"}}"#).unwrap();
        assert_eq!(config.timesheet.mode, TrackingMode::Punch);
        assert_eq!(config.timesheet.default_begin, "08:00");
        assert_eq!(config.timesheet.active_entries_hard_limit, 1);
        assert_eq!(config.database.pool_size, 8);
        assert_eq!(config.invoice.max_documents, 99);
    }

    #[test]
    fn tracking_mode_api_times() {
        assert!(TrackingMode::Default.allows_api_times());
        assert!(!TrackingMode::Punch.allows_api_times());
        assert_eq!("Punch".parse::<TrackingMode>().unwrap(), TrackingMode::Punch);
    }
}
