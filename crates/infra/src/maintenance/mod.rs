//! Maintenance commands: timezone conversion and reload

mod reload;
mod timezone;

pub use reload::{
    ReloadError, ReloadOutcome, Reloader, ERROR_CACHE_CLEAN, ERROR_CACHE_WARMUP,
    ERROR_LINT_CONFIG, ERROR_LINT_TRANSLATIONS,
};
pub use timezone::TimezoneConverter;
