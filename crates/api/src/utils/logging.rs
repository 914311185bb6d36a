use std::time::Duration;

use kimai_domain::KimaiError;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "kimai=info,kimai_lib=info,kimai_core=info,kimai_infra=info,tower_http=info";

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
///
/// Calling this twice is harmless; the second call keeps the first subscriber.
pub fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json().with_current_span(false)).try_init(),
    };
    if result.is_err() {
        warn!("tracing subscriber already installed");
    }
}

/// Log the outcome of a command execution with structured fields.
///
/// # Parameters
/// * `command` - Logical command identifier (e.g. `"timesheets::create"`).
/// * `implementation` - Surface that ran the command (`"http"` or `"cli"`).
/// * `elapsed` - Duration the command execution took.
/// * `success` - Whether the command completed successfully.
///
/// Callers must avoid forwarding sensitive values in `command`.
#[inline]
pub fn log_command_execution(command: &str, implementation: &str, elapsed: Duration, success: bool) {
    let duration_ms = elapsed.as_millis() as u64;

    if success {
        info!(command, implementation, duration_ms, "command_execution_success");
    } else {
        warn!(command, implementation, duration_ms, "command_execution_failure");
    }
}

/// Convert a `KimaiError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &KimaiError) -> &'static str {
    match error {
        KimaiError::Database(_) => "database",
        KimaiError::Config(_) => "config",
        KimaiError::Network(_) => "network",
        KimaiError::Auth(_) => "auth",
        KimaiError::AccessDenied(_) => "access_denied",
        KimaiError::NotFound(_) => "not_found",
        KimaiError::InvalidInput(_) => "invalid_input",
        KimaiError::Conflict(_) => "conflict",
        KimaiError::Io(_) => "io",
        KimaiError::Internal(_) => "internal",
    }
}
