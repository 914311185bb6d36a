//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `KIMAI_DB_PATH` is missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Without any config file the built-in defaults are used
//!
//! ## Environment Variables
//! - `KIMAI_DB_PATH`: Database file path (required for env loading)
//! - `KIMAI_DB_POOL_SIZE`: Connection pool size
//! - `KIMAI_BIND`: Listen address of the HTTP server
//! - `KIMAI_TIMESHEET_MODE`: `default` or `punch`
//! - `KIMAI_ALLOW_ZERO_DURATION`: Whether zero-duration records are allowed
//!
//! ## File Locations
//! The loader probes `kimai.toml`, `kimai.json`, `config.toml` and
//! `config.json` in the working directory, its two parents and next to the
//! executable.

use std::path::{Path, PathBuf};

use kimai_domain::{Config, KimaiError, Result, TrackingMode};

const CONFIG_FILE_NAMES: [&str; 4] = ["kimai.toml", "kimai.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `KimaiError::Config` when an environment value or the config file
/// is invalid.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            match probe_config_paths() {
                Some(path) => load_from_file(Some(path)),
                None => {
                    tracing::info!("No config file found, using defaults");
                    Ok(Config::default())
                }
            }
        }
    }
}

/// Load configuration from environment variables
///
/// `KIMAI_DB_PATH` is required, every other variable is optional and falls
/// back to the default.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    config.database.path = env_var("KIMAI_DB_PATH")?;

    if let Ok(pool_size) = std::env::var("KIMAI_DB_POOL_SIZE") {
        config.database.pool_size = pool_size
            .parse::<u32>()
            .map_err(|e| KimaiError::Config(format!("Invalid pool size: {e}")))?;
    }
    if let Ok(bind) = std::env::var("KIMAI_BIND") {
        config.server.bind = bind;
    }
    if let Ok(mode) = std::env::var("KIMAI_TIMESHEET_MODE") {
        config.timesheet.mode = mode.parse::<TrackingMode>().map_err(KimaiError::Config)?;
    }
    config.timesheet.rules.allow_zero_duration =
        env_bool("KIMAI_ALLOW_ZERO_DURATION", config.timesheet.rules.allow_zero_duration);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. The format is
/// detected by file extension.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(KimaiError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            KimaiError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| KimaiError::Config(format!("Failed to read config file: {e}")))?;

    let mut config = parse_config(&contents, &config_path)?;
    config.paths.config_file = Some(config_path);
    Ok(config)
}

/// Parse configuration content, format chosen by the extension of `path`.
pub fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| KimaiError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| KimaiError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(KimaiError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a config file
///
/// Returns the first existing candidate.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
        dirs.push(cwd.join("../.."));
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| KimaiError::Config(format!("Missing required environment variable: {key}")))
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
