//! Validates configuration and translations, then rebuilds the cache.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::parse_config;
use crate::translations::TranslationTool;

pub const ERROR_CACHE_CLEAN: i32 = 2;
pub const ERROR_CACHE_WARMUP: i32 = 4;
pub const ERROR_LINT_CONFIG: i32 = 8;
pub const ERROR_LINT_TRANSLATIONS: i32 = 16;

const CACHE_VERSION_FILE: &str = "version";

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("Config file seems to be invalid: {0}")]
    LintConfig(String),

    #[error("Translation files seem to be invalid:\n{}", .0.join("\n"))]
    LintTranslations(Vec<String>),

    #[error("Could not clear cache, missing permissions? {0}")]
    CacheClean(std::io::Error),

    #[error("Could not warmup cache, missing permissions? {0}")]
    CacheWarmup(std::io::Error),
}

impl ReloadError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::LintConfig(_) => ERROR_LINT_CONFIG,
            Self::LintTranslations(_) => ERROR_LINT_TRANSLATIONS,
            Self::CacheClean(_) => ERROR_CACHE_CLEAN,
            Self::CacheWarmup(_) => ERROR_CACHE_WARMUP,
        }
    }
}

/// Result of a reload that passed both lint steps
#[derive(Debug)]
pub enum ReloadOutcome {
    Reloaded,
    /// The cache step failed; the reload still counts as successful.
    CacheNotRebuilt(ReloadError),
}

impl ReloadOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Reloaded => "Kimai config was reloaded",
            Self::CacheNotRebuilt(_) => "Cache could not be rebuilt.",
        }
    }
}

pub struct Reloader {
    config_file: Option<PathBuf>,
    translations: TranslationTool,
    cache_dir: PathBuf,
}

impl Reloader {
    pub fn new(
        config_file: Option<PathBuf>,
        translations: TranslationTool,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self { config_file, translations, cache_dir: cache_dir.into() }
    }

    /// Lint errors are returned as `Err`; cache failures only downgrade the
    /// outcome.
    pub fn run(&self) -> Result<ReloadOutcome, ReloadError> {
        self.lint_config()?;
        self.lint_translations()?;

        match self.rebuild_cache() {
            Ok(()) => {
                info!(cache = %self.cache_dir.display(), "kimai config reloaded");
                Ok(ReloadOutcome::Reloaded)
            }
            Err(err) => {
                warn!(error = %err, "cache could not be rebuilt");
                Ok(ReloadOutcome::CacheNotRebuilt(err))
            }
        }
    }

    fn lint_config(&self) -> Result<(), ReloadError> {
        let Some(path) = &self.config_file else {
            return Ok(());
        };
        let contents =
            std::fs::read_to_string(path).map_err(|e| ReloadError::LintConfig(e.to_string()))?;
        parse_config(&contents, path)
            .map(|_| ())
            .map_err(|e| ReloadError::LintConfig(e.message().to_string()))
    }

    fn lint_translations(&self) -> Result<(), ReloadError> {
        let problems =
            self.translations.lint().map_err(|e| ReloadError::LintTranslations(vec![e.to_string()]))?;
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ReloadError::LintTranslations(problems))
        }
    }

    fn rebuild_cache(&self) -> Result<(), ReloadError> {
        match std::fs::remove_dir_all(&self.cache_dir) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(ReloadError::CacheClean(err)),
        }

        std::fs::create_dir_all(&self.cache_dir).map_err(ReloadError::CacheWarmup)?;
        std::fs::write(self.cache_dir.join(CACHE_VERSION_FILE), env!("CARGO_PKG_VERSION"))
            .map_err(ReloadError::CacheWarmup)?;
        Ok(())
    }
}
