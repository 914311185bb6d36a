//! Application context - dependency injection container

use std::sync::Arc;

use kimai_core::{
    Clock, InvoiceService, PluginManager, ProjectService, QuickEntryService, Repositories,
    ReportingService, StatisticService, SystemClock, TimesheetService, UserService,
};
use kimai_domain::{Config, Result};
use kimai_infra::config;
use kimai_infra::maintenance::{Reloader, TimezoneConverter};
use kimai_infra::translations::TranslationTool;
use kimai_infra::{
    default_renderers, sqlite_repositories, DbManager, FilesystemDocumentStore, HttpMarketplace,
};
use tracing::info;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub repos: Repositories,
    pub clock: Arc<dyn Clock>,

    pub users: Arc<UserService>,
    pub timesheets: Arc<TimesheetService>,
    pub statistics: Arc<StatisticService>,
    pub invoices: Arc<InvoiceService>,
    pub quick_entry: Arc<QuickEntryService>,
    pub projects: Arc<ProjectService>,
    pub reporting: Arc<ReportingService>,
    pub plugins: Arc<PluginManager>,
}

impl AppContext {
    /// Load configuration (environment first, then the config file) and wire
    /// everything up.
    pub fn new() -> Result<Self> {
        let config = config::load()?;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build the context with an explicit clock; the schema is created when
    /// missing.
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let db = Arc::new(DbManager::from_config(&config.database)?);
        db.run_migrations()?;
        let repos = sqlite_repositories(Arc::clone(&db));

        let users = Arc::new(UserService::new(Arc::clone(&repos.users)));
        let timesheets = Arc::new(TimesheetService::new(
            repos.clone(),
            config.timesheet.clone(),
            Arc::clone(&clock),
        ));
        let statistics = Arc::new(StatisticService::new(
            Arc::clone(&repos.timesheets),
            Arc::clone(&repos.projects),
            Arc::clone(&repos.activities),
        ));
        let invoices = Arc::new(InvoiceService::new(
            repos.clone(),
            Arc::new(FilesystemDocumentStore::from_config(&config.invoice)),
            default_renderers(&config.locale),
            config.invoice.clone(),
            Arc::clone(&clock),
        ));
        let quick_entry = Arc::new(QuickEntryService::new(
            repos.clone(),
            Arc::clone(&timesheets),
            config.quick_entry.clone(),
            Arc::clone(&clock),
        ));
        let projects = Arc::new(ProjectService::new(
            Arc::clone(&repos.customers),
            Arc::clone(&repos.projects),
            Arc::clone(&repos.activities),
            Arc::clone(&repos.timesheets),
        ));
        let reporting = Arc::new(ReportingService::new(repos.clone(), Arc::clone(&clock)));
        let marketplace = Arc::new(HttpMarketplace::new(&config.marketplace)?);
        let plugins = Arc::new(PluginManager::new(config.plugins.clone(), marketplace));

        info!(
            database = %db.path().display(),
            plugins = config.plugins.len(),
            "application context ready"
        );

        Ok(Self {
            config,
            db,
            repos,
            clock,
            users,
            timesheets,
            statistics,
            invoices,
            quick_entry,
            projects,
            reporting,
            plugins,
        })
    }

    pub fn translation_tool(&self) -> TranslationTool {
        TranslationTool::new(&self.config.paths.translations, &self.config.paths.plugins)
    }

    pub fn reloader(&self) -> Reloader {
        Reloader::new(
            self.config.paths.config_file.clone(),
            self.translation_tool(),
            &self.config.paths.cache,
        )
    }

    pub fn timezone_converter(&self) -> TimezoneConverter {
        TimezoneConverter::new(Arc::clone(&self.db))
    }
}
