//! Installed plugins and the marketplace catalogue

use std::sync::{Arc, RwLock};

use kimai_domain::{
    KimaiError, MarketplacePlugin, Permission, PluginInfo, PluginOverview, Result, User,
};
use tracing::{info, warn};

use super::ports::Marketplace;
use crate::access::require;

pub struct PluginManager {
    plugins: RwLock<Vec<PluginInfo>>,
    marketplace: Arc<dyn Marketplace>,
}

impl PluginManager {
    pub fn new(plugins: Vec<PluginInfo>, marketplace: Arc<dyn Marketplace>) -> Self {
        let manager = Self { plugins: RwLock::new(Vec::new()), marketplace };
        for plugin in plugins {
            // cannot fail on a fresh lock
            let _ = manager.add_plugin(plugin);
        }
        manager
    }

    /// Register a plugin; a second plugin with the same name is ignored.
    pub fn add_plugin(&self, plugin: PluginInfo) -> Result<bool> {
        let mut plugins = self.plugins.write().map_err(|_| lock_error())?;
        if plugins.iter().any(|p| p.name == plugin.name) {
            return Ok(false);
        }
        plugins.push(plugin);
        Ok(true)
    }

    pub fn get_plugins(&self) -> Result<Vec<PluginInfo>> {
        Ok(self.plugins.read().map_err(|_| lock_error())?.clone())
    }

    pub fn get_plugin(&self, name: &str) -> Result<Option<PluginInfo>> {
        let plugins = self.plugins.read().map_err(|_| lock_error())?;
        Ok(plugins.iter().find(|p| p.name == name).cloned())
    }

    /// Installed plugins plus the catalogue entries not installed yet.
    /// An unreachable marketplace yields an empty catalogue.
    pub async fn list_with_marketplace(&self, actor: &User) -> Result<PluginOverview> {
        require(actor, Permission::Plugins)?;
        let installed = self.get_plugins()?;

        let catalogue: Vec<MarketplacePlugin> = match self.marketplace.fetch_plugins().await {
            Ok(plugins) => plugins,
            Err(err) => {
                warn!(error = %err, "plugin marketplace unavailable");
                Vec::new()
            }
        };
        let available = catalogue
            .into_iter()
            .filter(|m| !installed.iter().any(|p| p.name == m.name))
            .collect();

        info!(installed = installed.len(), "plugin overview loaded");
        Ok(PluginOverview { installed, available })
    }
}

fn lock_error() -> KimaiError {
    KimaiError::Internal("plugin registry lock poisoned".into())
}
