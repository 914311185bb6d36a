//! Installed plugins and marketplace entries

use serde::{Deserialize, Serialize};

use crate::constants::PLUGIN_STORE_URL;

/// A plugin declared in the configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_homepage")]
    pub homepage: String,
}

impl PluginInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), version: None, description: None, homepage: default_homepage() }
    }
}

fn default_homepage() -> String {
    PLUGIN_STORE_URL.to_string()
}

/// A plugin advertised by the marketplace catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplacePlugin {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Installed plugins next to the marketplace catalogue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginOverview {
    pub installed: Vec<PluginInfo>,
    /// Catalogue entries that are not installed
    pub available: Vec<MarketplacePlugin>,
}
