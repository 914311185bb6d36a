//! Port interface for the plugin marketplace

use async_trait::async_trait;
use kimai_domain::{MarketplacePlugin, Result};

/// Remote catalogue of available plugins
#[async_trait]
pub trait Marketplace: Send + Sync {
    async fn fetch_plugins(&self) -> Result<Vec<MarketplacePlugin>>;
}
