//! Plugin registry

pub mod manager;
pub mod ports;

pub use manager::PluginManager;
pub use ports::Marketplace;
