//! Invoice documents, value maps and renderers

mod document_store;
mod renderer;
mod values;

use std::sync::Arc;

pub use document_store::FilesystemDocumentStore;
use kimai_core::InvoiceRenderer;
use kimai_domain::LocaleConfig;
pub use renderer::{JsonRenderer, TextRenderer};
pub use values::{ValueFormatter, Values};

/// Every renderer shipped with the application.
pub fn default_renderers(locale: &LocaleConfig) -> Vec<Arc<dyn InvoiceRenderer>> {
    vec![Arc::new(JsonRenderer::new(locale)), Arc::new(TextRenderer::new(locale))]
}
