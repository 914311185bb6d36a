//! Port interfaces for invoices, templates, documents and renderers

use std::path::PathBuf;

use async_trait::async_trait;
use kimai_domain::query::InvoiceArchiveQuery;
use kimai_domain::{
    Invoice, InvoiceDocument, InvoiceModel, InvoiceTemplate, Page, Result,
};

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn find(&self, id: i64) -> Result<Option<Invoice>>;

    /// Archive, newest first
    async fn list(&self, query: &InvoiceArchiveQuery) -> Result<Page<Invoice>>;

    async fn create(&self, invoice: Invoice) -> Result<Invoice>;

    async fn update(&self, invoice: &Invoice) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn number_exists(&self, number: &str) -> Result<bool>;
}

#[async_trait]
pub trait InvoiceTemplateRepository: Send + Sync {
    async fn find(&self, id: i64) -> Result<Option<InvoiceTemplate>>;

    async fn find_by_name(&self, name: &str) -> Result<Option<InvoiceTemplate>>;

    async fn list(&self) -> Result<Vec<InvoiceTemplate>>;

    async fn create(&self, template: InvoiceTemplate) -> Result<InvoiceTemplate>;

    async fn update(&self, template: &InvoiceTemplate) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Number of templates rendering with the document `renderer`
    async fn count_by_renderer(&self, renderer: &str) -> Result<u64>;
}

/// Invoice documents on disk and the rendered invoice archive
#[async_trait]
pub trait InvoiceDocumentStore: Send + Sync {
    async fn list(&self) -> Result<Vec<InvoiceDocument>>;

    async fn find(&self, id: &str) -> Result<Option<InvoiceDocument>>;

    async fn read(&self, document: &InvoiceDocument) -> Result<String>;

    /// Store an uploaded document under the already sanitised `filename`.
    async fn save(&self, filename: &str, content: &[u8]) -> Result<InvoiceDocument>;

    async fn delete(&self, document: &InvoiceDocument) -> Result<()>;

    /// Write a rendered invoice into the archive.
    async fn archive(&self, filename: &str, content: &[u8]) -> Result<PathBuf>;

    async fn remove_archived(&self, filename: &str) -> Result<()>;
}

/// Output of a renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedInvoice {
    pub content: Vec<u8>,
    pub extension: String,
    pub content_type: String,
}

/// Turns an invoice model into a document
pub trait InvoiceRenderer: Send + Sync {
    fn id(&self) -> &'static str;

    /// File extensions of documents this renderer understands
    fn extensions(&self) -> &'static [&'static str];

    fn supports(&self, document: &InvoiceDocument) -> bool {
        document
            .extension()
            .is_some_and(|ext| self.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// `source` is the document content.
    fn render(
        &self,
        document: &InvoiceDocument,
        source: &str,
        model: &InvoiceModel,
    ) -> Result<RenderedInvoice>;
}
