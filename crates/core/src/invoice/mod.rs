//! Invoice creation and management

pub mod number;
pub mod ports;
pub mod service;

pub use number::DateNumberGenerator;
pub use ports::{InvoiceDocumentStore, InvoiceRenderer, RenderedInvoice};
pub use service::InvoiceService;
