//! Invoice documents on the filesystem
//!
//! Built-in documents are compiled into the binary. Uploaded documents live
//! in `invoice.documents_dir`, rendered invoices in `invoice.archive_dir`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use kimai_core::InvoiceDocumentStore;
use kimai_domain::{InvoiceConfig, InvoiceDocument, KimaiError, Result};
use tokio::fs;
use tracing::{debug, info};

use crate::errors::InfraError;

const BUILT_IN_DOCUMENTS: [(&str, &str); 3] = [
    ("default.txt", include_str!("../../templates/invoice/default.txt")),
    ("timesheet.md", include_str!("../../templates/invoice/timesheet.md")),
    ("export.json", include_str!("../../templates/invoice/export.json")),
];

pub struct FilesystemDocumentStore {
    documents_dir: PathBuf,
    archive_dir: PathBuf,
}

impl FilesystemDocumentStore {
    pub fn new(documents_dir: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self { documents_dir: documents_dir.into(), archive_dir: archive_dir.into() }
    }

    pub fn from_config(config: &InvoiceConfig) -> Self {
        Self::new(&config.documents_dir, &config.archive_dir)
    }

    fn built_in() -> impl Iterator<Item = InvoiceDocument> {
        BUILT_IN_DOCUMENTS.iter().map(|(name, _)| document(name, true, PathBuf::new()))
    }

    async fn uploaded(&self) -> Result<Vec<InvoiceDocument>> {
        let mut entries = match fs::read_dir(&self.documents_dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(InfraError::from(err).into()),
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(InfraError::from)? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || !name.contains('.') {
                continue;
            }
            if entry.file_type().await.map_err(InfraError::from)?.is_file() {
                documents.push(document(&name, false, entry.path()));
            }
        }
        documents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(documents)
    }
}

fn document(name: &str, built_in: bool, path: PathBuf) -> InvoiceDocument {
    let id = name.rsplit_once('.').map_or(name, |(stem, _)| stem).to_string();
    InvoiceDocument { id, name: name.to_string(), built_in, path }
}

/// Rejects names that would leave the target directory.
fn checked_name(filename: &str) -> Result<&str> {
    let plain = Path::new(filename).file_name().and_then(|n| n.to_str());
    match plain {
        Some(name) if name == filename && !name.starts_with('.') => Ok(name),
        _ => Err(KimaiError::InvalidInput(format!("Invalid file name: {filename}"))),
    }
}

#[async_trait]
impl InvoiceDocumentStore for FilesystemDocumentStore {
    async fn list(&self) -> Result<Vec<InvoiceDocument>> {
        let mut documents: Vec<InvoiceDocument> = Self::built_in().collect();
        for uploaded in self.uploaded().await? {
            if !documents.iter().any(|d| d.id == uploaded.id) {
                documents.push(uploaded);
            }
        }
        Ok(documents)
    }

    async fn find(&self, id: &str) -> Result<Option<InvoiceDocument>> {
        Ok(self.list().await?.into_iter().find(|d| d.id == id))
    }

    async fn read(&self, document: &InvoiceDocument) -> Result<String> {
        if document.built_in {
            return BUILT_IN_DOCUMENTS
                .iter()
                .find(|(name, _)| *name == document.name)
                .map(|(_, content)| (*content).to_string())
                .ok_or_else(|| KimaiError::not_found("Document", &document.id));
        }
        Ok(fs::read_to_string(&document.path).await.map_err(InfraError::from)?)
    }

    async fn save(&self, filename: &str, content: &[u8]) -> Result<InvoiceDocument> {
        let name = checked_name(filename)?;
        fs::create_dir_all(&self.documents_dir).await.map_err(InfraError::from)?;
        let path = self.documents_dir.join(name);
        fs::write(&path, content).await.map_err(InfraError::from)?;
        info!(path = %path.display(), "invoice document stored");
        Ok(document(name, false, path))
    }

    async fn delete(&self, document: &InvoiceDocument) -> Result<()> {
        if document.built_in {
            return Err(KimaiError::InvalidInput(
                "Document is built-in and cannot be deleted".into(),
            ));
        }
        fs::remove_file(&document.path).await.map_err(InfraError::from)?;
        Ok(())
    }

    async fn archive(&self, filename: &str, content: &[u8]) -> Result<PathBuf> {
        let name = checked_name(filename)?;
        fs::create_dir_all(&self.archive_dir).await.map_err(InfraError::from)?;
        let path = self.archive_dir.join(name);
        fs::write(&path, content).await.map_err(InfraError::from)?;
        debug!(path = %path.display(), bytes = content.len(), "invoice archived");
        Ok(path)
    }

    async fn remove_archived(&self, filename: &str) -> Result<()> {
        let path = self.archive_dir.join(checked_name(filename)?);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "archived invoice already gone");
                Ok(())
            }
            Err(err) => Err(InfraError::from(err).into()),
        }
    }
}
