//! Translation tooling error types

use std::path::PathBuf;

use kimai_domain::KimaiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("Could not find translation file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Missing english translation for key: {key} in file {}", .file.display())]
    MissingEnglish { key: String, file: PathBuf },

    #[error("Missing \"resname\" attribute in file: {}", .0.display())]
    MissingResname(PathBuf),

    #[error("Missing \"DeepL API Free\" auth-key")]
    MissingAuthKey,

    #[error("Missing translation locale")]
    MissingLocale,

    #[error("Locale not supported by DeepL: {0}")]
    UnsupportedLocale(String),

    #[error("Invalid XLIFF in {}: {message}", .file.display())]
    Xml { file: PathBuf, message: String },

    #[error("Translation request failed: {0}")]
    Request(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type TranslationResult<T> = Result<T, TranslationError>;

impl From<TranslationError> for KimaiError {
    fn from(value: TranslationError) -> Self {
        match value {
            TranslationError::Io(err) => KimaiError::Io(err.to_string()),
            TranslationError::Request(message) => KimaiError::Network(message),
            TranslationError::MissingFile(_) => KimaiError::NotFound(value.to_string()),
            other => KimaiError::InvalidInput(other.to_string()),
        }
    }
}
