//! Conversions from external infrastructure errors into domain errors.

use kimai_common::storage::StorageError;
use kimai_domain::KimaiError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub KimaiError);

impl From<InfraError> for KimaiError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<KimaiError> for InfraError {
    fn from(value: KimaiError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoKimaiError {
    fn into_kimai(self) -> KimaiError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → KimaiError */
/* -------------------------------------------------------------------------- */

impl IntoKimaiError for SqlError {
    fn into_kimai(self) -> KimaiError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => KimaiError::Database("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        KimaiError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        KimaiError::Conflict("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        KimaiError::Database("foreign key constraint violation".into())
                    }
                    _ => KimaiError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => KimaiError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                KimaiError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                KimaiError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => KimaiError::Database("invalid UTF-8 returned from sqlite".into()),
            RE::InvalidPath(path) => {
                KimaiError::Database(format!("invalid database path: {}", path.to_string_lossy()))
            }
            RE::InvalidQuery => KimaiError::Database("invalid SQL query".into()),
            other => KimaiError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_kimai())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError → KimaiError */
/* -------------------------------------------------------------------------- */

impl IntoKimaiError for StorageError {
    fn into_kimai(self) -> KimaiError {
        match self {
            StorageError::Rusqlite(err) => err.into_kimai(),
            StorageError::Io(err) => KimaiError::Io(err.to_string()),
            StorageError::InvalidConfig(message) => KimaiError::Config(message),
            StorageError::Timeout(secs) => {
                KimaiError::Database(format!("connection timeout after {secs}s"))
            }
            other => KimaiError::Database(other.to_string()),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        InfraError(value.into_kimai())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → KimaiError */
/* -------------------------------------------------------------------------- */

impl IntoKimaiError for HttpError {
    fn into_kimai(self) -> KimaiError {
        if self.is_timeout() {
            return KimaiError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return KimaiError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => KimaiError::Auth(message),
                404 => KimaiError::NotFound(message),
                400..=499 => KimaiError::InvalidInput(message),
                _ => KimaiError::Network(message),
            };
        }

        if self.is_decode() {
            return KimaiError::Network(format!("invalid HTTP response body: {self}"));
        }

        KimaiError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_kimai())
    }
}

/* -------------------------------------------------------------------------- */
/* tokio::task::JoinError → KimaiError */
/* -------------------------------------------------------------------------- */

impl From<tokio::task::JoinError> for InfraError {
    fn from(value: tokio::task::JoinError) -> Self {
        InfraError(KimaiError::Internal(format!("blocking task failed: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → KimaiError */
/* -------------------------------------------------------------------------- */

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        let error = match value.kind() {
            std::io::ErrorKind::NotFound => KimaiError::NotFound(value.to_string()),
            _ => KimaiError::Io(value.to_string()),
        };
        InfraError(error)
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
