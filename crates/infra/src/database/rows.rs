//! Shared helpers for row mapping and error conversion.

use chrono::{DateTime, Utc};
use kimai_common::storage::StorageError;
use kimai_domain::KimaiError;
use rusqlite::types::Value;
use rusqlite::ToSql;
use tokio::task::JoinError;

use crate::errors::InfraError;

pub(crate) fn map_storage_error(err: StorageError) -> KimaiError {
    KimaiError::from(InfraError::from(err))
}

pub(crate) fn map_sql_error(err: rusqlite::Error) -> KimaiError {
    KimaiError::from(InfraError::from(err))
}

pub(crate) fn map_join_error(err: JoinError) -> KimaiError {
    KimaiError::from(InfraError::from(err))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

pub(crate) fn int_to_bool(value: i64) -> bool {
    value != 0
}

pub(crate) fn to_timestamp(value: DateTime<Utc>) -> i64 {
    value.timestamp()
}

/// Converts a stored unix timestamp; `idx` names the column in errors.
pub(crate) fn from_timestamp(idx: usize, secs: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, secs))
}

pub(crate) fn from_optional_timestamp(
    idx: usize,
    secs: Option<i64>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    secs.map(|s| from_timestamp(idx, s)).transpose()
}

/// Parses a lowercase enum column via `FromStr`.
pub(crate) fn parse_column<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse::<T>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, err)),
        )
    })
}

/// `?, ?, ?` for an `IN (...)` list of `count` values.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Owned parameters for dynamically built statements.
#[derive(Default)]
pub(crate) struct SqlParams {
    values: Vec<Value>,
}

impl SqlParams {
    pub(crate) fn push(&mut self, value: impl Into<Value>) {
        self.values.push(value.into());
    }

    pub(crate) fn extend_ids(&mut self, ids: &[i64]) {
        self.values.extend(ids.iter().map(|id| Value::Integer(*id)));
    }

    pub(crate) fn as_refs(&self) -> Vec<&dyn ToSql> {
        self.values.iter().map(|v| v as &dyn ToSql).collect()
    }
}
