//! Timesheet list filters

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_with::formats::CommaSeparator;
use serde_with::{serde_as, StringWithSeparator};

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::errors::{KimaiError, Result};
use crate::impl_domain_status_conversions;
use crate::utils::date::parse_local_datetime;

/// Whose timesheets to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserFilter {
    #[default]
    Current,
    Id(i64),
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimesheetState {
    #[default]
    All,
    Running,
    Stopped,
}

impl_domain_status_conversions!(TimesheetState {
    All => "all",
    Running => "running",
    Stopped => "stopped",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillableFilter {
    #[default]
    All,
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFilter {
    #[default]
    All,
    Exported,
    NotExported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimesheetOrderBy {
    Id,
    #[default]
    Begin,
    End,
    Rate,
}

impl TimesheetOrderBy {
    pub fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Begin => "begin",
            Self::End => "end",
            Self::Rate => "rate",
        }
    }
}

/// Typed timesheet filter used by services and repositories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimesheetQuery {
    pub user: UserFilter,
    pub customers: Vec<i64>,
    pub projects: Vec<i64>,
    pub activities: Vec<i64>,
    pub tags: Vec<String>,
    pub page: u32,
    pub page_size: u32,
    pub order: SortOrder,
    pub order_by: TimesheetOrderBy,
    pub begin: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub state: TimesheetState,
    pub billable: BillableFilter,
    pub exported: ExportFilter,
    pub search: Option<String>,
    pub modified_after: Option<DateTime<Utc>>,
}

impl Default for TimesheetQuery {
    fn default() -> Self {
        Self {
            user: UserFilter::Current,
            customers: Vec::new(),
            projects: Vec::new(),
            activities: Vec::new(),
            tags: Vec::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            order: SortOrder::Desc,
            order_by: TimesheetOrderBy::Begin,
            begin: None,
            end: None,
            state: TimesheetState::All,
            billable: BillableFilter::All,
            exported: ExportFilter::All,
            search: None,
            modified_after: None,
        }
    }
}

impl TimesheetQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Copy of this query without paging, used for totals and exports.
    pub fn unpaged(&self) -> Self {
        let mut copy = self.clone();
        copy.page = 1;
        copy.page_size = u32::MAX;
        copy
    }
}

/// Raw query string of the timesheet collection endpoint
///
/// Id lists are comma separated. `user` is an id or `all`.
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimesheetQueryParams {
    pub user: Option<String>,
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, i64>>")]
    pub customers: Option<Vec<i64>>,
    pub customer: Option<i64>,
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, i64>>")]
    pub projects: Option<Vec<i64>>,
    pub project: Option<i64>,
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, i64>>")]
    pub activities: Option<Vec<i64>>,
    pub activity: Option<i64>,
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, String>>")]
    pub tags: Option<Vec<String>>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub order: Option<SortOrder>,
    #[serde(rename = "orderBy")]
    pub order_by: Option<TimesheetOrderBy>,
    pub begin: Option<String>,
    pub end: Option<String>,
    pub active: Option<u8>,
    pub billable: Option<u8>,
    pub exported: Option<u8>,
    pub term: Option<String>,
    #[serde(rename = "modified_after")]
    pub modified_after: Option<String>,
    pub full: Option<String>,
}

impl TimesheetQueryParams {
    /// Convert to a typed query; dates are read in `tz`.
    ///
    /// # Errors
    /// `InvalidInput` for malformed dates or user values.
    pub fn into_query(self, tz: Tz) -> Result<TimesheetQuery> {
        let mut query = TimesheetQuery::default();

        query.user = match self.user.as_deref().map(str::trim) {
            None | Some("") => UserFilter::Current,
            Some("all") => UserFilter::All,
            Some(id) => UserFilter::Id(id.parse().map_err(|_| {
                KimaiError::InvalidInput(format!("Invalid user: {id}"))
            })?),
        };

        query.customers = merge_ids(self.customers, self.customer);
        query.projects = merge_ids(self.projects, self.project);
        query.activities = merge_ids(self.activities, self.activity);
        query.tags = self
            .tags
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        query.page = self.page.unwrap_or(1).max(1);
        query.page_size = self.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        query.order = self.order.unwrap_or_default();
        query.order_by = self.order_by.unwrap_or_default();

        query.begin = parse_optional(self.begin.as_deref(), tz)?;
        query.end = parse_optional(self.end.as_deref(), tz)?;
        query.modified_after = parse_optional(self.modified_after.as_deref(), tz)?;

        query.state = match self.active {
            Some(1) => TimesheetState::Running,
            Some(2) => TimesheetState::Stopped,
            _ => TimesheetState::All,
        };
        query.billable = match self.billable {
            Some(1) => BillableFilter::Yes,
            Some(0) => BillableFilter::No,
            _ => BillableFilter::All,
        };
        query.exported = match self.exported {
            Some(1) => ExportFilter::Exported,
            Some(0) => ExportFilter::NotExported,
            _ => ExportFilter::All,
        };
        query.search = self.term.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

        Ok(query)
    }

    pub fn is_full(&self) -> bool {
        matches!(self.full.as_deref(), Some("true" | "1"))
    }
}

fn merge_ids(list: Option<Vec<i64>>, single: Option<i64>) -> Vec<i64> {
    let mut ids = list.unwrap_or_default();
    if let Some(id) = single {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

fn parse_optional(value: Option<&str>, tz: Tz) -> Result<Option<DateTime<Utc>>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_local_datetime(value, tz).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let query = TimesheetQueryParams::default().into_query(Tz::UTC).unwrap();
        assert_eq!(query.user, UserFilter::Current);
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 50);
        assert_eq!(query.order, SortOrder::Desc);
        assert_eq!(query.order_by, TimesheetOrderBy::Begin);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn params_are_converted() {
        let params = TimesheetQueryParams {
            user: Some("all".into()),
            projects: Some(vec![1, 2]),
            project: Some(3),
            tags: Some(vec![" foo".into(), String::new()]),
            page: Some(3),
            size: Some(10),
            active: Some(1),
            exported: Some(0),
            begin: Some("2024-03-01T00:00:00".into()),
            ..Default::default()
        };
        let query = params.into_query(Tz::UTC).unwrap();
        assert_eq!(query.user, UserFilter::All);
        assert_eq!(query.projects, vec![1, 2, 3]);
        assert_eq!(query.tags, vec!["foo".to_string()]);
        assert_eq!(query.offset(), 20);
        assert_eq!(query.state, TimesheetState::Running);
        assert_eq!(query.exported, ExportFilter::NotExported);
        assert!(query.begin.is_some());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let params = TimesheetQueryParams { user: Some("me".into()), ..Default::default() };
        assert!(params.into_query(Tz::UTC).is_err());
        let params = TimesheetQueryParams { begin: Some("yesterday".into()), ..Default::default() };
        assert!(params.into_query(Tz::UTC).is_err());
    }

    #[test]
    fn order_parses_uppercase() {
        let order: SortOrder = serde_json::from_str("\"ASC\"").unwrap();
        assert_eq!(order.as_sql(), "ASC");
        assert_eq!(TimesheetOrderBy::Rate.column(), "rate");
    }
}
