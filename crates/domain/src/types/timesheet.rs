//! Timesheet records and the inputs that create or change them

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_with::formats::CommaSeparator;
use serde_with::{serde_as, StringWithSeparator};

/// A tracked period of work
///
/// `end == None` means the record is running. `id` is `None` until the
/// record has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timesheet {
    pub id: Option<i64>,
    pub user_id: i64,
    pub project_id: i64,
    pub activity_id: i64,
    pub begin: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    /// Timezone of the user when the record was created
    pub timezone: String,
    /// Seconds, set once the record is stopped
    pub duration: Option<i64>,
    pub description: Option<String>,
    pub rate: f64,
    pub internal_rate: Option<f64>,
    pub hourly_rate: Option<f64>,
    pub fixed_rate: Option<f64>,
    pub billable: bool,
    pub exported: bool,
    pub tags: Vec<String>,
    pub meta: BTreeMap<String, String>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Timesheet {
    pub fn new(
        user_id: i64,
        project_id: i64,
        activity_id: i64,
        begin: DateTime<Utc>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            user_id,
            project_id,
            activity_id,
            begin,
            end: None,
            timezone: timezone.into(),
            duration: None,
            description: None,
            rate: 0.0,
            internal_rate: None,
            hourly_rate: None,
            fixed_rate: None,
            billable: true,
            exported: false,
            tags: Vec::new(),
            meta: BTreeMap::new(),
            created_at: None,
            modified_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.end.is_none()
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Calendar date of `begin` in the record's own timezone.
    pub fn local_date(&self) -> NaiveDate {
        let tz: Tz = self.timezone.parse().unwrap_or(Tz::UTC);
        self.begin.with_timezone(&tz).date_naive()
    }

    /// Seconds between begin and end, or between begin and `now` while running.
    pub fn calculated_duration(&self, now: DateTime<Utc>) -> i64 {
        let end = self.end.unwrap_or(now);
        (end - self.begin).num_seconds().max(0)
    }

    /// Set the end and the matching duration.
    pub fn stop_at(&mut self, end: DateTime<Utc>) {
        self.end = Some(end);
        self.duration = Some((end - self.begin).num_seconds().max(0));
    }

    /// Copy of this record that has not been persisted or exported.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = None;
        copy.exported = false;
        copy.created_at = None;
        copy.modified_at = None;
        copy
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// API payload for a new timesheet
///
/// Dates use `YYYY-MM-DDTHH:MM:SS` in the user's timezone. Tags are a
/// comma separated list.
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimesheetInput {
    pub user: Option<i64>,
    pub project: i64,
    pub activity: i64,
    pub begin: Option<String>,
    pub end: Option<String>,
    pub description: Option<String>,
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, String>>")]
    pub tags: Option<Vec<String>>,
    pub fixed_rate: Option<f64>,
    pub hourly_rate: Option<f64>,
    pub billable: Option<bool>,
    pub exported: Option<bool>,
}

/// API payload for a partial update
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimesheetPatch {
    pub user: Option<i64>,
    pub project: Option<i64>,
    pub activity: Option<i64>,
    pub begin: Option<String>,
    pub end: Option<String>,
    pub description: Option<String>,
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, String>>")]
    pub tags: Option<Vec<String>>,
    pub fixed_rate: Option<f64>,
    pub hourly_rate: Option<f64>,
    pub billable: Option<bool>,
    pub exported: Option<bool>,
}

/// What to take over when restarting a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestartCopy {
    /// Only project and activity
    #[default]
    None,
    /// Rates, description, billable flag, tags and meta fields as well
    All,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartRequest {
    pub begin: Option<String>,
    pub copy: RestartCopy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFieldInput {
    pub name: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn running_until_stopped() {
        let begin = Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap();
        let mut ts = Timesheet::new(1, 2, 3, begin, "Europe/Berlin");
        assert!(ts.is_running());
        assert!(ts.is_new());
        assert_eq!(ts.calculated_duration(begin + chrono::Duration::minutes(30)), 1800);

        ts.stop_at(begin + chrono::Duration::hours(2));
        assert!(!ts.is_running());
        assert_eq!(ts.duration, Some(7200));
    }

    #[test]
    fn duplicate_resets_identity_and_export() {
        let begin = Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap();
        let mut ts = Timesheet::new(1, 2, 3, begin, "UTC");
        ts.id = Some(9);
        ts.exported = true;
        let copy = ts.duplicate();
        assert_eq!(copy.id, None);
        assert!(!copy.exported);
        assert_eq!(copy.project_id, 2);
    }

    #[test]
    fn tags_are_comma_separated() {
        let input: TimesheetInput =
            serde_json::from_str(r#"{"project": 1, "activity": 2, "tags": "foo,bar"}"#).unwrap();
        assert_eq!(input.tags, Some(vec!["foo".to_string(), "bar".to_string()]));
        assert_eq!(input.billable, None);
    }
}
