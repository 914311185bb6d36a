//! Week based quick entry rows

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Activity, Project, Timesheet, User};

/// Allowed minute increments for duration pickers; `None` means free input
pub const MINUTE_INCREMENTS: [Option<u32>; 15] = [
    None,
    Some(1),
    Some(2),
    Some(3),
    Some(4),
    Some(5),
    Some(10),
    Some(15),
    Some(20),
    Some(25),
    Some(30),
    Some(45),
    Some(60),
    Some(90),
    Some(120),
];

/// One row of the quick entry grid: a project/activity pair and its days
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickEntryModel {
    pub user: Option<User>,
    pub project: Option<Project>,
    pub activity: Option<Activity>,
    /// Keyed by the local `YYYY-MM-DD` of the begin
    pub timesheets: BTreeMap<String, Timesheet>,
    /// Duration input per day in the configured notation, e.g. `1:30` or
    /// `2h`. Takes precedence over the cell's numeric duration; an empty
    /// string clears the cell.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub durations: BTreeMap<String, String>,
}

impl QuickEntryModel {
    pub fn new(user: Option<User>, project: Option<Project>, activity: Option<Activity>) -> Self {
        Self { user, project, activity, timesheets: BTreeMap::new(), durations: BTreeMap::new() }
    }

    /// An empty row without user, project and activity
    pub fn is_prototype(&self) -> bool {
        !self.has_existing_timesheet()
            && self.user.is_none()
            && self.project.is_none()
            && self.activity.is_none()
    }

    pub fn has_existing_timesheet(&self) -> bool {
        self.timesheets.values().any(|t| !t.is_new())
    }

    /// Unsaved timesheets that carry a duration
    pub fn new_timesheets(&self) -> Vec<&Timesheet> {
        self.timesheets.values().filter(|t| t.is_new() && t.duration.is_some()).collect()
    }

    pub fn has_new_timesheet(&self) -> bool {
        !self.new_timesheets().is_empty()
    }

    pub fn has_timesheet_with_duration(&self) -> bool {
        self.timesheets.values().any(|t| t.duration.is_some())
    }

    /// Replaces any timesheet on the same day.
    pub fn add_timesheet(&mut self, timesheet: Timesheet) {
        let key = timesheet.local_date().format("%Y-%m-%d").to_string();
        self.timesheets.insert(key, timesheet);
    }

    pub fn has_day(&self, day: &str) -> bool {
        self.timesheets.contains_key(day)
    }

    pub fn latest_entry(&self) -> Option<&Timesheet> {
        self.timesheets.values().max_by_key(|t| t.begin)
    }

    pub fn first_entry(&self) -> Option<&Timesheet> {
        self.timesheets.values().min_by_key(|t| t.begin)
    }
}

/// A week of quick entry rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickEntryWeek {
    pub begin: Option<chrono::NaiveDate>,
    pub end: Option<chrono::NaiveDate>,
    pub rows: Vec<QuickEntryModel>,
    pub prototype: QuickEntryModel,
}

/// Result of saving a week
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickEntrySaveResult {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}
