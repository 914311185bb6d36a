//! Consistency rules for timesheets before they are saved

use chrono::{DateTime, Utc};
use kimai_domain::{Activity, Customer, KimaiError, Project, Result, Timesheet, TimesheetRules};

/// Records referenced by a timesheet
pub struct ValidationContext<'a> {
    pub project: &'a Project,
    pub activity: &'a Activity,
    pub customer: &'a Customer,
    /// Hidden records may not be used for new entries
    pub is_new: bool,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct TimesheetValidator {
    rules: TimesheetRules,
}

impl TimesheetValidator {
    pub fn new(rules: TimesheetRules) -> Self {
        Self { rules }
    }

    /// Returns the first violated rule.
    pub fn validate(&self, timesheet: &Timesheet, ctx: &ValidationContext<'_>) -> Result<()> {
        self.validate_times(timesheet, ctx.now)?;

        if !ctx.activity.is_usable_for(ctx.project.id) {
            return invalid("Activity does not belong to the selected project.");
        }

        if ctx.is_new {
            if !ctx.customer.visible {
                return invalid("Cannot start a disabled customer.");
            }
            if !ctx.project.visible {
                return invalid("Cannot start a disabled project.");
            }
            if !ctx.activity.visible {
                return invalid("Cannot start a disabled activity.");
            }
        }

        if let (Some(start), Some(end)) = (ctx.project.start, ctx.project.end) {
            if timesheet.begin < start || timesheet.begin > end {
                return invalid("The project is not active at the given date.");
            }
        }

        Ok(())
    }

    /// Begin/end ordering and the zero-duration rule.
    pub fn validate_times(&self, timesheet: &Timesheet, now: DateTime<Utc>) -> Result<()> {
        if let Some(end) = timesheet.end {
            if end < timesheet.begin {
                return invalid("End date must not be earlier than start date.");
            }
            if end == timesheet.begin && !self.rules.allow_zero_duration {
                return invalid("Duration cannot be zero.");
            }
        }
        if !self.rules.allow_future_times && timesheet.begin > now {
            return invalid("The begin date cannot be in the future.");
        }
        Ok(())
    }
}

fn invalid(message: &str) -> Result<()> {
    Err(KimaiError::InvalidInput(message.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn zero_duration() -> Timesheet {
        let begin = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        let mut ts = Timesheet::new(1, 1, 1, begin, "UTC");
        ts.stop_at(begin);
        ts
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 2, 9, 0, 0).unwrap()
    }

    #[test]
    fn zero_duration_is_disallowed_by_default() {
        let err = TimesheetValidator::default().validate_times(&zero_duration(), now()).unwrap_err();
        assert_eq!(err, KimaiError::InvalidInput("Duration cannot be zero.".into()));
    }

    #[test]
    fn zero_duration_can_be_allowed() {
        let rules = TimesheetRules { allow_zero_duration: true, ..TimesheetRules::default() };
        assert!(TimesheetValidator::new(rules).validate_times(&zero_duration(), now()).is_ok());
    }

    #[test]
    fn end_before_begin() {
        let mut ts = zero_duration();
        ts.end = Some(ts.begin - chrono::Duration::minutes(1));
        let err = TimesheetValidator::default().validate_times(&ts, now()).unwrap_err();
        assert_eq!(err.message(), "End date must not be earlier than start date.");
    }

    #[test]
    fn running_entries_need_no_end() {
        let ts = Timesheet::new(1, 1, 1, now(), "UTC");
        assert!(TimesheetValidator::default().validate_times(&ts, now()).is_ok());
    }

    #[test]
    fn future_begin_respects_rule() {
        let ts = Timesheet::new(1, 1, 1, now() + chrono::Duration::hours(1), "UTC");
        assert!(TimesheetValidator::default().validate_times(&ts, now()).is_ok());
        let rules = TimesheetRules { allow_future_times: false, ..TimesheetRules::default() };
        assert!(TimesheetValidator::new(rules).validate_times(&ts, now()).is_err());
    }

    #[test]
    fn activity_must_belong_to_project() {
        let mut customer = Customer::new("C");
        customer.id = 1;
        let mut project = Project::new(1, "P");
        project.id = 1;
        let mut activity = Activity::new(Some(2), "A");
        activity.id = 1;
        let mut ts = Timesheet::new(1, 1, 1, now() - chrono::Duration::hours(2), "UTC");
        ts.stop_at(now());

        let ctx = ValidationContext {
            project: &project,
            activity: &activity,
            customer: &customer,
            is_new: true,
            now: now(),
        };
        let err = TimesheetValidator::default().validate(&ts, &ctx).unwrap_err();
        assert_eq!(err.message(), "Activity does not belong to the selected project.");
    }

    #[test]
    fn hidden_project_only_blocks_new_records() {
        let mut customer = Customer::new("C");
        customer.id = 1;
        let mut project = Project::new(1, "P");
        project.id = 1;
        project.visible = false;
        let mut activity = Activity::new(None, "A");
        activity.id = 1;
        let mut ts = Timesheet::new(1, 1, 1, now() - chrono::Duration::hours(2), "UTC");
        ts.stop_at(now());

        let mut ctx = ValidationContext {
            project: &project,
            activity: &activity,
            customer: &customer,
            is_new: true,
            now: now(),
        };
        let validator = TimesheetValidator::default();
        assert_eq!(validator.validate(&ts, &ctx).unwrap_err().message(), "Cannot start a disabled project.");
        ctx.is_new = false;
        assert!(validator.validate(&ts, &ctx).is_ok());
    }
}
