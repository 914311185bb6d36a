//! Weekly quick entry grid

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;
use kimai_domain::utils::date::{end_of_day, local_to_utc, start_of_day, week_bounds};
use kimai_domain::utils::duration;
use kimai_domain::{
    Activity, KimaiError, Permission, Project, QuickEntryConfig, QuickEntryModel,
    QuickEntrySaveResult, QuickEntryWeek, Result, Timesheet, User,
};
use tracing::{debug, info};

use crate::access::require;
use crate::clock::Clock;
use crate::repositories::Repositories;
use crate::timesheet::TimesheetService;

/// One grid row while the week is assembled
struct Row {
    project_id: i64,
    activity_id: i64,
    days: BTreeMap<NaiveDate, Timesheet>,
}

pub struct QuickEntryService {
    repos: Repositories,
    timesheets: Arc<TimesheetService>,
    config: QuickEntryConfig,
    clock: Arc<dyn Clock>,
}

impl QuickEntryService {
    pub fn new(
        repos: Repositories,
        timesheets: Arc<TimesheetService>,
        config: QuickEntryConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { repos, timesheets, config, clock }
    }

    /// Grid for the Monday..Sunday week containing `begin` (default today).
    pub async fn week_for(&self, actor: &User, begin: Option<NaiveDate>) -> Result<QuickEntryWeek> {
        require(actor, Permission::ViewOwnTimesheet)?;
        let tz = actor.tz();
        let day = begin.unwrap_or_else(|| self.clock.now().with_timezone(&tz).date_naive());
        let (first, last) = week_bounds(day);
        let days: Vec<NaiveDate> = first.iter_days().take_while(|d| *d <= last).collect();

        let records = self
            .repos
            .timesheets
            .find_in_range(actor.id, start_of_day(first, tz), end_of_day(last, tz))
            .await?;

        let mut rows: BTreeMap<String, Row> = BTreeMap::new();
        for timesheet in records {
            let base = format!("{}_{}", timesheet.project_id, timesheet.activity_id);
            let date = timesheet.local_date();
            let mut key = base.clone();
            let mut i = 0;
            while rows.get(&key).is_some_and(|row| row.days.contains_key(&date)) {
                i += 1;
                key = format!("{base}_{i}");
            }
            rows.entry(key)
                .or_insert_with(|| Row {
                    project_id: timesheet.project_id,
                    activity_id: timesheet.activity_id,
                    days: BTreeMap::new(),
                })
                .days
                .insert(date, timesheet);
        }

        let recent_from = self
            .config
            .recent_activity_weeks
            .filter(|weeks| *weeks > 0)
            .map(|weeks| {
                first
                    .checked_sub_days(Days::new(u64::from(weeks) * 7))
                    .map(|day| start_of_day(day, tz))
                    .ok_or_else(|| {
                        KimaiError::Config(format!("Invalid recent activity weeks: {weeks}"))
                    })
            })
            .transpose()?;
        let recent = self
            .repos
            .timesheets
            .recent(actor.id, recent_from, self.config.recent_activities)
            .await?;
        for timesheet in recent {
            let key = format!("{}_{}", timesheet.project_id, timesheet.activity_id);
            rows.entry(key).or_insert_with(|| Row {
                project_id: timesheet.project_id,
                activity_id: timesheet.activity_id,
                days: BTreeMap::new(),
            });
        }

        let default_begin = self.default_begin()?;
        let mut projects: HashMap<i64, Option<Project>> = HashMap::new();
        let mut activities: HashMap<i64, Option<Activity>> = HashMap::new();
        let mut models = Vec::with_capacity(rows.len());

        for row in rows.into_values() {
            if !projects.contains_key(&row.project_id) {
                let project = self.repos.projects.find(row.project_id).await?;
                projects.insert(row.project_id, project);
            }
            if !activities.contains_key(&row.activity_id) {
                let activity = self.repos.activities.find(row.activity_id).await?;
                activities.insert(row.activity_id, activity);
            }

            let mut model = QuickEntryModel::new(
                Some(actor.clone()),
                projects.get(&row.project_id).cloned().flatten(),
                activities.get(&row.activity_id).cloned().flatten(),
            );
            let mut existing = row.days;
            for date in &days {
                let timesheet = existing.remove(date).unwrap_or_else(|| {
                    placeholder(actor, row.project_id, row.activity_id, *date, default_begin, tz)
                });
                model.add_timesheet(timesheet);
            }
            models.push(model);
        }

        let mut prototype = QuickEntryModel::new(Some(actor.clone()), None, None);
        for date in &days {
            prototype.add_timesheet(placeholder(actor, 0, 0, *date, default_begin, tz));
        }

        let minimum = self.config.minimum_rows as usize;
        while models.len() < minimum {
            let mut model = QuickEntryModel::default();
            for date in &days {
                model.add_timesheet(placeholder(actor, 0, 0, *date, default_begin, tz));
            }
            models.push(model);
        }

        models.sort_by(|a, b| match (&a.project, &b.project) {
            (Some(a), Some(b)) => a.name.cmp(&b.name),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        debug!(user_id = actor.id, rows = models.len(), %first, "quick entry week prepared");
        Ok(QuickEntryWeek { begin: Some(first), end: Some(last), rows: models, prototype })
    }

    /// Persist a submitted grid.
    ///
    /// Existing cells without duration or end are deleted, other existing
    /// cells are updated and new cells with a duration are created. Deleting
    /// needs `delete_own_timesheet` like any other delete.
    pub async fn save_week(
        &self,
        actor: &User,
        rows: Vec<QuickEntryModel>,
    ) -> Result<QuickEntrySaveResult> {
        require(actor, Permission::EditOwnTimesheet)?;
        let mut result = QuickEntrySaveResult::default();

        for row in rows {
            let project_id = row.project.as_ref().map(|p| p.id);
            let activity_id = row.activity.as_ref().map(|a| a.id);
            let inputs = row.durations;

            for (day, submitted) in row.timesheets {
                let entered = inputs.get(&day);
                let duration = match entered {
                    Some(text) => self.parse_duration(text)?,
                    None => submitted.duration,
                };

                match submitted.id {
                    Some(id) => {
                        let stored = self
                            .repos
                            .timesheets
                            .find(id)
                            .await?
                            .ok_or_else(|| KimaiError::not_found("Timesheet", id))?;
                        if stored.user_id != actor.id {
                            return Err(KimaiError::AccessDenied(
                                "Quick entry only edits own timesheets".into(),
                            ));
                        }

                        let cleared = entered.is_none() && submitted.end.is_none();
                        let Some(duration) = duration.filter(|_| !cleared) else {
                            self.timesheets.delete(actor, id).await?;
                            result.deleted += 1;
                            continue;
                        };

                        let end = end_after(submitted.begin, duration)?;
                        if stored.begin == submitted.begin && stored.end == Some(end) {
                            continue;
                        }
                        let mut changed = stored;
                        changed.begin = submitted.begin;
                        changed.stop_at(end);
                        if submitted.description.is_some() {
                            changed.description = submitted.description;
                        }
                        self.timesheets.update_prepared(changed).await?;
                        result.updated += 1;
                    }
                    None => {
                        let Some(duration) = duration else {
                            continue;
                        };
                        let project_id = project_id.unwrap_or(submitted.project_id);
                        let activity_id = activity_id.unwrap_or(submitted.activity_id);
                        if project_id == 0 || activity_id == 0 {
                            return Err(KimaiError::InvalidInput(
                                "Project and activity are required".into(),
                            ));
                        }

                        let end = end_after(submitted.begin, duration)?;
                        let mut timesheet = Timesheet::new(
                            actor.id,
                            project_id,
                            activity_id,
                            submitted.begin,
                            actor.timezone.clone(),
                        );
                        timesheet.description = submitted.description;
                        timesheet.stop_at(end);
                        self.timesheets.create_prepared(timesheet).await?;
                        result.created += 1;
                    }
                }
            }
        }

        info!(
            user_id = actor.id,
            created = result.created,
            updated = result.updated,
            deleted = result.deleted,
            "quick entry saved"
        );
        Ok(result)
    }

    /// Seconds for a typed duration; blank input clears the cell.
    fn parse_duration(&self, input: &str) -> Result<Option<i64>> {
        if input.trim().is_empty() {
            return Ok(None);
        }
        let seconds = match self.timesheets.config().duration_format {
            Some(format) => duration::parse(input, format)?,
            None => duration::parse_duration_string(input)?,
        };
        Ok(Some(seconds))
    }

    fn default_begin(&self) -> Result<NaiveTime> {
        let value = &self.timesheets.config().default_begin;
        NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
            KimaiError::Config(format!("Invalid default begin time: {value}"))
        })
    }
}

/// End of a cell that starts at `begin` and lasts `seconds`.
fn end_after(begin: DateTime<Utc>, seconds: i64) -> Result<DateTime<Utc>> {
    if seconds < 0 {
        return Err(KimaiError::InvalidInput(format!("Invalid duration: {seconds}")));
    }
    TimeDelta::try_seconds(seconds)
        .and_then(|delta| begin.checked_add_signed(delta))
        .ok_or_else(|| KimaiError::InvalidInput(format!("Duration out of range: {seconds}")))
}

fn placeholder(
    actor: &User,
    project_id: i64,
    activity_id: i64,
    date: NaiveDate,
    time: NaiveTime,
    tz: Tz,
) -> Timesheet {
    let begin = local_to_utc(date.and_time(time), tz);
    Timesheet::new(actor.id, project_id, activity_id, begin, tz.name())
}
