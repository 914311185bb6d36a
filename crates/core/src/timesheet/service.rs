//! Timesheet service - tracking, editing and exporting of timesheets

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use kimai_domain::constants::DEFAULT_RECENT_SIZE;
use kimai_domain::query::{TimesheetQuery, UserFilter};
use kimai_domain::utils::date::{end_of_day, parse_local_datetime, start_of_day};
use kimai_domain::{
    Activity, Customer, KimaiError, Page, Permission, Project, RestartCopy, RestartRequest,
    Result, Timesheet, TimesheetConfig, TimesheetInput, TimesheetPatch, User,
};
use tracing::{info, warn};

use super::rates::{RateCalculator, RateContext};
use super::validator::{TimesheetValidator, ValidationContext};
use crate::access::{allowed_for_owner, require, require_for_owner};
use crate::clock::Clock;
use crate::repositories::Repositories;

/// Records a timesheet points to
struct References {
    user: User,
    project: Project,
    activity: Activity,
    customer: Customer,
}

impl References {
    fn rate_context(&self) -> RateContext<'_> {
        RateContext {
            user: &self.user,
            project: &self.project,
            activity: &self.activity,
            customer: &self.customer,
        }
    }

    fn validation(&self, is_new: bool, now: DateTime<Utc>) -> ValidationContext<'_> {
        ValidationContext {
            project: &self.project,
            activity: &self.activity,
            customer: &self.customer,
            is_new,
            now,
        }
    }
}

/// Fields that are only applied when the actor holds the matching permission
struct ProtectedFields {
    fixed_rate: Option<f64>,
    hourly_rate: Option<f64>,
    billable: Option<bool>,
    exported: Option<bool>,
}

/// Timesheet service
pub struct TimesheetService {
    repos: Repositories,
    config: TimesheetConfig,
    clock: Arc<dyn Clock>,
    validator: TimesheetValidator,
    rates: RateCalculator,
}

impl TimesheetService {
    pub fn new(repos: Repositories, config: TimesheetConfig, clock: Arc<dyn Clock>) -> Self {
        let validator = TimesheetValidator::new(config.rules.clone());
        Self { repos, config, clock, validator, rates: RateCalculator }
    }

    pub fn config(&self) -> &TimesheetConfig {
        &self.config
    }

    /// List timesheets; other users' records need `view_other_timesheet`.
    pub async fn list(&self, actor: &User, mut query: TimesheetQuery) -> Result<Page<Timesheet>> {
        require(actor, Permission::ViewOwnTimesheet)?;
        query.user = match query.user {
            UserFilter::Current => UserFilter::Id(actor.id),
            UserFilter::Id(id) if id == actor.id => UserFilter::Id(id),
            other => {
                require(actor, Permission::ViewOtherTimesheet)?;
                other
            }
        };
        self.repos.timesheets.list(&query).await
    }

    pub async fn get(&self, actor: &User, id: i64) -> Result<Timesheet> {
        let timesheet = self.load(id).await?;
        require_for_owner(
            actor,
            timesheet.user_id,
            Permission::ViewOwnTimesheet,
            Permission::ViewOtherTimesheet,
        )?;
        Ok(timesheet)
    }

    /// Create a timesheet for the actor or, with permission, another user.
    pub async fn create(&self, actor: &User, input: TimesheetInput) -> Result<Timesheet> {
        let user_id = input.user.unwrap_or(actor.id);
        require_for_owner(
            actor,
            user_id,
            Permission::CreateOwnTimesheet,
            Permission::CreateOtherTimesheet,
        )?;

        let refs = self.load_references(user_id, input.project, input.activity).await?;
        let tz = refs.user.tz();
        let now = self.clock.now();

        let (begin, end) = if self.config.mode.allows_api_times() {
            let begin = parse_optional(input.begin.as_deref(), tz)?.unwrap_or(now);
            (begin, parse_optional(input.end.as_deref(), tz)?)
        } else {
            (now, None)
        };
        let (begin, end) = self.config.rounding.apply(begin, end);

        let mut timesheet =
            Timesheet::new(user_id, refs.project.id, refs.activity.id, begin, refs.user.timezone.clone());
        if let Some(end) = end {
            timesheet.stop_at(end);
        }
        timesheet.description = input.description.filter(|d| !d.trim().is_empty());
        timesheet.tags = clean_tags(input.tags.unwrap_or_default());
        apply_protected_fields(
            actor,
            &mut timesheet,
            ProtectedFields {
                fixed_rate: input.fixed_rate,
                hourly_rate: input.hourly_rate,
                billable: input.billable,
                exported: input.exported,
            },
        );
        for field in &self.config.meta_fields {
            if let Some(default) = &field.default {
                timesheet.meta.insert(field.name.clone(), default.clone());
            }
        }

        self.validator.validate(&timesheet, &refs.validation(true, now))?;
        self.rates.apply(&mut timesheet, &refs.rate_context());
        self.save_new(timesheet).await
    }

    /// Partial update. Exported records need `edit_exported_timesheet`.
    pub async fn update(&self, actor: &User, id: i64, patch: TimesheetPatch) -> Result<Timesheet> {
        let mut timesheet = self.load(id).await?;
        check_editable(actor, &timesheet)?;

        if let Some(user_id) = patch.user.filter(|u| *u != timesheet.user_id) {
            require(actor, Permission::EditOtherTimesheet)?;
            timesheet.user_id = user_id;
        }
        if let Some(project) = patch.project {
            timesheet.project_id = project;
        }
        if let Some(activity) = patch.activity {
            timesheet.activity_id = activity;
        }

        let refs =
            self.load_references(timesheet.user_id, timesheet.project_id, timesheet.activity_id).await?;
        let tz = refs.user.tz();

        if self.config.mode.allows_api_times() {
            if let Some(begin) = parse_optional(patch.begin.as_deref(), tz)? {
                timesheet.begin = begin;
            }
            if let Some(end) = parse_optional(patch.end.as_deref(), tz)? {
                timesheet.end = Some(end);
            }
            let (begin, end) = self.config.rounding.apply(timesheet.begin, timesheet.end);
            timesheet.begin = begin;
            if let Some(end) = end {
                timesheet.stop_at(end);
            }
        }
        if let Some(description) = patch.description {
            timesheet.description = Some(description).filter(|d| !d.trim().is_empty());
        }
        if let Some(tags) = patch.tags {
            timesheet.tags = clean_tags(tags);
        }
        apply_protected_fields(
            actor,
            &mut timesheet,
            ProtectedFields {
                fixed_rate: patch.fixed_rate,
                hourly_rate: patch.hourly_rate,
                billable: patch.billable,
                exported: patch.exported,
            },
        );

        self.validator.validate(&timesheet, &refs.validation(false, self.clock.now()))?;
        self.rates.apply(&mut timesheet, &refs.rate_context());
        self.ensure_tags(&timesheet).await?;
        self.repos.timesheets.update(&timesheet).await?;
        info!(timesheet_id = id, "timesheet updated");
        Ok(timesheet)
    }

    pub async fn delete(&self, actor: &User, id: i64) -> Result<()> {
        let timesheet = self.load(id).await?;
        require_for_owner(
            actor,
            timesheet.user_id,
            Permission::DeleteOwnTimesheet,
            Permission::DeleteOtherTimesheet,
        )?;
        check_export_lock(actor, &timesheet)?;
        self.repos.timesheets.delete(id).await?;
        info!(timesheet_id = id, "timesheet deleted");
        Ok(())
    }

    /// Latest record per project/activity pair of the actor.
    pub async fn recent(
        &self,
        actor: &User,
        begin: Option<&str>,
        size: Option<u32>,
    ) -> Result<Vec<Timesheet>> {
        require(actor, Permission::ViewOwnTimesheet)?;
        let begin = parse_optional(begin, actor.tz())?;
        self.repos
            .timesheets
            .recent(actor.id, begin, size.unwrap_or(DEFAULT_RECENT_SIZE))
            .await
    }

    pub async fn active(&self, actor: &User) -> Result<Vec<Timesheet>> {
        require(actor, Permission::ViewOwnTimesheet)?;
        self.repos.timesheets.active(actor.id).await
    }

    pub async fn stop(&self, actor: &User, id: i64) -> Result<Timesheet> {
        let mut timesheet = self.load(id).await?;
        check_editable(actor, &timesheet)?;
        if !timesheet.is_running() {
            return Err(KimaiError::InvalidInput("Timesheet entry already stopped".into()));
        }
        self.finish(&mut timesheet, self.clock.now()).await?;
        info!(timesheet_id = id, duration = ?timesheet.duration, "timesheet stopped");
        Ok(timesheet)
    }

    /// Start a new running record for the project/activity of an existing one.
    pub async fn restart(&self, actor: &User, id: i64, request: RestartRequest) -> Result<Timesheet> {
        let original = self.get(actor, id).await?;
        require(actor, Permission::CreateOwnTimesheet)?;

        let now = self.clock.now();
        let begin = parse_optional(request.begin.as_deref(), actor.tz())?.unwrap_or(now);
        let begin = self.config.rounding.round_begin(begin);

        let mut timesheet = Timesheet::new(
            actor.id,
            original.project_id,
            original.activity_id,
            begin,
            actor.timezone.clone(),
        );
        if request.copy == RestartCopy::All {
            timesheet.hourly_rate = original.hourly_rate;
            timesheet.fixed_rate = original.fixed_rate;
            timesheet.description = original.description.clone();
            timesheet.billable = original.billable;
            timesheet.tags = original.tags.clone();
            timesheet.meta = original.meta.clone();
        }

        let refs =
            self.load_references(actor.id, timesheet.project_id, timesheet.activity_id).await?;
        self.validator.validate(&timesheet, &refs.validation(true, now))?;
        self.rates.apply(&mut timesheet, &refs.rate_context());
        self.save_new(timesheet).await
    }

    /// Copy a record with its export state reset.
    pub async fn duplicate(&self, actor: &User, id: i64) -> Result<Timesheet> {
        let original = self.get(actor, id).await?;
        require_for_owner(
            actor,
            original.user_id,
            Permission::CreateOwnTimesheet,
            Permission::CreateOtherTimesheet,
        )?;

        let mut copy = original.duplicate();
        let refs = self.load_references(copy.user_id, copy.project_id, copy.activity_id).await?;
        self.rates.apply(&mut copy, &refs.rate_context());
        self.save_new(copy).await
    }

    /// Flip the exported flag.
    pub async fn toggle_export(&self, actor: &User, id: i64) -> Result<Timesheet> {
        let mut timesheet = self.load(id).await?;
        require_for_owner(
            actor,
            timesheet.user_id,
            Permission::EditExportOwnTimesheet,
            Permission::EditExportOtherTimesheet,
        )?;
        check_export_lock(actor, &timesheet)?;
        timesheet.exported = !timesheet.exported;
        self.repos.timesheets.update(&timesheet).await?;
        Ok(timesheet)
    }

    /// Set a configured meta field.
    pub async fn set_meta(
        &self,
        actor: &User,
        id: i64,
        name: &str,
        value: String,
    ) -> Result<Timesheet> {
        let mut timesheet = self.load(id).await?;
        check_editable(actor, &timesheet)?;
        if !self.config.meta_fields.iter().any(|field| field.name == name) {
            return Err(KimaiError::InvalidInput("Unknown meta-field requested".into()));
        }
        timesheet.meta.insert(name.to_string(), value);
        self.repos.timesheets.update(&timesheet).await?;
        Ok(timesheet)
    }

    /// Seconds tracked today in the user's timezone; running records count
    /// up to now.
    pub async fn user_duration_today(&self, user: &User) -> Result<i64> {
        let now = self.clock.now();
        let tz = user.tz();
        let today = now.with_timezone(&tz).date_naive();
        let records = self
            .repos
            .timesheets
            .find_in_range(user.id, start_of_day(today, tz), end_of_day(today, tz))
            .await
            .map_err(|err| {
                KimaiError::Internal(format!("Failed loading widget data: {}", err.message()))
            })?;
        Ok(records.iter().map(|ts| ts.calculated_duration(now)).sum())
    }

    /// Persist a new record from quick entry or imports.
    pub async fn create_prepared(&self, mut timesheet: Timesheet) -> Result<Timesheet> {
        let refs = self
            .load_references(timesheet.user_id, timesheet.project_id, timesheet.activity_id)
            .await?;
        self.validator.validate(&timesheet, &refs.validation(true, self.clock.now()))?;
        self.rates.apply(&mut timesheet, &refs.rate_context());
        self.save_new(timesheet).await
    }

    /// Persist changes to an existing record from quick entry.
    pub async fn update_prepared(&self, mut timesheet: Timesheet) -> Result<Timesheet> {
        let refs = self
            .load_references(timesheet.user_id, timesheet.project_id, timesheet.activity_id)
            .await?;
        self.validator.validate(&timesheet, &refs.validation(false, self.clock.now()))?;
        self.rates.apply(&mut timesheet, &refs.rate_context());
        self.repos.timesheets.update(&timesheet).await?;
        Ok(timesheet)
    }

    async fn load(&self, id: i64) -> Result<Timesheet> {
        self.repos
            .timesheets
            .find(id)
            .await?
            .ok_or_else(|| KimaiError::not_found("Timesheet", id))
    }

    async fn load_references(
        &self,
        user_id: i64,
        project_id: i64,
        activity_id: i64,
    ) -> Result<References> {
        let user = self
            .repos
            .users
            .find(user_id)
            .await?
            .ok_or_else(|| KimaiError::not_found("User", user_id))?;
        let project = self
            .repos
            .projects
            .find(project_id)
            .await?
            .ok_or_else(|| KimaiError::not_found("Project", project_id))?;
        let activity = self
            .repos
            .activities
            .find(activity_id)
            .await?
            .ok_or_else(|| KimaiError::not_found("Activity", activity_id))?;
        let customer = self
            .repos
            .customers
            .find(project.customer_id)
            .await?
            .ok_or_else(|| KimaiError::not_found("Customer", project.customer_id))?;
        Ok(References { user, project, activity, customer })
    }

    async fn save_new(&self, timesheet: Timesheet) -> Result<Timesheet> {
        self.ensure_tags(&timesheet).await?;
        if timesheet.is_running() {
            self.stop_active_entries(timesheet.user_id).await?;
        }
        let created = self.repos.timesheets.create(timesheet).await?;
        info!(timesheet_id = ?created.id, user_id = created.user_id, "timesheet created");
        Ok(created)
    }

    async fn ensure_tags(&self, timesheet: &Timesheet) -> Result<()> {
        if !timesheet.tags.is_empty() {
            self.repos.tags.ensure(&timesheet.tags).await?;
        }
        Ok(())
    }

    /// Stop the oldest running records so that one more fits under the hard limit.
    async fn stop_active_entries(&self, user_id: i64) -> Result<()> {
        let limit = self.config.active_entries_hard_limit.max(1) as usize;
        let active = self.repos.timesheets.active(user_id).await?;
        if active.len() < limit {
            return Ok(());
        }

        let excess = active.len() + 1 - limit;
        let now = self.clock.now();
        for mut timesheet in active.into_iter().rev().take(excess) {
            warn!(timesheet_id = ?timesheet.id, user_id, "stopping active entry over hard limit");
            self.finish(&mut timesheet, now).await?;
        }
        Ok(())
    }

    async fn finish(&self, timesheet: &mut Timesheet, now: DateTime<Utc>) -> Result<()> {
        let end = self.config.rounding.round_end(now).max(timesheet.begin);
        timesheet.stop_at(end);
        let refs = self
            .load_references(timesheet.user_id, timesheet.project_id, timesheet.activity_id)
            .await?;
        self.rates.apply(timesheet, &refs.rate_context());
        self.repos.timesheets.update(timesheet).await
    }
}

fn check_editable(actor: &User, timesheet: &Timesheet) -> Result<()> {
    require_for_owner(
        actor,
        timesheet.user_id,
        Permission::EditOwnTimesheet,
        Permission::EditOtherTimesheet,
    )?;
    check_export_lock(actor, timesheet)
}

fn check_export_lock(actor: &User, timesheet: &Timesheet) -> Result<()> {
    if timesheet.exported && !actor.has_permission(Permission::EditExportedTimesheet) {
        return Err(KimaiError::AccessDenied("User cannot edit an exported timesheet".into()));
    }
    Ok(())
}

fn apply_protected_fields(actor: &User, timesheet: &mut Timesheet, fields: ProtectedFields) {
    let owner = timesheet.user_id;
    if allowed_for_owner(
        actor,
        owner,
        Permission::EditRateOwnTimesheet,
        Permission::EditRateOtherTimesheet,
    ) {
        if fields.fixed_rate.is_some() {
            timesheet.fixed_rate = fields.fixed_rate;
        }
        if fields.hourly_rate.is_some() {
            timesheet.hourly_rate = fields.hourly_rate;
        }
    }
    if let Some(billable) = fields.billable {
        if allowed_for_owner(
            actor,
            owner,
            Permission::EditBillableOwnTimesheet,
            Permission::EditBillableOtherTimesheet,
        ) {
            timesheet.billable = billable;
        }
    }
    if let Some(exported) = fields.exported {
        if allowed_for_owner(
            actor,
            owner,
            Permission::EditExportOwnTimesheet,
            Permission::EditExportOtherTimesheet,
        ) {
            timesheet.exported = exported;
        }
    }
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !cleaned.iter().any(|t| t == tag) {
            cleaned.push(tag.to_string());
        }
    }
    cleaned
}

fn parse_optional(value: Option<&str>, tz: Tz) -> Result<Option<DateTime<Utc>>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_local_datetime(value, tz).map(Some),
    }
}
