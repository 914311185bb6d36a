//! Port interfaces for timesheet persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kimai_domain::query::TimesheetQuery;
use kimai_domain::{InvoiceQuery, Page, ProjectStatistic, Result, Tag, Timesheet};

/// Trait for timesheet persistence and retrieval
#[async_trait]
pub trait TimesheetRepository: Send + Sync {
    async fn find(&self, id: i64) -> Result<Option<Timesheet>>;

    /// Paged list; `query.user` must already be resolved to `Id` or `All`.
    async fn list(&self, query: &TimesheetQuery) -> Result<Page<Timesheet>>;

    /// Insert a timesheet; the returned copy carries the new id.
    async fn create(&self, timesheet: Timesheet) -> Result<Timesheet>;

    async fn update(&self, timesheet: &Timesheet) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Running records of a user, newest first
    async fn active(&self, user_id: i64) -> Result<Vec<Timesheet>>;

    /// Latest record per project/activity pair, newest first
    async fn recent(
        &self,
        user_id: i64,
        begin: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<Timesheet>>;

    /// Records of one user whose begin lies in `[begin, end]`, running ones included
    async fn find_in_range(
        &self,
        user_id: i64,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Timesheet>>;

    /// Stopped records of the given users whose begin lies in `[begin, end]`
    async fn find_finished(
        &self,
        user_ids: &[i64],
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Timesheet>>;

    /// Stopped records of the given projects whose begin lies in `[begin, end]`
    async fn find_finished_for_projects(
        &self,
        project_ids: &[i64],
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Timesheet>>;

    /// Billable, stopped and not yet exported records matching an invoice run
    async fn find_for_invoice(&self, query: &InvoiceQuery) -> Result<Vec<Timesheet>>;

    async fn set_exported(&self, ids: &[i64], exported: bool) -> Result<()>;

    /// Earliest begin of a user's records
    async fn first_record(&self, user_id: i64) -> Result<Option<DateTime<Utc>>>;

    async fn project_statistic(&self, project_id: i64) -> Result<ProjectStatistic>;

    async fn delete_by_project(&self, project_id: i64) -> Result<u64>;
}

#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Create missing tags and return all requested ones
    async fn ensure(&self, names: &[String]) -> Result<Vec<Tag>>;
}
