//! Statistic service - daily, monthly and grouped timesheet totals
//!
//! Only stopped records are counted. Records are bucketed by the local date
//! of their begin in the user's timezone; buckets outside the requested
//! range are skipped.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use kimai_domain::utils::date::days_between;
use kimai_domain::{
    ActivityDays, DailyStatistic, Day, KimaiError, MonthlyStatistic, ProjectDays, Result,
    Timesheet, Totals, User, UserDayGrouping,
};

use crate::project::ports::{ActivityRepository, ProjectRepository};
use crate::timesheet::ports::TimesheetRepository;

pub struct StatisticService {
    timesheets: Arc<dyn TimesheetRepository>,
    projects: Arc<dyn ProjectRepository>,
    activities: Arc<dyn ActivityRepository>,
}

impl StatisticService {
    pub fn new(
        timesheets: Arc<dyn TimesheetRepository>,
        projects: Arc<dyn ProjectRepository>,
        activities: Arc<dyn ActivityRepository>,
    ) -> Self {
        Self { timesheets, projects, activities }
    }

    /// One entry per user with every day between `begin` and `end`.
    pub async fn get_daily_statistics(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        users: &[User],
    ) -> Result<Vec<DailyStatistic>> {
        let records = self.load(begin, end, users).await?;
        let mut stats = Vec::with_capacity(users.len());

        for user in users {
            let tz = user.tz();
            let dates = local_days(begin, end, tz);
            let mut stat = DailyStatistic::new(user.clone(), &dates);
            for ts in records.iter().filter(|ts| ts.user_id == user.id) {
                if let Some(day) = stat.day_mut(ts.begin.with_timezone(&tz).date_naive()) {
                    add(&mut day.totals, ts);
                }
            }
            stats.push(stat);
        }

        Ok(stats)
    }

    /// Per user: year → month totals for every year touched by the range.
    pub async fn get_monthly_statistics(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        users: &[User],
    ) -> Result<Vec<MonthlyStatistic>> {
        let records = self.load(begin, end, users).await?;
        let mut stats = Vec::with_capacity(users.len());

        for user in users {
            let tz = user.tz();
            let first_year = begin.with_timezone(&tz).year();
            let last_year = end.with_timezone(&tz).year();
            let mut stat = MonthlyStatistic::new(user.clone(), first_year, last_year);
            for ts in records.iter().filter(|ts| ts.user_id == user.id) {
                let local = ts.begin.with_timezone(&tz);
                if let Some(month) = stat.month_mut(local.year(), local.month()) {
                    add(&mut month.totals, ts);
                }
            }
            stats.push(stat);
        }

        Ok(stats)
    }

    /// Per user: project → activity → days.
    pub async fn get_daily_statistics_grouped(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        users: &[User],
    ) -> Result<Vec<UserDayGrouping>> {
        let records = self.load(begin, end, users).await?;
        let mut result = Vec::with_capacity(users.len());

        for user in users {
            let tz = user.tz();
            let dates = local_days(begin, end, tz);
            let mut grouped: BTreeMap<i64, BTreeMap<i64, Vec<Day>>> = BTreeMap::new();

            for ts in records.iter().filter(|ts| ts.user_id == user.id) {
                let days = grouped
                    .entry(ts.project_id)
                    .or_default()
                    .entry(ts.activity_id)
                    .or_insert_with(|| dates.iter().copied().map(Day::new).collect());
                let date = ts.begin.with_timezone(&tz).date_naive();
                if let Some(day) = days.iter_mut().find(|d| d.date == date) {
                    add(&mut day.totals, ts);
                }
            }

            let mut projects = Vec::with_capacity(grouped.len());
            let mut user_totals = Totals::default();
            for (project_id, activities) in grouped {
                let project = self
                    .projects
                    .find(project_id)
                    .await?
                    .ok_or_else(|| KimaiError::not_found("Project", project_id))?;
                let mut project_days =
                    ProjectDays { project, activities: Vec::new(), totals: Totals::default() };

                for (activity_id, days) in activities {
                    let activity = self
                        .activities
                        .find(activity_id)
                        .await?
                        .ok_or_else(|| KimaiError::not_found("Activity", activity_id))?;
                    let totals = sum(days.iter().map(|d| &d.totals));
                    project_days.totals.merge(&totals);
                    project_days.activities.push(ActivityDays { activity, days, totals });
                }

                user_totals.merge(&project_days.totals);
                projects.push(project_days);
            }

            result.push(UserDayGrouping { user: user.clone(), projects, totals: user_totals });
        }

        Ok(result)
    }

    /// Begin of the user's first record in the user's timezone.
    pub async fn find_first_record_date(&self, user: &User) -> Result<Option<DateTime<Tz>>> {
        let first = self.timesheets.first_record(user.id).await?;
        Ok(first.map(|instant| instant.with_timezone(&user.tz())))
    }

    async fn load(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        users: &[User],
    ) -> Result<Vec<Timesheet>> {
        if users.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        let records = self.timesheets.find_finished(&ids, begin, end).await?;
        Ok(records
            .into_iter()
            .filter(|ts| ts.end.is_some() && ts.begin >= begin && ts.begin <= end)
            .collect())
    }
}

fn local_days(begin: DateTime<Utc>, end: DateTime<Utc>, tz: Tz) -> Vec<chrono::NaiveDate> {
    days_between(begin.with_timezone(&tz).date_naive(), end.with_timezone(&tz).date_naive())
}

fn add(totals: &mut Totals, ts: &Timesheet) {
    totals.add(
        ts.duration.unwrap_or(0),
        ts.rate,
        ts.internal_rate.unwrap_or(0.0),
        ts.billable,
    );
}

fn sum<'a>(totals: impl Iterator<Item = &'a Totals>) -> Totals {
    let mut result = Totals::default();
    for t in totals {
        result.merge(t);
    }
    result
}
