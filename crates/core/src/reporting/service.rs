//! Project date range report - month totals against the budget window

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use kimai_domain::utils::date::{end_of_day, month_bounds, quarter_bounds, start_of_day};
use kimai_domain::{
    BudgetType, Customer, KimaiError, Permission, Project, ProjectBudgetStatistic,
    ProjectDateRangeReport, ProjectDateRangeRow, Result, Timesheet, Totals, User,
};
use tracing::debug;

use crate::access::require;
use crate::clock::Clock;
use crate::repositories::Repositories;

pub struct ReportingService {
    repos: Repositories,
    clock: Arc<dyn Clock>,
}

#[derive(Default)]
struct Groups {
    monthly: Vec<ProjectBudgetStatistic>,
    quarterly: Vec<ProjectBudgetStatistic>,
    other: Vec<ProjectBudgetStatistic>,
}

impl ReportingService {
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }

    /// Build the report for the month containing `month` (default: now).
    ///
    /// Projects without a budget are only listed with `include_no_budget`.
    pub async fn project_date_range(
        &self,
        actor: &User,
        month: Option<NaiveDate>,
        customer: Option<i64>,
        include_no_budget: bool,
    ) -> Result<ProjectDateRangeReport> {
        require(actor, Permission::ViewReporting)?;
        let tz = actor.tz();
        let day = month.unwrap_or_else(|| self.clock.now().with_timezone(&tz).date_naive());
        let (month_begin, month_end) = month_bounds(day);
        let (quarter_begin, quarter_end) = quarter_bounds(day);

        let projects: Vec<Project> = self
            .repos
            .projects
            .find_all(customer)
            .await?
            .into_iter()
            .filter(|p| p.visible && (include_no_budget || p.has_budget()))
            .collect();
        let ids: Vec<i64> = projects.iter().map(|p| p.id).collect();

        // the quarter always contains the month
        let records = self
            .repos
            .timesheets
            .find_finished_for_projects(
                &ids,
                start_of_day(quarter_begin, tz),
                end_of_day(quarter_end, tz),
            )
            .await?;

        let mut by_customer: BTreeMap<i64, Groups> = BTreeMap::new();
        for project in projects {
            let own: Vec<&Timesheet> =
                records.iter().filter(|t| t.project_id == project.id).collect();
            let period = totals_between(&own, month_begin, month_end, tz);

            let groups = by_customer.entry(project.customer_id).or_default();
            match project.budget_type {
                Some(BudgetType::Monthly) => groups.monthly.push(ProjectBudgetStatistic {
                    budget_window: period,
                    budget_begin: month_begin,
                    budget_end: month_end,
                    period,
                    project,
                }),
                Some(BudgetType::Quarterly) => groups.quarterly.push(ProjectBudgetStatistic {
                    budget_window: totals_between(&own, quarter_begin, quarter_end, tz),
                    budget_begin: quarter_begin,
                    budget_end: quarter_end,
                    period,
                    project,
                }),
                None => {
                    let (begin, end) = lifetime(&project, month_end, tz);
                    let lifetime_records = self
                        .repos
                        .timesheets
                        .find_finished_for_projects(&[project.id], begin, end)
                        .await?;
                    let mut budget_window = Totals::default();
                    for t in &lifetime_records {
                        add(&mut budget_window, t);
                    }
                    groups.other.push(ProjectBudgetStatistic {
                        budget_window,
                        budget_begin: begin.with_timezone(&tz).date_naive(),
                        budget_end: end.with_timezone(&tz).date_naive(),
                        period,
                        project,
                    });
                }
            }
        }

        let mut customers: Vec<(Customer, Groups)> = Vec::with_capacity(by_customer.len());
        for (id, groups) in by_customer {
            let customer = self
                .repos
                .customers
                .find(id)
                .await?
                .ok_or_else(|| KimaiError::not_found("Customer", id))?;
            customers.push((customer, groups));
        }
        customers.sort_by(|(a, _), (b, _)| a.name.cmp(&b.name));

        let mut report = ProjectDateRangeReport {
            month: month_begin,
            monthly: Vec::new(),
            quarterly: Vec::new(),
            other: Vec::new(),
        };
        for (customer, groups) in customers {
            push_row(&mut report.monthly, &customer, groups.monthly);
            push_row(&mut report.quarterly, &customer, groups.quarterly);
            push_row(&mut report.other, &customer, groups.other);
        }

        debug!(
            month = %month_begin,
            monthly = report.monthly.len(),
            quarterly = report.quarterly.len(),
            other = report.other.len(),
            "project date range report built"
        );
        Ok(report)
    }
}

fn push_row(
    target: &mut Vec<ProjectDateRangeRow>,
    customer: &Customer,
    mut projects: Vec<ProjectBudgetStatistic>,
) {
    if projects.is_empty() {
        return;
    }
    projects.sort_by(|a, b| a.project.name.cmp(&b.project.name));
    target.push(ProjectDateRangeRow { customer: customer.clone(), projects });
}

fn totals_between(records: &[&Timesheet], begin: NaiveDate, end: NaiveDate, tz: Tz) -> Totals {
    let mut totals = Totals::default();
    for t in records {
        let date = t.begin.with_timezone(&tz).date_naive();
        if date >= begin && date <= end {
            add(&mut totals, t);
        }
    }
    totals
}

fn add(totals: &mut Totals, t: &Timesheet) {
    totals.add(t.duration.unwrap_or(0), t.rate, t.internal_rate.unwrap_or(0.0), t.billable);
}

/// Project start (or the epoch) up to its end (or the end of the month).
fn lifetime(project: &Project, month_end: NaiveDate, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let begin = project.start.unwrap_or(DateTime::UNIX_EPOCH);
    let end = project.end.unwrap_or_else(|| end_of_day(month_end, tz));
    (begin, end)
}
