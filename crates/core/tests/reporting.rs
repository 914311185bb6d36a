//! Project management, statistics and the project date range report

mod support;

use chrono::{Datelike, NaiveDate};
use kimai_core::{ProjectService, ReportingService, StatisticService};
use kimai_domain::query::ProjectQuery;
use kimai_domain::{BudgetType, KimaiError, Project, ProjectInput};
use support::{at, clock, Fixture};

fn projects(fx: &Fixture) -> ProjectService {
    ProjectService::new(
        fx.repos.customers.clone(),
        fx.repos.projects.clone(),
        fx.repos.activities.clone(),
        fx.repos.timesheets.clone(),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn project_crud_checks_permissions() {
    let fx = Fixture::new().await;
    let service = projects(&fx);
    let input = ProjectInput {
        customer: Some(fx.customer.id),
        name: Some("Mobile App".into()),
        budget: Some(5000.0),
        budget_type: Some(BudgetType::Monthly),
        ..ProjectInput::default()
    };

    let err = service.create(&fx.user, input.clone()).await.unwrap_err();
    assert!(matches!(err, KimaiError::AccessDenied(_)));

    let created = service.create(&fx.admin, input).await.unwrap();
    assert_eq!(created.name, "Mobile App");
    assert!(created.has_budget());

    let page = service.list(&fx.teamlead, &ProjectQuery::default()).await.unwrap();
    assert_eq!(page.total, 2);

    let renamed = service
        .update(
            &fx.admin,
            created.id,
            ProjectInput { name: Some("App".into()), ..ProjectInput::default() },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "App");
    assert_eq!(renamed.budget, Some(5000.0));
}

#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_used_project_needs_force() {
    let fx = Fixture::new().await;
    let service = projects(&fx);
    fx.memory.insert_timesheet(fx.record(fx.user.id, at(4, 8, 0), 3600));
    fx.memory.insert_timesheet(fx.record(fx.user.id, at(5, 8, 0), 1800));

    let stats = service.statistics(&fx.admin, fx.project.id).await.unwrap();
    assert_eq!(stats.record_count, 2);
    assert_eq!(stats.duration, 5400);
    assert_eq!(stats.first_record, Some(at(4, 8, 0)));

    let err = service.delete(&fx.admin, fx.project.id, false).await.unwrap_err();
    assert!(matches!(err, KimaiError::Conflict(ref m) if m.contains("2 timesheet records")));

    service.delete(&fx.admin, fx.project.id, true).await.unwrap();
    assert!(fx.memory.timesheets().is_empty());
    let err = service.get(&fx.admin, fx.project.id).await.unwrap_err();
    assert!(matches!(err, KimaiError::NotFound(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn daily_statistics_cover_every_day() {
    let fx = Fixture::new().await;
    fx.memory.insert_timesheet(fx.record(fx.user.id, at(11, 8, 0), 3600));
    fx.memory.insert_timesheet(fx.record(fx.user.id, at(11, 14, 0), 1800));
    fx.memory.insert_timesheet(fx.record(fx.user.id, at(13, 8, 0), 900));
    let service = StatisticService::new(
        fx.repos.timesheets.clone(),
        fx.repos.projects.clone(),
        fx.repos.activities.clone(),
    );

    let users = vec![fx.user.clone()];
    let daily = service
        .get_daily_statistics(at(11, 0, 0), at(17, 23, 59), &users)
        .await
        .unwrap();
    assert_eq!(daily.len(), 1);
    let days = &daily[0].days;
    assert_eq!(days.len(), 7);
    assert_eq!(days[0].totals.duration, 5400);
    assert_eq!(days[1].totals.duration, 0);
    assert_eq!(days[2].totals.duration, 900);

    let monthly = service
        .get_monthly_statistics(at(1, 0, 0), at(31, 23, 59), &users)
        .await
        .unwrap();
    let year = &monthly[0].years[&2024];
    assert_eq!(year.months[2].totals.duration, 6300);

    let grouped = service
        .get_daily_statistics_grouped(at(11, 0, 0), at(17, 23, 59), &users)
        .await
        .unwrap();
    assert_eq!(grouped[0].totals.duration, 6300);
    assert_eq!(grouped[0].projects[0].activities[0].days.len(), 7);

    let first = service.find_first_record_date(&fx.user).await.unwrap().unwrap();
    assert_eq!(first.day(), 11);
}

#[tokio::test(flavor = "multi_thread")]
async fn report_splits_projects_by_budget_type() {
    let fx = Fixture::new().await;
    let mut monthly = Project::new(fx.customer.id, "Retainer");
    monthly.budget = Some(1000.0);
    monthly.budget_type = Some(BudgetType::Monthly);
    let monthly = fx.repos.projects.create(monthly).await.unwrap();
    let mut quarterly = Project::new(fx.customer.id, "Support");
    quarterly.time_budget = Some(36000);
    quarterly.budget_type = Some(BudgetType::Quarterly);
    let quarterly = fx.repos.projects.create(quarterly).await.unwrap();

    let record = |project_id: i64, day: u32, month: u32, seconds: i64| {
        let begin = chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2024, month, day, 9, 0, 0)
            .unwrap();
        let mut ts = fx.record(fx.user.id, begin, seconds);
        ts.project_id = project_id;
        fx.memory.insert_timesheet(ts);
    };
    record(monthly.id, 4, 3, 3600);
    record(monthly.id, 4, 2, 3600);
    record(quarterly.id, 5, 3, 1800);
    record(quarterly.id, 5, 1, 3600);

    let service = ReportingService::new(fx.repos.clone(), clock());
    let report = service
        .project_date_range(&fx.teamlead, NaiveDate::from_ymd_opt(2024, 3, 20), None, false)
        .await
        .unwrap();

    assert_eq!(report.month, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    assert!(report.other.is_empty(), "projects without budget are skipped");

    let row = &report.monthly[0].projects[0];
    assert_eq!(row.project.id, monthly.id);
    assert_eq!(row.period.duration, 3600);
    assert_eq!(row.budget_window.duration, 3600);

    let row = &report.quarterly[0].projects[0];
    assert_eq!(row.period.duration, 1800);
    assert_eq!(row.budget_window.duration, 5400);
    assert_eq!(row.budget_begin, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(row.time_budget_percent(), Some(15.0));

    let with_unbudgeted = service
        .project_date_range(&fx.teamlead, NaiveDate::from_ymd_opt(2024, 3, 20), None, true)
        .await
        .unwrap();
    assert_eq!(with_unbudgeted.other[0].projects[0].project.id, fx.project.id);

    let err = service.project_date_range(&fx.user, None, None, false).await.unwrap_err();
    assert!(matches!(err, KimaiError::AccessDenied(_)));
}
