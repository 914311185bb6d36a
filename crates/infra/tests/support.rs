use std::sync::Arc;

use chrono::{DateTime, Utc};
use kimai_core::Repositories;
use kimai_domain::{Activity, Customer, Project, Role, Timesheet, User};
use kimai_infra::database::{sqlite_repositories, DbManager};
use tempfile::TempDir;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    pub repos: Repositories,
    pub dir: TempDir,
}

impl TestDatabase {
    /// Create a new temporary database with the schema applied.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir should be created");
        let manager = Arc::new(
            DbManager::new(dir.path().join("kimai.sqlite"), 4)
                .expect("db manager should be created"),
        );
        manager.run_migrations().expect("schema should apply");
        let repos = sqlite_repositories(Arc::clone(&manager));

        Self { manager, repos, dir }
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Ids of the records created by [`seed`]
#[allow(dead_code)]
pub struct Seeded {
    pub admin: User,
    pub user: User,
    pub customer: Customer,
    pub project: Project,
    pub activity: Activity,
}

pub async fn seed(db: &TestDatabase) -> Seeded {
    let mut admin = User::new("admin", "admin@example.com");
    admin.add_role(Role::SuperAdmin);
    admin.timezone = "Europe/Berlin".into();
    let admin = db.repos.users.create(admin).await.expect("admin created");

    let mut user = User::new("susan", "susan@example.com");
    user.alias = Some("Susan Miller".into());
    user.timezone = "Europe/Berlin".into();
    let user = db.repos.users.create(user).await.expect("user created");

    let mut customer = Customer::new("ACME Corp");
    customer.number = Some("C-1".into());
    let customer = db.repos.customers.create(customer).await.expect("customer created");

    let project = db
        .repos
        .projects
        .create(Project::new(customer.id, "Website"))
        .await
        .expect("project created");
    let activity =
        db.repos.activities.create(Activity::new(None, "Development")).await.expect("activity");

    Seeded { admin, user, customer, project, activity }
}

/// Finished record of `seconds` length with the given rate.
#[allow(dead_code)]
pub fn finished(
    seeded: &Seeded,
    user: &User,
    begin: DateTime<Utc>,
    seconds: i64,
    rate: f64,
) -> Timesheet {
    let mut timesheet =
        Timesheet::new(user.id, seeded.project.id, seeded.activity.id, begin, user.timezone.clone());
    timesheet.stop_at(begin + chrono::Duration::seconds(seconds));
    timesheet.hourly_rate = Some(rate);
    timesheet.rate = rate * seconds as f64 / 3600.0;
    timesheet
}
