use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use kimai_core::FixedClock;
use kimai_domain::constants::{HEADER_AUTH_TOKEN, HEADER_AUTH_USER};
use kimai_domain::{Activity, Config, Customer, Project, Role, User};
use kimai_lib::{router, AppContext};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const USER_TOKEN: &str = "susan-token";

/// Router over a temporary database with a fixed clock of 2024-05-31 12:00 UTC.
#[allow(dead_code)]
pub struct TestApp {
    pub ctx: Arc<AppContext>,
    pub router: Router,
    pub admin: User,
    pub user: User,
    pub customer: Customer,
    pub project: Project,
    pub activity: Activity,
    pub dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("temp dir should be created");
        let mut config = Config::default();
        config.database.path = dir.path().join("kimai.sqlite").display().to_string();
        config.invoice.documents_dir = dir.path().join("documents");
        config.invoice.archive_dir = dir.path().join("archive");
        config.paths.cache = dir.path().join("cache");

        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 5, 31, 12, 0, 0).unwrap()));
        let ctx = Arc::new(AppContext::with_clock(config, clock).expect("context should build"));

        let mut admin = User::new("admin", "admin@example.com");
        admin.add_role(Role::SuperAdmin);
        admin.timezone = "Europe/Berlin".into();
        let admin = ctx.users.create(admin, Some(ADMIN_TOKEN)).await.expect("admin created");

        let mut user = User::new("susan", "susan@example.com");
        user.timezone = "Europe/Berlin".into();
        let user = ctx.users.create(user, Some(USER_TOKEN)).await.expect("user created");

        let customer =
            ctx.repos.customers.create(Customer::new("ACME Corp")).await.expect("customer created");
        let project = ctx
            .repos
            .projects
            .create(Project::new(customer.id, "Website"))
            .await
            .expect("project created");
        let activity = ctx
            .repos
            .activities
            .create(Activity::new(None, "Development"))
            .await
            .expect("activity created");

        let router = router(Arc::clone(&ctx));
        Self { ctx, router, admin, user, customer, project, activity, dir }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        auth: Option<(&str, &str)>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some((username, token)) = auth {
            request = request.header(HEADER_AUTH_USER, username).header(HEADER_AUTH_TOKEN, token);
        }
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("request should build");

        self.router.clone().oneshot(request).await.expect("router should respond")
    }

    /// Send as `username` and decode the JSON body.
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        username: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let token = if username == "admin" { ADMIN_TOKEN } else { USER_TOKEN };
        let response = self.send(method, uri, Some((username, token)), body).await;
        let status = response.status();
        (status, read_json(response).await)
    }
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.expect("body should be read").to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("body should be json")
}
