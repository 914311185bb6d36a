//! End-to-end tests of the JSON API through the axum router.

mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;
use support::{read_json, TestApp, USER_TOKEN};

#[tokio::test(flavor = "multi_thread")]
async fn ping_needs_no_authentication() {
    let app = TestApp::new().await;

    let response = app.send(Method::GET, "/api/ping", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await, json!({ "message": "pong" }));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_or_wrong_token_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app.send(Method::GET, "/api/timesheets", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["code"], 401);
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));

    let response =
        app.send(Method::GET, "/api/users/me", Some(("susan", "wrong")), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.send(Method::GET, "/api/users/me", Some(("susan", USER_TOKEN)), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["username"], "susan");
}

#[tokio::test(flavor = "multi_thread")]
async fn timesheet_lifecycle() {
    let app = TestApp::new().await;

    let (status, created) = app
        .json(
            Method::POST,
            "/api/timesheets",
            "susan",
            Some(json!({
                "project": app.project.id,
                "activity": app.activity.id,
                "begin": "2024-05-31T10:00:00",
                "description": "Homepage"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{created}");
    let id = created["id"].as_i64().expect("created record has an id");
    assert!(created["end"].is_null());

    let (status, active) = app.json(Method::GET, "/api/timesheets/active", "susan", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active.as_array().map(Vec::len), Some(1));
    assert_eq!(active[0]["project"]["name"], "Website");

    let (status, stopped) =
        app.json(Method::PATCH, &format!("/api/timesheets/{id}/stop"), "susan", None).await;
    assert_eq!(status, StatusCode::OK, "{stopped}");
    // 10:00 Berlin is 08:00 UTC, the clock stands at 12:00 UTC
    assert_eq!(stopped["duration"], 4 * 3600);

    let (status, _) =
        app.json(Method::PATCH, &format!("/api/timesheets/{id}/stop"), "susan", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let response = app
        .send(Method::GET, "/api/timesheets?page=1&size=10", Some(("susan", USER_TOKEN)), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["X-Total-Count"], "1");
    assert_eq!(response.headers()["X-Page"], "1");

    let response = app
        .send(Method::DELETE, &format!("/api/timesheets/{id}"), Some(("susan", USER_TOKEN)), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, body) = app.json(Method::GET, &format!("/api/timesheets/{id}"), "susan", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
}

#[tokio::test(flavor = "multi_thread")]
async fn exported_record_is_locked_for_its_owner() {
    let app = TestApp::new().await;
    let (_, created) = app
        .json(
            Method::POST,
            "/api/timesheets",
            "susan",
            Some(json!({
                "project": app.project.id,
                "activity": app.activity.id,
                "begin": "2024-05-30T09:00:00",
                "end": "2024-05-30T11:00:00"
            })),
        )
        .await;
    let id = created["id"].as_i64().expect("created record has an id");

    let (status, exported) =
        app.json(Method::PATCH, &format!("/api/timesheets/{id}/export"), "admin", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(exported["exported"], true);

    let (status, body) = app
        .json(
            Method::PATCH,
            &format!("/api/timesheets/{id}"),
            "susan",
            Some(json!({ "description": "changed" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "User cannot edit an exported timesheet");

    let (status, updated) = app
        .json(
            Method::PATCH,
            &format!("/api/timesheets/{id}"),
            "admin",
            Some(json!({ "description": "changed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["description"], "changed");
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(Method::POST, "/api/timesheets", "susan", Some(json!({ "project": "nope" })))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test(flavor = "multi_thread")]
async fn other_users_statistics_need_permission() {
    let app = TestApp::new().await;

    let (status, _) =
        app.json(Method::GET, "/api/statistics/daily?user=all", "susan", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, days) = app
        .json(
            Method::GET,
            "/api/statistics/daily?begin=2024-05-01&end=2024-05-31&user=all",
            "admin",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(days.is_array());
}

#[tokio::test(flavor = "multi_thread")]
async fn invoice_templates_can_be_copied() {
    let app = TestApp::new().await;

    let (status, template) = app
        .json(
            Method::POST,
            "/api/invoices/templates",
            "admin",
            Some(json!({
                "name": "Monthly",
                "title": "Invoice",
                "company": "Kimai Inc.",
                "renderer": "default",
                "vat": 19.0
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{template}");
    let id = template["id"].as_i64().expect("template has an id");

    let (status, copy) =
        app.json(Method::POST, &format!("/api/invoices/templates/{id}/copy"), "admin", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(copy["name"], "Monthly (1)");

    let (status, _) = app.json(Method::GET, "/api/invoices/templates", "susan", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_route_is_not_found() {
    let app = TestApp::new().await;

    let response = app.send(Method::GET, "/api/nothing-here", None, None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
