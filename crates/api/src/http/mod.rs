//! axum router and server

mod error;
mod extract;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use kimai_domain::{KimaiError, Result};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{ApiError, ApiResult};
pub use extract::{ApiJson, ApiQuery, CurrentUser};

use crate::commands::{
    invoices, plugins, projects, quick_entry, reporting, statistics, system, timesheets, users,
};
use crate::context::AppContext;

/// Every route of the JSON API, mounted under `/api`.
pub fn router(ctx: Arc<AppContext>) -> Router {
    let api = Router::new()
        .route("/ping", get(system::ping))
        .route("/version", get(system::version))
        .route("/timesheets", get(timesheets::list).post(timesheets::create))
        .route("/timesheets/recent", get(timesheets::recent))
        .route("/timesheets/active", get(timesheets::active))
        .route(
            "/timesheets/{id}",
            get(timesheets::get).patch(timesheets::update).delete(timesheets::delete),
        )
        .route("/timesheets/{id}/stop", patch(timesheets::stop))
        .route("/timesheets/{id}/restart", patch(timesheets::restart))
        .route("/timesheets/{id}/duplicate", patch(timesheets::duplicate))
        .route("/timesheets/{id}/export", patch(timesheets::toggle_export))
        .route("/timesheets/{id}/meta", patch(timesheets::set_meta))
        .route("/users", get(users::list))
        .route("/users/me", get(users::me))
        .route("/users/{id}", get(users::get))
        .route("/users/{id}/actions", get(users::actions))
        .route("/projects", get(projects::list).post(projects::create))
        .route(
            "/projects/{id}",
            get(projects::get).patch(projects::update).delete(projects::delete),
        )
        .route("/projects/{id}/statistics", get(projects::statistics))
        .route("/invoices", get(invoices::archive).post(invoices::create))
        .route("/invoices/preview", post(invoices::preview))
        .route("/invoices/{id}", axum::routing::delete(invoices::delete))
        .route("/invoices/{id}/status", patch(invoices::change_status))
        .route(
            "/invoices/templates",
            get(invoices::list_templates).post(invoices::create_template),
        )
        .route(
            "/invoices/templates/{id}",
            get(invoices::get_template)
                .patch(invoices::update_template)
                .delete(invoices::delete_template),
        )
        .route("/invoices/templates/{id}/copy", post(invoices::copy_template))
        .route(
            "/invoices/documents",
            get(invoices::list_documents).post(invoices::upload_document),
        )
        .route("/invoices/documents/{id}", axum::routing::delete(invoices::delete_document))
        .route("/quick-entry", get(quick_entry::week).post(quick_entry::save))
        .route("/statistics/daily", get(statistics::daily))
        .route("/statistics/monthly", get(statistics::monthly))
        .route("/statistics/grouped", get(statistics::grouped))
        .route("/statistics/duration-today", get(statistics::duration_today))
        .route("/reporting/project-date-range", get(reporting::project_date_range))
        .route("/plugins", get(plugins::plugins));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

/// Bind `addr` and serve until ctrl-c.
pub async fn serve(ctx: Arc<AppContext>, addr: &str) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|err| KimaiError::Config(format!("Invalid bind address {addr}: {err}")))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| KimaiError::Io(format!("Could not bind {addr}: {err}")))?;

    info!(%addr, "kimai api listening");
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .map_err(|err| KimaiError::Io(err.to_string()))
}
