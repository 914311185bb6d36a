//! Project management endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use kimai_domain::query::{ProjectQuery, ProjectQueryParams};
use kimai_domain::{Project, ProjectInput, ProjectStatistic};
use serde::Deserialize;

use crate::commands::timesheets::page_headers;
use crate::context::AppContext;
use crate::http::{ApiJson, ApiQuery, ApiResult, CurrentUser};
use crate::utils::execute_logged;

const SURFACE: &str = "http";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteParams {
    pub force: Option<u8>,
}

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    ApiQuery(params): ApiQuery<ProjectQueryParams>,
) -> ApiResult<(HeaderMap, Json<Vec<Project>>)> {
    let query = ProjectQuery::from(params);
    let page = execute_logged("projects::list", SURFACE, || ctx.projects.list(&user, &query)).await?;
    Ok((page_headers(&page), Json(page.items)))
}

pub async fn get(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Project>> {
    let project = execute_logged("projects::get", SURFACE, || ctx.projects.get(&user, id)).await?;
    Ok(Json(project))
}

pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    ApiJson(input): ApiJson<ProjectInput>,
) -> ApiResult<Json<Project>> {
    let project =
        execute_logged("projects::create", SURFACE, || ctx.projects.create(&user, input)).await?;
    Ok(Json(project))
}

pub async fn update(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<ProjectInput>,
) -> ApiResult<Json<Project>> {
    let project =
        execute_logged("projects::update", SURFACE, || ctx.projects.update(&user, id, input))
            .await?;
    Ok(Json(project))
}

/// Projects with timesheets are only deleted with `force=1`.
pub async fn delete(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiQuery(params): ApiQuery<DeleteParams>,
) -> ApiResult<StatusCode> {
    let force = params.force == Some(1);
    execute_logged("projects::delete", SURFACE, || ctx.projects.delete(&user, id, force)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn statistics(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProjectStatistic>> {
    let stats =
        execute_logged("projects::statistics", SURFACE, || ctx.projects.statistics(&user, id))
            .await?;
    Ok(Json(stats))
}
