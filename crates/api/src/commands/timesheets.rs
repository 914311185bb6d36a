//! Timesheet endpoints

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::Json;
use kimai_domain::query::TimesheetQueryParams;
use kimai_domain::{
    Activity, MetaFieldInput, Page, Project, RestartRequest, Timesheet, TimesheetInput,
    TimesheetPatch, User,
};
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::http::{ApiJson, ApiQuery, ApiResult, CurrentUser};
use crate::utils::execute_logged;

const SURFACE: &str = "http";

/// A timesheet with its relations, returned for `full=true`.
#[derive(Debug, Serialize)]
pub struct TimesheetExpanded {
    #[serde(flatten)]
    pub timesheet: Timesheet,
    pub user: Option<User>,
    pub project: Option<Project>,
    pub activity: Option<Activity>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecentParams {
    pub begin: Option<String>,
    pub size: Option<u32>,
}

/// Either plain or expanded records, depending on `full`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TimesheetList {
    Plain(Vec<Timesheet>),
    Full(Vec<TimesheetExpanded>),
}

/// Paging headers as sent by the collection endpoints.
pub fn page_headers<T>(page: &Page<T>) -> HeaderMap {
    let pages = page.total.div_ceil(u64::from(page.page_size.max(1)));
    let mut headers = HeaderMap::new();
    headers.insert("X-Page", HeaderValue::from(page.page));
    headers.insert("X-Per-Page", HeaderValue::from(page.page_size));
    headers.insert("X-Total-Count", HeaderValue::from(page.total));
    headers.insert("X-Total-Pages", HeaderValue::from(pages));
    headers
}

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    ApiQuery(params): ApiQuery<TimesheetQueryParams>,
) -> ApiResult<(HeaderMap, Json<TimesheetList>)> {
    let full = params.is_full();
    let page = execute_logged("timesheets::list", SURFACE, || async {
        let query = params.into_query(user.tz())?;
        ctx.timesheets.list(&user, query).await
    })
    .await?;

    let headers = page_headers(&page);
    let list = if full {
        TimesheetList::Full(expand(&ctx, page.items).await?)
    } else {
        TimesheetList::Plain(page.items)
    };
    Ok((headers, Json(list)))
}

pub async fn recent(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    ApiQuery(params): ApiQuery<RecentParams>,
) -> ApiResult<Json<Vec<TimesheetExpanded>>> {
    let records = execute_logged("timesheets::recent", SURFACE, || {
        ctx.timesheets.recent(&user, params.begin.as_deref(), params.size)
    })
    .await?;
    Ok(Json(expand(&ctx, records).await?))
}

pub async fn active(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<TimesheetExpanded>>> {
    let records =
        execute_logged("timesheets::active", SURFACE, || ctx.timesheets.active(&user)).await?;
    Ok(Json(expand(&ctx, records).await?))
}

pub async fn get(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Timesheet>> {
    let timesheet = execute_logged("timesheets::get", SURFACE, || ctx.timesheets.get(&user, id)).await?;
    Ok(Json(timesheet))
}

pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    ApiJson(input): ApiJson<TimesheetInput>,
) -> ApiResult<Json<Timesheet>> {
    let timesheet =
        execute_logged("timesheets::create", SURFACE, || ctx.timesheets.create(&user, input))
            .await?;
    Ok(Json(timesheet))
}

pub async fn update(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(patch): ApiJson<TimesheetPatch>,
) -> ApiResult<Json<Timesheet>> {
    let timesheet =
        execute_logged("timesheets::update", SURFACE, || ctx.timesheets.update(&user, id, patch))
            .await?;
    Ok(Json(timesheet))
}

pub async fn delete(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    execute_logged("timesheets::delete", SURFACE, || ctx.timesheets.delete(&user, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn stop(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Timesheet>> {
    let timesheet =
        execute_logged("timesheets::stop", SURFACE, || ctx.timesheets.stop(&user, id)).await?;
    Ok(Json(timesheet))
}

pub async fn restart(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiQuery(request): ApiQuery<RestartRequest>,
) -> ApiResult<Json<Timesheet>> {
    let timesheet = execute_logged("timesheets::restart", SURFACE, || {
        ctx.timesheets.restart(&user, id, request)
    })
    .await?;
    Ok(Json(timesheet))
}

pub async fn duplicate(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Timesheet>> {
    let timesheet =
        execute_logged("timesheets::duplicate", SURFACE, || ctx.timesheets.duplicate(&user, id))
            .await?;
    Ok(Json(timesheet))
}

pub async fn toggle_export(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Timesheet>> {
    let timesheet = execute_logged("timesheets::export", SURFACE, || {
        ctx.timesheets.toggle_export(&user, id)
    })
    .await?;
    Ok(Json(timesheet))
}

pub async fn set_meta(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<MetaFieldInput>,
) -> ApiResult<Json<Timesheet>> {
    let timesheet = execute_logged("timesheets::meta", SURFACE, || {
        ctx.timesheets.set_meta(&user, id, &input.name, input.value)
    })
    .await?;
    Ok(Json(timesheet))
}

/// Attach user, project and activity; each relation is loaded once.
async fn expand(
    ctx: &AppContext,
    records: Vec<Timesheet>,
) -> kimai_domain::Result<Vec<TimesheetExpanded>> {
    let mut users: HashMap<i64, Option<User>> = HashMap::new();
    let mut projects: HashMap<i64, Option<Project>> = HashMap::new();
    let mut activities: HashMap<i64, Option<Activity>> = HashMap::new();

    let mut expanded = Vec::with_capacity(records.len());
    for timesheet in records {
        if !users.contains_key(&timesheet.user_id) {
            users.insert(timesheet.user_id, ctx.repos.users.find(timesheet.user_id).await?);
        }
        if !projects.contains_key(&timesheet.project_id) {
            projects.insert(timesheet.project_id, ctx.repos.projects.find(timesheet.project_id).await?);
        }
        if !activities.contains_key(&timesheet.activity_id) {
            activities
                .insert(timesheet.activity_id, ctx.repos.activities.find(timesheet.activity_id).await?);
        }
        expanded.push(TimesheetExpanded {
            user: users.get(&timesheet.user_id).cloned().flatten(),
            project: projects.get(&timesheet.project_id).cloned().flatten(),
            activity: activities.get(&timesheet.activity_id).cloned().flatten(),
            timesheet,
        });
    }
    Ok(expanded)
}
