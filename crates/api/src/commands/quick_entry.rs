//! Weekly quick entry grid

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use kimai_domain::{QuickEntryModel, QuickEntrySaveResult, QuickEntryWeek};
use serde::Deserialize;

use crate::context::AppContext;
use crate::http::{ApiJson, ApiQuery, ApiResult, CurrentUser};
use crate::utils::execute_logged;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WeekParams {
    /// Any day of the requested week
    pub begin: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct WeekSubmission {
    pub rows: Vec<QuickEntryModel>,
}

pub async fn week(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    ApiQuery(params): ApiQuery<WeekParams>,
) -> ApiResult<Json<QuickEntryWeek>> {
    let week =
        execute_logged("quick_entry::week", "http", || ctx.quick_entry.week_for(&user, params.begin))
            .await?;
    Ok(Json(week))
}

pub async fn save(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    ApiJson(submission): ApiJson<WeekSubmission>,
) -> ApiResult<Json<QuickEntrySaveResult>> {
    let result = execute_logged("quick_entry::save", "http", || {
        ctx.quick_entry.save_week(&user, submission.rows)
    })
    .await?;
    Ok(Json(result))
}
