//! Reports

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use kimai_domain::ProjectDateRangeReport;
use serde::Deserialize;

use crate::context::AppContext;
use crate::http::{ApiQuery, ApiResult, CurrentUser};
use crate::utils::execute_logged;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportParams {
    /// Any day of the reported month
    pub date: Option<NaiveDate>,
    pub customer: Option<i64>,
    #[serde(rename = "includeNoBudget")]
    pub include_no_budget: Option<bool>,
}

pub async fn project_date_range(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    ApiQuery(params): ApiQuery<ReportParams>,
) -> ApiResult<Json<ProjectDateRangeReport>> {
    let report = execute_logged("reporting::project_date_range", "http", || {
        ctx.reporting.project_date_range(
            &user,
            params.date,
            params.customer,
            params.include_no_budget.unwrap_or(false),
        )
    })
    .await?;
    Ok(Json(report))
}
