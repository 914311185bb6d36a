//! Statistic endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use kimai_core::access::require;
use kimai_domain::query::Visibility;
use kimai_domain::utils::date::{end_of_day, month_bounds, start_of_day};
use kimai_domain::utils::duration;
use kimai_domain::{
    DailyStatistic, KimaiError, MonthlyStatistic, Permission, Result, User, UserDayGrouping,
};
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::http::{ApiQuery, ApiResult, CurrentUser};
use crate::utils::execute_logged;

const SURFACE: &str = "http";

/// Date range in local days of the current user; `user` is an id or `all`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatisticParams {
    pub begin: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub user: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DurationToday {
    pub seconds: i64,
    pub formatted: String,
}

impl StatisticParams {
    fn range(&self, ctx: &AppContext, actor: &User) -> (DateTime<Utc>, DateTime<Utc>) {
        let tz = actor.tz();
        let today = ctx.clock.now().with_timezone(&tz).date_naive();
        let (first, last) = month_bounds(today);
        let begin = self.begin.unwrap_or(first);
        let end = self.end.unwrap_or(last);
        (start_of_day(begin, tz), end_of_day(end, tz))
    }

    async fn users(&self, ctx: &AppContext, actor: &User) -> Result<Vec<User>> {
        match self.user.as_deref().map(str::trim) {
            None | Some("") => Ok(vec![actor.clone()]),
            Some("all") => {
                require(actor, Permission::ViewOtherTimesheet)?;
                ctx.users.list(actor, Visibility::Visible).await
            }
            Some(id) => {
                let id: i64 =
                    id.parse().map_err(|_| KimaiError::InvalidInput(format!("Invalid user: {id}")))?;
                if id == actor.id {
                    return Ok(vec![actor.clone()]);
                }
                require(actor, Permission::ViewOtherTimesheet)?;
                Ok(vec![ctx.users.get(actor, id).await?])
            }
        }
    }
}

pub async fn daily(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    ApiQuery(params): ApiQuery<StatisticParams>,
) -> ApiResult<Json<Vec<DailyStatistic>>> {
    let stats = execute_logged("statistics::daily", SURFACE, || async {
        let users = params.users(&ctx, &user).await?;
        let (begin, end) = params.range(&ctx, &user);
        ctx.statistics.get_daily_statistics(begin, end, &users).await
    })
    .await?;
    Ok(Json(stats))
}

pub async fn monthly(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    ApiQuery(params): ApiQuery<StatisticParams>,
) -> ApiResult<Json<Vec<MonthlyStatistic>>> {
    let stats = execute_logged("statistics::monthly", SURFACE, || async {
        let users = params.users(&ctx, &user).await?;
        let (begin, end) = params.range(&ctx, &user);
        ctx.statistics.get_monthly_statistics(begin, end, &users).await
    })
    .await?;
    Ok(Json(stats))
}

pub async fn grouped(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    ApiQuery(params): ApiQuery<StatisticParams>,
) -> ApiResult<Json<Vec<UserDayGrouping>>> {
    let stats = execute_logged("statistics::grouped", SURFACE, || async {
        let users = params.users(&ctx, &user).await?;
        let (begin, end) = params.range(&ctx, &user);
        ctx.statistics.get_daily_statistics_grouped(begin, end, &users).await
    })
    .await?;
    Ok(Json(stats))
}

/// Working time of the current user today, formatted for the widget.
pub async fn duration_today(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
) -> ApiResult<Json<DurationToday>> {
    let seconds = execute_logged("statistics::duration_today", SURFACE, || {
        ctx.timesheets.user_duration_today(&user)
    })
    .await?;
    let formatted = duration::format_with_pattern(Some(seconds), &ctx.config.locale.duration_pattern)
        .unwrap_or_default();
    Ok(Json(DurationToday { seconds, formatted }))
}
