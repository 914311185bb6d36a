//! User endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use kimai_core::user::actions::{user_view_actions, USER_VIEWS};
use kimai_domain::query::Visibility;
use kimai_domain::User;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::http::{ApiQuery, ApiResult, CurrentUser};
use crate::utils::execute_logged;

const SURFACE: &str = "http";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserListParams {
    /// 1 = enabled, 2 = disabled, 3 = both
    pub visible: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PageActions {
    pub view: &'static str,
    pub actions: Vec<&'static str>,
}

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    ApiQuery(params): ApiQuery<UserListParams>,
) -> ApiResult<Json<Vec<User>>> {
    let visibility = params.visible.and_then(Visibility::from_number).unwrap_or_default();
    let users =
        execute_logged("users::list", SURFACE, || ctx.users.list(&user, visibility)).await?;
    Ok(Json(users))
}

pub async fn me(user: CurrentUser) -> Json<User> {
    Json(user.0)
}

pub async fn get(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<User>> {
    let found = execute_logged("users::get", SURFACE, || ctx.users.get(&user, id)).await?;
    Ok(Json(found))
}

pub async fn actions(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<PageActions>> {
    let target = execute_logged("users::actions", SURFACE, || ctx.users.get(&user, id)).await?;
    Ok(Json(PageActions { view: USER_VIEWS, actions: user_view_actions(&user, &target) }))
}
