use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use kimai_domain::PluginOverview;

use crate::context::AppContext;
use crate::http::{ApiResult, CurrentUser};
use crate::utils::execute_logged;

/// Installed plugins and the marketplace entries not yet installed.
pub async fn plugins(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
) -> ApiResult<Json<PluginOverview>> {
    let overview =
        execute_logged("plugins::list", "http", || ctx.plugins.list_with_marketplace(&user))
            .await?;
    Ok(Json(overview))
}
