//! Command execution helpers
//!
//! Every HTTP handler and CLI command runs through [`execute_logged`] so that
//! timing and outcome are logged the same way on both surfaces.

use std::future::Future;
use std::time::Instant;

use kimai_domain::Result as DomainResult;
use tracing::debug;

use crate::utils::logging::{error_label, log_command_execution};

/// Execute a command and log its duration and outcome.
///
/// # Example
///
/// ```rust,ignore
/// pub async fn get(ctx: State<Arc<AppContext>>, user: CurrentUser, Path(id): Path<i64>)
///     -> ApiResult<Json<Timesheet>>
/// {
///     let sheet = execute_logged("timesheets::get", "http", || async {
///         ctx.timesheets.get(&user, id).await
///     })
///     .await?;
///     Ok(Json(sheet))
/// }
/// ```
pub async fn execute_logged<F, Fut, T>(
    command_name: &str,
    implementation: &str,
    command_fn: F,
) -> DomainResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();

    let result = command_fn().await;

    if let Err(err) = &result {
        debug!(command = command_name, error_type = error_label(err), error = %err, "command failed");
    }
    log_command_execution(command_name, implementation, start.elapsed(), result.is_ok());

    result
}

#[cfg(test)]
mod tests {
    use kimai_domain::KimaiError;

    use super::*;

    #[tokio::test]
    async fn passes_result_through() {
        let ok = execute_logged("test::ok", "cli", || async { Ok(42) }).await;
        assert_eq!(ok, Ok(42));

        let err: DomainResult<()> = execute_logged("test::err", "cli", || async {
            Err(KimaiError::InvalidInput("nope".into()))
        })
        .await;
        assert_eq!(err, Err(KimaiError::InvalidInput("nope".into())));
    }
}
