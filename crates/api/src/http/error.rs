//! JSON error responses

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kimai_domain::KimaiError;
use serde::Serialize;

use crate::utils::error_label;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Wraps a domain error so it can be returned from handlers.
#[derive(Debug)]
pub struct ApiError(pub KimaiError);

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: u16,
    message: &'a str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            KimaiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            KimaiError::Auth(_) => StatusCode::UNAUTHORIZED,
            KimaiError::AccessDenied(_) => StatusCode::FORBIDDEN,
            KimaiError::NotFound(_) => StatusCode::NOT_FOUND,
            KimaiError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<KimaiError> for ApiError {
    fn from(err: KimaiError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(KimaiError::InvalidInput(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(KimaiError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error_type = error_label(&self.0), error = %self.0, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "request rejected");
        }

        let body = ErrorBody { code: status.as_u16(), message: self.0.message() };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status() {
        let cases = [
            (KimaiError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (KimaiError::Auth("x".into()), StatusCode::UNAUTHORIZED),
            (KimaiError::AccessDenied("x".into()), StatusCode::FORBIDDEN),
            (KimaiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (KimaiError::Conflict("x".into()), StatusCode::CONFLICT),
            (KimaiError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }
}
