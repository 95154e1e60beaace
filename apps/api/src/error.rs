//! Error types for the HTTP API.
//!
//! Every handler returns `Result<_, ApiError>`. The response body is always
//! `{ "code": "...", "error": "..." }`.
//!
//! | variant         | status |
//! |-----------------|--------|
//! | Validation      | 400    |
//! | Unauthenticated | 401    |
//! | Forbidden       | 403    |
//! | NotFound        | 404    |
//! | Conflict        | 409    |
//! | BusinessRule    | 422    |
//! | Gateway         | 502    |
//! | Internal        | 500    |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::gateway::GatewayError;
use mesa_core::{CoreError, ValidationError};
use mesa_db::DbError;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BusinessRule(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BusinessRule(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Gateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::BusinessRule(_) => "business_rule",
            ApiError::Gateway(_) => "gateway",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Internals are logged, never sent.
            ApiError::Internal(detail) => {
                error!(detail = %detail, "Request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            code: self.code(),
            error: message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::OrderNotFound(_) => ApiError::NotFound(err.to_string()),
            CoreError::Validation(inner) => inner.into(),
            CoreError::RegisterAlreadyOpen { .. } => ApiError::Conflict(err.to_string()),
            CoreError::InvalidOrderStatus { .. }
            | CoreError::EmptyOrder(_)
            | CoreError::OrderTooLarge { .. }
            | CoreError::InsufficientTender { .. }
            | CoreError::RegisterNotOpen => ApiError::BusinessRule(err.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. } | DbError::Conflict(_) => ApiError::Conflict(err.to_string()),
            DbError::ForeignKeyViolation { .. } => {
                ApiError::NotFound("Referenced restaurant or record does not exist".to_string())
            }
            DbError::Domain(core) => core.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::Gateway(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_statuses() {
        let not_open: ApiError = DbError::Domain(CoreError::RegisterNotOpen).into();
        assert_eq!(not_open.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let open: ApiError = CoreError::RegisterAlreadyOpen {
            opened_at: "2024-01-01T00:00:00Z".into(),
        }
        .into();
        assert_eq!(open.status(), StatusCode::CONFLICT);

        let missing: ApiError = ValidationError::required("restauranteId").into();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.to_string(), "restauranteId is required");
    }

    #[test]
    fn test_db_errors_map_to_statuses() {
        let dup: ApiError = DbError::duplicate("email", "a@b.com").into();
        assert_eq!(dup.status(), StatusCode::CONFLICT);

        let stale: ApiError = DbError::Conflict("Order o-1 is already paid".into()).into();
        assert_eq!(stale.status(), StatusCode::CONFLICT);

        let gone: ApiError = DbError::not_found("Order", "o-1").into();
        assert_eq!(gone.code(), "not_found");

        let broken: ApiError = DbError::QueryFailed("disk I/O error".into()).into();
        assert_eq!(broken.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
