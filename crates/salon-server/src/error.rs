use crate::identity::IdentityError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use salon_common::validation::ValidationError;
use serde_json::json;

/// Every failure a request can end in. Each variant has a stable
/// machine-readable kind; none are retried.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Authentication(#[from] IdentityError),
    /// Login or refresh rejected
    #[error("{0}")]
    Credentials(&'static str),
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Authorization(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Authentication(_) | ApiError::Credentials(_) => "authentication_error",
            ApiError::Authorization(_) => "authorization_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) | ApiError::Credentials(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(ValidationError::Invalid {
            field: "body",
            message: rejection.body_text(),
        })
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(ValidationError::Invalid {
            field: "path",
            message: rejection.body_text(),
        })
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(ValidationError::Invalid {
            field: "query",
            message: rejection.body_text(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(e) => tracing::error!("Internal error: {:#}", e),
            ApiError::Authentication(reason) => {
                tracing::debug!(?reason, "Rejected unauthenticated request")
            }
            _ => {}
        }
        (
            self.status(),
            Json(json!({"error": self.to_string(), "kind": self.kind()})),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_statuses() {
        let cases = [
            (
                ApiError::Validation(ValidationError::Missing("barber")),
                "validation_error",
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Authentication(IdentityError::MissingCredential),
                "authentication_error",
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::Credentials("Invalid credentials"),
                "authentication_error",
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::forbidden("nope"),
                "authorization_error",
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::not_found("Booking not found"),
                "not_found",
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Conflict("User already exists".to_string()),
                "conflict",
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Internal(anyhow::anyhow!("db down")),
                "internal",
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, kind, status) in cases {
            assert_eq!(err.kind(), kind);
            assert_eq!(err.status(), status);
        }
    }

    #[test]
    fn test_internal_error_hides_details() {
        let err = ApiError::Internal(anyhow::anyhow!("password=hunter2"));
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn test_validation_message_names_field() {
        let err = ApiError::from(ValidationError::Missing("phone"));
        assert_eq!(err.to_string(), "Missing required field: phone");
    }
}
