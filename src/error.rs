use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum FleetError {
    #[error("database file {path} cannot be opened or created: {source}")]
    StoreUnreachable {
        path: PathBuf,
        #[source]
        source: SqlxError,
    },

    #[error("port already in use: {0}")]
    PortInUse(SocketAddr),

    #[error("invalid username or password")]
    AuthenticationFailure,

    #[error("login required")]
    Unauthenticated,

    #[error("administrator role required")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("password hashing error: {0}")]
    PasswordHash(String),

    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<argon2::password_hash::Error> for FleetError {
    fn from(e: argon2::password_hash::Error) -> Self {
        FleetError::PasswordHash(e.to_string())
    }
}

impl IntoResponse for FleetError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            FleetError::AuthenticationFailure => (
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_FAILED",
                self.to_string(),
            ),
            FleetError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string())
            }
            FleetError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", self.to_string()),
            FleetError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            FleetError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT", self.to_string()),
            FleetError::Validation(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_FAILED",
                self.to_string(),
            ),
            FleetError::StoreUnreachable { .. }
            | FleetError::PortInUse(_)
            | FleetError::DatabaseError(_)
            | FleetError::Io(_)
            | FleetError::Csv(_)
            | FleetError::PasswordHash(_)
            | FleetError::Config(_)
            | FleetError::InvalidConfig(_) => {
                tracing::error!(error = %self, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred.".to_string(),
                )
            }
        };
        let body = ApiErrorBody {
            code: code.to_string(),
            message,
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
