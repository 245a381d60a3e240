use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mxvault_core::CoreError;
use mxvault_engine::EngineError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`EngineError`] for domain errors and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce consistent
/// JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `mxvault_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A versioning-engine error from `mxvault_engine`.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A resource that could not be found, with a human-readable message.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Engine(engine) => classify_engine_error(engine),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a core error into an HTTP status, error code, and message.
fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::InvalidPageCount(msg) => {
            (StatusCode::BAD_REQUEST, "INVALID_PAGE_COUNT", msg.clone())
        }
        CoreError::InvalidPageNames(msg) => {
            (StatusCode::BAD_REQUEST, "INVALID_PAGE_NAMES", msg.clone())
        }
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Classify an engine error into an HTTP status, error code, and message.
///
/// Chain-integrity failures keep their full message in the response: the
/// failing version id and partial chain are what make a corrupted store
/// diagnosable from the client side.
fn classify_engine_error(err: &EngineError) -> (StatusCode, &'static str, String) {
    match err {
        EngineError::VersionNotFound { version_id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("Version with id {version_id} not found"),
        ),
        EngineError::ChainBroken { .. } => {
            tracing::error!(error = %err, "Broken version chain");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CHAIN_BROKEN",
                err.to_string(),
            )
        }
        EngineError::PatchMismatch { .. } => {
            tracing::error!(error = %err, "Patch mismatch during materialization");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PATCH_MISMATCH",
                err.to_string(),
            )
        }
        EngineError::ChainTooLong { .. } => {
            tracing::error!(error = %err, "Version chain exceeded the safety bound");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CHAIN_TOO_LONG",
                err.to_string(),
            )
        }
        EngineError::Cancelled => (
            StatusCode::REQUEST_TIMEOUT,
            "CANCELLED",
            "The operation was cancelled".to_string(),
        ),
        EngineError::Core(core) => classify_core_error(core),
        EngineError::Store(store) => {
            tracing::error!(error = %store, "Version store error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
