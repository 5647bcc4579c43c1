use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use courier_core::CoreError;

/// Transport-facing error: maps the core taxonomy onto HTTP statuses.
#[derive(Debug)]
pub enum ApiError {
    Core(CoreError),
    /// Bad credentials on login. Deliberately indistinguishable from an
    /// unknown username.
    Unauthorized,
    /// Authenticated, but not a participant of the addressed resource.
    Forbidden,
    Internal(anyhow::Error),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Core(core) => match core {
                CoreError::Validation { .. } => (StatusCode::BAD_REQUEST, core.to_string()),
                CoreError::DuplicateUser(_) => (StatusCode::CONFLICT, core.to_string()),
                CoreError::UserNotFound(_) | CoreError::MessageNotFound(_) => {
                    (StatusCode::NOT_FOUND, core.to_string())
                }
                CoreError::Store(err) => {
                    error!("Store failure: {:#}", err);
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
                }
            },
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "invalid user/password".into()),
            Self::Forbidden => (StatusCode::FORBIDDEN, "not your resource".into()),
            Self::Internal(err) => {
                error!("Internal error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
