use anyhow::anyhow;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use courier_types::api::{Claims, SendMessageRequest};

use crate::auth::AppState;
use crate::error::ApiError;

/// The sender is always the authenticated caller; the request only names the
/// recipient.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let worker = state.clone();
    let message = tokio::task::spawn_blocking(move || {
        worker
            .messages
            .send(&claims.sub, &req.to_username, &req.body)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow!("spawn_blocking join error: {}", e)))??;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Visible to its two participants only.
pub async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let worker = state.clone();
    let message = tokio::task::spawn_blocking(move || {
        let message = worker.messages.get(id)?;
        if message.from_user.username != claims.sub && message.to_user.username != claims.sub {
            return Err(ApiError::Forbidden);
        }
        Ok(message)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow!("spawn_blocking join error: {}", e)))??;

    Ok(Json(message))
}

/// Only the recipient marks a message read; the stamp sticks on first use.
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let worker = state.clone();
    let receipt = tokio::task::spawn_blocking(move || {
        let message = worker.messages.get(id)?;
        if message.to_user.username != claims.sub {
            return Err(ApiError::Forbidden);
        }
        Ok(worker.messages.mark_read(id)?)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow!("spawn_blocking join error: {}", e)))??;

    Ok(Json(receipt))
}
