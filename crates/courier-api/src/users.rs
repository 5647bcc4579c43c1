use anyhow::anyhow;
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use courier_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn list_users(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let worker = state.clone();
    let users = tokio::task::spawn_blocking(move || worker.directory.all())
        .await
        .map_err(|e| ApiError::Internal(anyhow!("spawn_blocking join error: {}", e)))??;

    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let worker = state.clone();
    let profile = tokio::task::spawn_blocking(move || worker.directory.get(&username))
        .await
        .map_err(|e| ApiError::Internal(anyhow!("spawn_blocking join error: {}", e)))??;

    Ok(Json(profile))
}

/// Outbox. Only the user themself may read it.
pub async fn messages_from(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.sub != username {
        return Err(ApiError::Forbidden);
    }

    let worker = state.clone();
    let messages = tokio::task::spawn_blocking(move || worker.directory.messages_from(&username))
        .await
        .map_err(|e| ApiError::Internal(anyhow!("spawn_blocking join error: {}", e)))??;

    Ok(Json(messages))
}

/// Inbox. Only the user themself may read it.
pub async fn messages_to(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.sub != username {
        return Err(ApiError::Forbidden);
    }

    let worker = state.clone();
    let messages = tokio::task::spawn_blocking(move || worker.directory.messages_to(&username))
        .await
        .map_err(|e| ApiError::Internal(anyhow!("spawn_blocking join error: {}", e)))??;

    Ok(Json(messages))
}
