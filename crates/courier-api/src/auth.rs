use std::sync::Arc;

use anyhow::anyhow;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};

use courier_core::{AuthService, Config, MessageService, NewUser, UserDirectory};
use courier_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub auth: AuthService,
    pub directory: UserDirectory,
    pub messages: MessageService,
    pub config: Config,
}

/// Register → stamp login → issue token. The created profile itself is not
/// echoed back; the token's `sub` is all a client needs.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let worker = state.clone();
    let username = tokio::task::spawn_blocking(move || {
        let profile = worker.auth.register(NewUser {
            username: &req.username,
            password: &req.password,
            first_name: &req.first_name,
            last_name: &req.last_name,
            phone: &req.phone,
        })?;
        worker.auth.touch_login(&profile.username)?;
        Ok::<_, ApiError>(profile.username)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow!("spawn_blocking join error: {}", e)))??;

    let token = create_token(&state.config.jwt_secret, &username)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { username, token }),
    ))
}

/// Verify credentials → stamp login → issue token. A false authenticate is a
/// 401, never a 404: the response must not reveal whether the user exists.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let worker = state.clone();
    let stamp = tokio::task::spawn_blocking(move || {
        if !worker.auth.authenticate(&req.username, &req.password)? {
            return Err(ApiError::Unauthorized);
        }
        Ok(worker.auth.touch_login(&req.username)?)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow!("spawn_blocking join error: {}", e)))??;

    let token = create_token(&state.config.jwt_secret, &stamp.username)?;

    Ok(Json(LoginResponse {
        username: stamp.username,
        token,
    }))
}

fn create_token(secret: &str, username: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow!("token signing: {}", e)))
}
