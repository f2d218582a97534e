use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::server::AppState;
use crate::error::AppResult;
use crate::market::registry;

#[derive(Deserialize)]
pub struct AuthPayload {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    registry::register(&state.db, &username, &password).await?;

    Ok(Json(AuthResponse {
        message: "User registered successfully".to_string(),
        username: None,
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    registry::login(&state.db, &username, &password).await?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        username: Some(username),
    }))
}
