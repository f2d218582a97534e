use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::server::AppState;
use crate::db::models::PriceEntry;
use crate::error::{AppError, AppResult};
use crate::market::pricing;

#[derive(Deserialize)]
pub struct PricesPayload {
    #[serde(default)]
    pub prices: Option<Vec<PriceEntry>>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn all(State(state): State<Arc<AppState>>) -> Json<Vec<PriceEntry>> {
    Json(pricing::list_prices(&state.db).await)
}

pub async fn by_crop(
    State(state): State<Arc<AppState>>,
    Path(crop_name): Path<String>,
) -> AppResult<Json<PriceEntry>> {
    Ok(Json(pricing::find_price(&state.db, &crop_name).await?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PricesPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let prices = payload
        .prices
        .ok_or_else(|| AppError::InvalidInput("Prices data required".to_string()))?;

    pricing::replace_prices(&state.db, prices).await?;

    Ok(Json(MessageResponse {
        message: "Prices updated successfully".to_string(),
    }))
}
