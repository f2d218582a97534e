use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::api::server::AppState;
use crate::db::models::{Crop, CropType, lenient_price};
use crate::error::{AppError, AppResult};
use crate::market::catalog::{self, Matches, NewCrop};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCropPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub crop_type: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub barter_for: Option<String>,
    // The browser form posts this instead of `barterFor`
    #[serde(default, rename = "exchange_for")]
    pub exchange_for: Option<String>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
}

#[derive(Serialize)]
pub struct AddCropResponse {
    pub message: String,
    pub crop: Crop,
}

impl AddCropPayload {
    fn into_new_crop(self) -> AppResult<NewCrop> {
        let missing =
            || AppError::InvalidInput("Crop name, type, and owner are required".to_string());

        let name = self.name.filter(|s| !s.is_empty()).ok_or_else(missing)?;
        let owner = self.owner.filter(|s| !s.is_empty()).ok_or_else(missing)?;
        let raw_type = self.crop_type.filter(|s| !s.is_empty()).ok_or_else(missing)?;

        let crop_type = CropType::parse(&raw_type).ok_or_else(|| {
            AppError::InvalidInput("Type must be 'Barter' or 'Resell'".to_string())
        })?;
        if raw_type != crop_type.as_str() {
            warn!("Listing type {:?} normalized to {}", raw_type, crop_type.as_str());
        }

        let barter_for = match (self.barter_for, self.exchange_for) {
            (Some(b), _) if !b.is_empty() => Some(b),
            (_, Some(e)) if !e.is_empty() => {
                warn!("Listing sent exchange_for {:?}, stored as barterFor", e);
                Some(e)
            }
            _ => None,
        };

        Ok(NewCrop {
            name,
            crop_type,
            owner,
            barter_for,
            price: self.price,
        })
    }
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AddCropPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let crop = catalog::add_crop(&state.db, payload.into_new_crop()?).await?;

    Ok(Json(AddCropResponse {
        message: "Crop added successfully".to_string(),
        crop,
    }))
}

pub async fn all(State(state): State<Arc<AppState>>) -> Json<Vec<Crop>> {
    Json(catalog::list_all(&state.db).await)
}

pub async fn barter(
    State(state): State<Arc<AppState>>,
    Path(crop_name): Path<String>,
) -> AppResult<Json<Vec<Crop>>> {
    match catalog::find_barter_matches(&state.db, &crop_name).await {
        Matches::Found(crops) => Ok(Json(crops)),
        Matches::NotFound => Err(AppError::NotFound("No matching barter crops found".to_string())),
    }
}

pub async fn resell(
    State(state): State<Arc<AppState>>,
    Path(crop_name): Path<String>,
) -> AppResult<Json<Vec<Crop>>> {
    match catalog::find_resell_matches(&state.db, &crop_name).await {
        Matches::Found(crops) => Ok(Json(crops)),
        Matches::NotFound => Err(AppError::NotFound("No crops available for sale".to_string())),
    }
}
