use tracing::{debug, info};

use crate::db::models::{Crop, CropType};
use crate::db::repo::Database;
use crate::error::{AppError, AppResult};

/// A validated listing request.
#[derive(Debug, Clone)]
pub struct NewCrop {
    pub name: String,
    pub crop_type: CropType,
    pub owner: String,
    pub barter_for: Option<String>,
    pub price: Option<f64>,
}

/// Outcome of a catalog search. An empty search is reported separately
/// from a successful one so the HTTP layer can answer 404.
#[derive(Debug, Clone, PartialEq)]
pub enum Matches {
    Found(Vec<Crop>),
    NotFound,
}

impl Matches {
    fn from_vec(crops: Vec<Crop>) -> Self {
        if crops.is_empty() {
            Matches::NotFound
        } else {
            Matches::Found(crops)
        }
    }
}

pub async fn add_crop(db: &Database, new: NewCrop) -> AppResult<Crop> {
    if new.name.is_empty() || new.owner.is_empty() {
        return Err(AppError::InvalidInput(
            "Crop name, type, and owner are required".to_string(),
        ));
    }

    let crop = db
        .update(|doc| {
            let (barter_for, price) = match new.crop_type {
                CropType::Barter => (new.barter_for, None),
                CropType::Resell => (None, new.price),
            };
            let crop = Crop {
                id: doc.allocate_crop_id(),
                name: new.name,
                crop_type: new.crop_type,
                owner: new.owner,
                barter_for,
                price,
            };
            doc.crops.push(crop.clone());
            Ok::<_, AppError>(crop)
        })
        .await?;

    info!(
        "Listed crop #{} {} ({}) for {}",
        crop.id,
        crop.name,
        crop.crop_type.as_str(),
        crop.owner
    );
    Ok(crop)
}

pub async fn list_all(db: &Database) -> Vec<Crop> {
    db.read(|doc| doc.crops.clone()).await
}

/// Barter listings asking for `target`, compared without case.
pub async fn find_barter_matches(db: &Database, target: &str) -> Matches {
    let target = target.to_lowercase();
    let found = db
        .read(|doc| {
            doc.crops
                .iter()
                .filter(|c| c.crop_type == CropType::Barter)
                .filter(|c| {
                    c.barter_for
                        .as_deref()
                        .is_some_and(|want| want.to_lowercase() == target)
                })
                .cloned()
                .collect::<Vec<_>>()
        })
        .await;

    debug!("Barter search for {:?} matched {}", target, found.len());
    Matches::from_vec(found)
}

/// Resell listings of the crop named `target`, compared without case.
pub async fn find_resell_matches(db: &Database, target: &str) -> Matches {
    let target = target.to_lowercase();
    let found = db
        .read(|doc| {
            doc.crops
                .iter()
                .filter(|c| c.crop_type == CropType::Resell && c.name.to_lowercase() == target)
                .cloned()
                .collect::<Vec<_>>()
        })
        .await;

    debug!("Resell search for {:?} matched {}", target, found.len());
    Matches::from_vec(found)
}
