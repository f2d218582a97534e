use tracing::info;

use crate::db::models::PriceEntry;
use crate::db::repo::Database;
use crate::error::{AppError, AppResult};

pub async fn list_prices(db: &Database) -> Vec<PriceEntry> {
    db.read(|doc| doc.prices.clone()).await
}

pub async fn find_price(db: &Database, crop: &str) -> AppResult<PriceEntry> {
    let crop = crop.to_lowercase();
    db.read(|doc| {
        doc.prices
            .iter()
            .find(|p| p.crop.to_lowercase() == crop)
            .cloned()
    })
    .await
    .ok_or_else(|| AppError::NotFound("Price not found".to_string()))
}

/// Replaces the whole price table.
pub async fn replace_prices(db: &Database, prices: Vec<PriceEntry>) -> AppResult<()> {
    let count = prices.len();
    db.update(|doc| {
        doc.prices = prices;
        Ok::<_, AppError>(())
    })
    .await?;

    info!("Price table replaced with {} entries", count);
    Ok(())
}
