//! Krishi Mitr: a small crop marketplace.
//!
//! Farmers register, then list crops either for barter (in exchange for a
//! named crop) or for resale at a price. Everything lives in one JSON
//! document on disk, served over a JSON HTTP API.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod market;
