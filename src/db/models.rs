use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    // Plaintext, compared verbatim on login
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CropType {
    Barter,
    Resell,
}

impl CropType {
    /// Parses a listing type, ignoring case. The browser form sends
    /// `"barter"`/`"resell"` while stored listings use `"Barter"`/`"Resell"`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "barter" => Some(CropType::Barter),
            "resell" => Some(CropType::Resell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CropType::Barter => "Barter",
            CropType::Resell => "Resell",
        }
    }
}

// Files written by the browser-era backend hold whatever casing the form sent
impl<'de> Deserialize<'de> for CropType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        CropType::parse(&raw)
            .ok_or_else(|| de::Error::custom(format!("unknown listing type: {raw}")))
    }
}

/// Reads a price given as a number, a numeric string (what an HTML input
/// yields) or null. Non-finite values are refused since JSON cannot hold them.
pub fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let price = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(other) => return Err(de::Error::custom(format!("invalid price: {other}"))),
    };

    match price {
        Some(p) if p.is_finite() => Ok(Some(p)),
        _ => Err(de::Error::custom("invalid price")),
    }
}

/// A single listing. `barter_for` is set only for barter listings and
/// `price` only for resell listings; the other one is always `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub crop_type: CropType,
    pub owner: String,
    #[serde(default, alias = "exchange_for")]
    pub barter_for: Option<String>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub crop: String,
    pub category: String,
    pub msp: f64,
    pub market_price: f64,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// The whole persisted state. Every write replaces the entire file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Document {
    pub users: Vec<User>,
    pub crops: Vec<Crop>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_crop_id: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prices: Vec<PriceEntry>,
}

impl Document {
    pub fn find_user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    /// Hands out the next crop id and advances the counter.
    ///
    /// Files written before the counter existed fall back to the largest id
    /// already in the catalog, so ids never repeat.
    pub fn allocate_crop_id(&mut self) -> u64 {
        let highest = self.crops.iter().map(|c| c.id).max().unwrap_or(0);
        let next = self.next_crop_id.unwrap_or(1).max(highest + 1);
        self.next_crop_id = Some(next + 1);
        next
    }
}
