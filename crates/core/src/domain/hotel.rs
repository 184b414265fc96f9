use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HotelId(pub u32);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: HotelId,
    pub name: String,
    pub location: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_night: Decimal,
    pub rating: f64,
    pub amenities: Vec<String>,
}

impl Hotel {
    /// Exact, case-insensitive location match. Surrounding whitespace in the
    /// query is ignored.
    pub fn is_located_in(&self, location: &str) -> bool {
        normalize_location(&self.location) == normalize_location(location)
    }
}

fn normalize_location(location: &str) -> String {
    location.trim().to_lowercase()
}
