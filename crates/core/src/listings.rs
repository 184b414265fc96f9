//! Read-only browsing over a CSV export of hotel listings.
//!
//! The table carries `Hotel, City, Price_per_night, Rating, Link` columns.
//! Unlike catalog search, city matching here is a case-insensitive substring
//! test, and results are filtered by the total cost of the stay.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(rename = "Hotel")]
    pub hotel: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Price_per_night", serialize_with = "rust_decimal::serde::float::serialize")]
    pub price_per_night: Decimal,
    #[serde(rename = "Rating")]
    pub rating: f64,
    #[serde(rename = "Link")]
    pub link: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrowseQuery {
    pub city: String,
    pub nights: u32,
    pub budget: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BrowseMatch {
    #[serde(flatten)]
    pub listing: Listing,
    #[serde(rename = "Total_price", serialize_with = "rust_decimal::serde::float::serialize")]
    pub total_price: Decimal,
}

#[derive(Debug, Error)]
pub enum ListingsError {
    #[error("could not open listings file `{path}`: {source}")]
    Open { path: PathBuf, source: std::io::Error },
    #[error("could not parse listings: {0}")]
    Parse(#[from] csv::Error),
    #[error("invalid browse query: {0}")]
    InvalidQuery(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListingTable {
    listings: Vec<Listing>,
}

impl ListingTable {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    pub fn from_path(path: &Path) -> Result<Self, ListingsError> {
        let file = File::open(path)
            .map_err(|source| ListingsError::Open { path: path.to_path_buf(), source })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ListingsError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let listings = csv_reader.deserialize().collect::<Result<Vec<Listing>, _>>()?;
        Ok(Self { listings })
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn browse(&self, query: &BrowseQuery) -> Result<Vec<BrowseMatch>, ListingsError> {
        if query.nights == 0 {
            return Err(ListingsError::InvalidQuery("nights must be at least 1".to_string()));
        }

        let city = query.city.trim().to_lowercase();
        let nights = Decimal::from(query.nights);

        Ok(self
            .listings
            .iter()
            .filter(|listing| listing.city.to_lowercase().contains(&city))
            .map(|listing| BrowseMatch {
                listing: listing.clone(),
                total_price: listing.price_per_night * nights,
            })
            .filter(|candidate| candidate.total_price <= query.budget)
            .collect())
    }
}
