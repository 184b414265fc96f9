use std::path::PathBuf;

use rust_decimal::Decimal;
use stayfinder_core::config::AppConfig;
use stayfinder_core::{BrowseMatch, BrowseQuery, ListingTable, ListingsError};
use tracing::{debug, warn};

use crate::commands::{load_options, CommandResult};
use crate::init_logging;

#[derive(Clone, Debug)]
pub struct BrowseArgs {
    pub file: Option<PathBuf>,
    pub city: String,
    pub nights: u32,
    pub budget: Decimal,
    pub json: bool,
}

pub fn run(config_path: Option<PathBuf>, args: BrowseArgs) -> CommandResult {
    // Browsing needs no credentials, so an invalid config falls back to defaults.
    let loaded = AppConfig::load(load_options(config_path));
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(&config.logging);
    if let Err(error) = &loaded {
        warn!(
            event_name = "browse.config.unavailable",
            error = %error,
            "falling back to default browse settings"
        );
    }

    let path = args.file.clone().unwrap_or_else(|| config.browse.listings_path.clone());
    let query = BrowseQuery { city: args.city.clone(), nights: args.nights, budget: args.budget };

    let table = match ListingTable::from_path(&path) {
        Ok(table) => table,
        Err(error) => return listings_failure(error),
    };
    debug!(
        event_name = "browse.listings.loaded",
        path = %path.display(),
        listings = table.len(),
        "listings loaded"
    );

    match table.browse(&query) {
        Ok(matches) if args.json => render_json(&matches),
        Ok(matches) => CommandResult::text(render_table(&query, &matches)),
        Err(error) => listings_failure(error),
    }
}

fn listings_failure(error: ListingsError) -> CommandResult {
    let (error_class, exit_code) = match &error {
        ListingsError::InvalidQuery(_) => ("invalid_query", 2),
        ListingsError::Open { .. } => ("listings_unavailable", 3),
        ListingsError::Parse(_) => ("listings_parse", 3),
    };
    CommandResult::failure("browse", error_class, error.to_string(), exit_code)
}

fn render_json(matches: &[BrowseMatch]) -> CommandResult {
    match serde_json::to_string_pretty(matches) {
        Ok(output) => CommandResult::text(output),
        Err(error) => CommandResult::failure("browse", "serialization", error.to_string(), 1),
    }
}

pub fn render_table(query: &BrowseQuery, matches: &[BrowseMatch]) -> String {
    if matches.is_empty() {
        return format!(
            "No hotels found in '{}' within a budget of ${} for {} night(s).",
            query.city.trim(),
            query.budget.normalize(),
            query.nights
        );
    }

    let mut lines = vec![format!(
        "{} hotel(s) in '{}' for {} night(s) within ${}:",
        matches.len(),
        query.city.trim(),
        query.nights,
        query.budget.normalize()
    )];
    for candidate in matches {
        let listing = &candidate.listing;
        lines.push(format!(
            "- {} ({}) | ${}/night | rating {} | total ${} | {}",
            listing.hotel,
            listing.city,
            listing.price_per_night.normalize(),
            listing.rating,
            candidate.total_price.normalize(),
            listing.link
        ));
    }
    lines.join("\n")
}
