use rust_decimal::Decimal;

use crate::domain::hotel::{Hotel, HotelId};

/// Filters for a catalog search. All supplied filters must hold.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchCriteria {
    pub location: String,
    pub max_price: Option<Decimal>,
    pub min_rating: Option<f64>,
}

impl SearchCriteria {
    pub fn in_location(location: impl Into<String>) -> Self {
        Self { location: location.into(), ..Self::default() }
    }

    pub fn with_max_price(mut self, max_price: Decimal) -> Self {
        self.max_price = Some(max_price);
        self
    }

    pub fn with_min_rating(mut self, min_rating: f64) -> Self {
        self.min_rating = Some(min_rating);
        self
    }

    pub fn matches(&self, hotel: &Hotel) -> bool {
        hotel.is_located_in(&self.location)
            && self.max_price.map_or(true, |max_price| hotel.price_per_night <= max_price)
            && self.min_rating.map_or(true, |min_rating| hotel.rating >= min_rating)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    hotels: Vec<Hotel>,
}

impl Catalog {
    pub fn new(hotels: Vec<Hotel>) -> Self {
        Self { hotels }
    }

    /// The fixed demo catalog.
    pub fn seeded() -> Self {
        Self::new(seed_hotels())
    }

    pub fn hotels(&self) -> &[Hotel] {
        &self.hotels
    }

    pub fn find(&self, hotel_id: HotelId) -> Option<&Hotel> {
        self.hotels.iter().find(|hotel| hotel.id == hotel_id)
    }

    pub fn search(&self, criteria: &SearchCriteria) -> Vec<Hotel> {
        self.hotels.iter().filter(|hotel| criteria.matches(hotel)).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.hotels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotels.is_empty()
    }
}

fn seed_hotels() -> Vec<Hotel> {
    vec![
        seed_hotel(1, "Grand Plaza Hotel", "New York", 250, 4.5, &["WiFi", "Pool", "Gym", "Restaurant"]),
        seed_hotel(2, "Seaside Resort", "Miami", 180, 4.2, &["WiFi", "Beach Access", "Spa"]),
        seed_hotel(3, "Budget Inn", "New York", 80, 3.8, &["WiFi", "Parking"]),
        seed_hotel(
            4,
            "Luxury Suites",
            "Los Angeles",
            350,
            4.8,
            &["WiFi", "Pool", "Gym", "Spa", "Restaurant", "Room Service"],
        ),
    ]
}

fn seed_hotel(
    id: u32,
    name: &str,
    location: &str,
    price_per_night: i64,
    rating: f64,
    amenities: &[&str],
) -> Hotel {
    Hotel {
        id: HotelId(id),
        name: name.to_string(),
        location: location.to_string(),
        price_per_night: Decimal::from(price_per_night),
        rating,
        amenities: amenities.iter().map(|amenity| (*amenity).to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Catalog, SearchCriteria};
    use crate::domain::hotel::HotelId;

    fn names(catalog: &Catalog, criteria: &SearchCriteria) -> Vec<String> {
        catalog.search(criteria).into_iter().map(|hotel| hotel.name).collect()
    }

    #[test]
    fn seeded_catalog_has_four_unique_hotels() {
        let catalog = Catalog::seeded();
        assert_eq!(catalog.len(), 4);

        let mut ids = catalog.hotels().iter().map(|hotel| hotel.id).collect::<Vec<_>>();
        ids.dedup();
        assert_eq!(ids, vec![HotelId(1), HotelId(2), HotelId(3), HotelId(4)]);
        assert!(catalog.hotels().iter().all(|hotel| (0.0..=5.0).contains(&hotel.rating)));
    }

    #[test]
    fn new_york_search_returns_both_new_york_hotels() {
        let catalog = Catalog::seeded();
        assert_eq!(
            names(&catalog, &SearchCriteria::in_location("New York")),
            vec!["Grand Plaza Hotel".to_string(), "Budget Inn".to_string()]
        );
    }

    #[test]
    fn price_cap_keeps_only_affordable_hotels() {
        let catalog = Catalog::seeded();
        let criteria = SearchCriteria::in_location("New York").with_max_price(Decimal::from(100));
        assert_eq!(names(&catalog, &criteria), vec!["Budget Inn".to_string()]);
    }

    #[test]
    fn price_cap_is_inclusive() {
        let catalog = Catalog::seeded();
        let criteria = SearchCriteria::in_location("new york").with_max_price(Decimal::from(80));
        assert_eq!(names(&catalog, &criteria), vec!["Budget Inn".to_string()]);
    }

    #[test]
    fn rating_floor_is_inclusive() {
        let catalog = Catalog::seeded();
        let criteria = SearchCriteria::in_location("New York").with_min_rating(4.5);
        assert_eq!(names(&catalog, &criteria), vec!["Grand Plaza Hotel".to_string()]);

        let above = SearchCriteria::in_location("New York").with_min_rating(4.6);
        assert!(catalog.search(&above).is_empty());
    }

    #[test]
    fn rating_floor_composes_with_location() {
        let catalog = Catalog::seeded();
        let criteria = SearchCriteria::in_location("NEW YORK").with_min_rating(4.0);
        assert_eq!(names(&catalog, &criteria), vec!["Grand Plaza Hotel".to_string()]);

        let none = SearchCriteria::in_location("New York")
            .with_max_price(Decimal::from(100))
            .with_min_rating(4.0);
        assert!(catalog.search(&none).is_empty());
    }

    #[test]
    fn unknown_location_yields_empty_result() {
        let catalog = Catalog::seeded();
        assert!(catalog.search(&SearchCriteria::in_location("Paris")).is_empty());
        assert!(catalog.search(&SearchCriteria::in_location("York")).is_empty());
    }

    #[test]
    fn every_hotel_is_found_by_its_own_location() {
        let catalog = Catalog::seeded();
        for hotel in catalog.hotels() {
            let results = catalog.search(&SearchCriteria::in_location(hotel.location.clone()));
            assert!(results.contains(hotel), "{} missing from its location search", hotel.name);
        }
    }

    #[test]
    fn every_result_respects_the_price_cap() {
        let catalog = Catalog::seeded();
        for cap in [0, 79, 80, 81, 180, 250, 349, 350, 1_000] {
            let max_price = Decimal::from(cap);
            for location in ["New York", "Miami", "Los Angeles"] {
                let criteria = SearchCriteria::in_location(location).with_max_price(max_price);
                assert!(catalog
                    .search(&criteria)
                    .iter()
                    .all(|hotel| hotel.price_per_night <= max_price));
            }
        }
    }

    #[test]
    fn find_matches_exact_id_only() {
        let catalog = Catalog::seeded();
        assert_eq!(catalog.find(HotelId(2)).map(|hotel| hotel.name.as_str()), Some("Seaside Resort"));
        assert!(catalog.find(HotelId(99)).is_none());
    }
}
