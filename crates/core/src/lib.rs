pub mod catalog;
pub mod config;
pub mod desk;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod listings;

pub use catalog::{Catalog, SearchCriteria};
pub use desk::{BookingDesk, BookingRequest, BookingRules};
pub use domain::booking::{Booking, BookingId, BookingOutcome};
pub use domain::hotel::{Hotel, HotelId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use ledger::BookingLedger;
pub use listings::{BrowseMatch, BrowseQuery, Listing, ListingTable, ListingsError};
