use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::catalog::{Catalog, SearchCriteria};
use crate::domain::booking::{
    Booking, BookingId, BookingOutcome, BOOKING_NOT_FOUND, HOTEL_NOT_FOUND,
};
use crate::domain::hotel::{Hotel, HotelId};
use crate::errors::DomainError;
use crate::ledger::BookingLedger;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BookingRules {
    /// Reject stays whose check-out is not after check-in. Off by default,
    /// in which case zero or negative night counts are booked as-is.
    pub require_positive_stay: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingRequest {
    pub hotel_id: HotelId,
    pub guest_name: String,
    pub check_in: String,
    pub check_out: String,
    pub num_guests: u32,
}

/// Owns the catalog and the booking ledger and exposes the three
/// operations the assistant can invoke.
#[derive(Clone, Debug, Default)]
pub struct BookingDesk {
    catalog: Catalog,
    ledger: BookingLedger,
    rules: BookingRules,
}

impl BookingDesk {
    pub fn new(catalog: Catalog, rules: BookingRules) -> Self {
        Self { catalog, ledger: BookingLedger::new(), rules }
    }

    pub fn seeded() -> Self {
        Self::new(Catalog::seeded(), BookingRules::default())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &BookingLedger {
        &self.ledger
    }

    pub fn rules(&self) -> BookingRules {
        self.rules
    }

    pub fn search(&self, criteria: &SearchCriteria) -> Vec<Hotel> {
        self.catalog.search(criteria)
    }

    /// Books a stay. An unknown hotel is a failure outcome, while malformed
    /// input is an error; neither touches the ledger.
    pub fn book(&mut self, request: BookingRequest) -> Result<BookingOutcome, DomainError> {
        let Some(hotel) = self.catalog.find(request.hotel_id) else {
            return Ok(BookingOutcome::failure(HOTEL_NOT_FOUND));
        };

        let check_in = parse_stay_date("check_in", &request.check_in)?;
        let check_out = parse_stay_date("check_out", &request.check_out)?;
        if request.num_guests == 0 {
            return Err(DomainError::InvalidGuestCount);
        }

        let nights = (check_out - check_in).num_days();
        if self.rules.require_positive_stay && nights <= 0 {
            return Err(DomainError::NonPositiveStay { check_in, check_out });
        }

        let booking = Booking {
            booking_id: self.ledger.next_id(),
            hotel_name: hotel.name.clone(),
            guest_name: request.guest_name,
            check_in,
            check_out,
            num_guests: request.num_guests,
            nights,
            total_price: hotel.price_per_night * Decimal::from(nights),
        };

        let stored = self.ledger.append(booking)?;
        Ok(BookingOutcome::confirmed(stored.clone()))
    }

    pub fn get_booking(&self, booking_id: BookingId) -> BookingOutcome {
        match self.ledger.find(booking_id) {
            Some(booking) => BookingOutcome::found(booking.clone()),
            None => BookingOutcome::failure(BOOKING_NOT_FOUND),
        }
    }
}

pub fn parse_stay_date(field: &'static str, raw: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| DomainError::MalformedDate { field, value: raw.to_string() })
}
