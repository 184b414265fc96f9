use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const HOTEL_NOT_FOUND: &str = "Hotel not found";
pub const BOOKING_NOT_FOUND: &str = "Booking not found";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookingId(pub u32);

/// A confirmed stay. The hotel name and total are copied at booking time and
/// never re-read from the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: BookingId,
    pub hotel_name: String,
    pub guest_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_guests: u32,
    pub nights: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

/// Result value of the booking and lookup operations. Missing hotels and
/// bookings are reported here rather than as errors so the agent can relay
/// them conversationally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookingOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking: Option<Booking>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BookingOutcome {
    pub fn confirmed(booking: Booking) -> Self {
        let message = format!("Booking confirmed! Total: ${}", booking.total_price.normalize());
        Self { success: true, booking: Some(booking), message: Some(message) }
    }

    pub fn found(booking: Booking) -> Self {
        Self { success: true, booking: Some(booking), message: None }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, booking: None, message: Some(message.into()) }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}
