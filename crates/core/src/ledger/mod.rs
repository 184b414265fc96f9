use crate::domain::booking::{Booking, BookingId};
use crate::errors::DomainError;

/// Append-only record of the bookings made during this process.
///
/// Ids are assigned as `len + 1`, which is only sound while appends are
/// serialized; callers hold the ledger behind `&mut` to guarantee that.
#[derive(Clone, Debug, Default)]
pub struct BookingLedger {
    entries: Vec<Booking>,
}

impl BookingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> BookingId {
        BookingId(u32::try_from(self.entries.len()).unwrap_or(u32::MAX).saturating_add(1))
    }

    pub fn append(&mut self, booking: Booking) -> Result<&Booking, DomainError> {
        let expected = self.next_id();
        if booking.booking_id != expected {
            return Err(DomainError::InvariantViolation(format!(
                "booking id {} does not follow ledger sequence (expected {})",
                booking.booking_id.0, expected.0
            )));
        }

        self.entries.push(booking);
        let index = self.entries.len() - 1;
        Ok(&self.entries[index])
    }

    pub fn find(&self, booking_id: BookingId) -> Option<&Booking> {
        self.entries.iter().find(|booking| booking.booking_id == booking_id)
    }

    pub fn entries(&self) -> &[Booking] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::BookingLedger;
    use crate::domain::booking::{Booking, BookingId};
    use crate::errors::DomainError;

    fn booking(id: u32) -> Booking {
        Booking {
            booking_id: BookingId(id),
            hotel_name: "Budget Inn".to_string(),
            guest_name: "Bob".to_string(),
            check_in: NaiveDate::from_ymd_opt(2024, 7, 1).expect("valid date"),
            check_out: NaiveDate::from_ymd_opt(2024, 7, 2).expect("valid date"),
            num_guests: 1,
            nights: 1,
            total_price: Decimal::from(80),
        }
    }

    #[test]
    fn ids_start_at_one_and_follow_length() {
        let mut ledger = BookingLedger::new();
        assert_eq!(ledger.next_id(), BookingId(1));

        ledger.append(booking(1)).expect("first append");
        ledger.append(booking(2)).expect("second append");

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.next_id(), BookingId(3));
    }

    #[test]
    fn out_of_sequence_append_is_rejected_without_mutation() {
        let mut ledger = BookingLedger::new();
        let error = ledger.append(booking(5)).expect_err("id 5 is out of sequence");

        assert!(matches!(error, DomainError::InvariantViolation(_)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn find_returns_matching_entry() {
        let mut ledger = BookingLedger::new();
        ledger.append(booking(1)).expect("append");

        assert_eq!(ledger.find(BookingId(1)), Some(&booking(1)));
        assert!(ledger.find(BookingId(2)).is_none());
    }
}
