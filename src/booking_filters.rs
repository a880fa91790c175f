// Predicate filters over the merged bookings

use crate::models::{Booking, BookingStatus, PaymentStatus};
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingFilters {
    pub search: Option<String>,
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub hotel_id: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl BookingFilters {
    // Case-insensitive match on guest name, email, hotel name or room type
    fn matches_search(booking: &Booking, needle: &str) -> bool {
        [
            &booking.guest_name,
            &booking.guest_email,
            &booking.hotel_name,
            &booking.room_type,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        if !needle
            .as_deref()
            .map_or(true, |needle| Self::matches_search(booking, needle))
        {
            return false;
        }

        if !self.status.map_or(true, |status| booking.booking_status == status) {
            return false;
        }

        if !self
            .payment_status
            .map_or(true, |status| booking.payment_status == status)
        {
            return false;
        }

        if !self
            .hotel_id
            .as_ref()
            .map_or(true, |id| booking.hotel_id.as_ref() == Some(id))
        {
            return false;
        }

        if !self.date_from.map_or(true, |from| booking.check_in >= from) {
            return false;
        }

        self.date_to.map_or(true, |to| booking.check_in <= to)
    }

    pub fn apply(&self, bookings: &[Booking]) -> Vec<Booking> {
        bookings
            .iter()
            .filter(|booking| self.matches(booking))
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

struct Memo {
    filters: BookingFilters,
    generation: u64,
    result: Arc<Vec<Booking>>,
}

// Filtered view that only recomputes when the filters or the feed generation change
#[derive(Default)]
pub struct FilteredBookings {
    memo: Mutex<Option<Memo>>,
    recomputes: AtomicUsize,
}

impl FilteredBookings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, filters: &BookingFilters, generation: u64, source: &[Booking]) -> Arc<Vec<Booking>> {
        let mut memo = self.memo.lock();
        if let Some(cached) = memo.as_ref() {
            if cached.generation == generation && cached.filters == *filters {
                return Arc::clone(&cached.result);
            }
        }

        self.recomputes.fetch_add(1, Ordering::SeqCst);
        let result = Arc::new(filters.apply(source));
        *memo = Some(Memo {
            filters: filters.clone(),
            generation,
            result: Arc::clone(&result),
        });
        result
    }

    pub fn recompute_count(&self) -> usize {
        self.recomputes.load(Ordering::SeqCst)
    }
}
