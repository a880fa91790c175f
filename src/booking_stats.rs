// Dashboard statistics over a set of bookings

use crate::models::{Booking, BookingStatus, BookingType};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookingStats {
    pub total_bookings: usize,
    pub total_revenue: f64,
    pub average_booking_value: f64,
    pub by_status: BTreeMap<BookingStatus, usize>,
    pub by_type: BTreeMap<BookingType, usize>,
    pub by_service: BTreeMap<String, usize>,
    pub by_room_type: BTreeMap<String, usize>,
    // Keyed by YYYY-MM of the creation time
    pub bookings_by_month: BTreeMap<String, usize>,
    pub revenue_by_month: BTreeMap<String, f64>,
    // Share of bookings that are confirmed or completed
    pub occupancy_rate: f64,
}

impl BookingStats {
    pub fn compute(bookings: &[Booking]) -> Self {
        let mut stats = BookingStats::default();
        let mut occupied = 0usize;

        for booking in bookings {
            stats.total_bookings += 1;
            stats.total_revenue += booking.total_price;

            *stats.by_status.entry(booking.booking_status).or_insert(0) += 1;
            *stats.by_type.entry(booking.booking_type).or_insert(0) += 1;
            *stats.by_service.entry(booking.hotel_name.clone()).or_insert(0) += 1;
            *stats.by_room_type.entry(booking.room_type.clone()).or_insert(0) += 1;

            let month = booking.created_at.format("%Y-%m").to_string();
            *stats.bookings_by_month.entry(month.clone()).or_insert(0) += 1;
            *stats.revenue_by_month.entry(month).or_insert(0.0) += booking.total_price;

            if matches!(
                booking.booking_status,
                BookingStatus::Confirmed | BookingStatus::Completed
            ) {
                occupied += 1;
            }
        }

        if stats.total_bookings > 0 {
            stats.average_booking_value = stats.total_revenue / stats.total_bookings as f64;
            stats.occupancy_rate = occupied as f64 / stats.total_bookings as f64;
        }
        stats
    }

    pub fn count_with_status(&self, status: BookingStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}
