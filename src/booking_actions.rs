// Booking mutations: every action writes, refetches the feed, then notifies

use crate::backend::{Backend, BackendExt, Query};
use crate::booking_feed::{BookingFeed, HOTEL_BOOKING_COLUMNS};
use crate::error::OperationError;
use crate::models::{tables, Booking, BookingStatus, BookingType, HotelBookingRow, NewHotelBooking, PaymentStatus};
use crate::notify::{announce, Notifier};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

pub struct BookingActions<B: Backend + ?Sized, N: Notifier + ?Sized> {
    feed: Arc<BookingFeed<B>>,
    notifier: Arc<N>,
}

impl<B: Backend + ?Sized, N: Notifier + ?Sized> BookingActions<B, N> {
    pub fn new(feed: Arc<BookingFeed<B>>, notifier: Arc<N>) -> Self {
        Self { feed, notifier }
    }

    fn backend(&self) -> &B {
        self.feed.backend().as_ref()
    }

    // A failed refetch leaves the write in place and is only logged
    async fn refetch(&self) {
        if let Err(e) = self.feed.refresh().await {
            warn!(error = %e, "refetch after booking change failed");
        }
    }

    async fn finish<T>(
        &self,
        action: &str,
        result: Result<T, OperationError>,
        success: impl FnOnce(&T) -> String,
    ) -> Result<T, OperationError> {
        if result.is_ok() {
            self.refetch().await;
        }
        announce(self.notifier.as_ref(), action, result, success)
    }

    async fn patch_one(
        &self,
        id: &str,
        booking_type: BookingType,
        patch: serde_json::Value,
    ) -> Result<(), OperationError> {
        let updated = self
            .backend()
            .update(booking_type.table(), &Query::by_id(id), patch)
            .await?;
        if updated.is_empty() {
            return Err(OperationError::NotFound {
                entity: "booking",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    pub async fn update_status(
        &self,
        id: &str,
        booking_type: BookingType,
        status: BookingStatus,
    ) -> Result<(), OperationError> {
        info!(id, ?booking_type, %status, "updating booking status");
        let result = self
            .patch_one(id, booking_type, json!({ booking_type.status_column(): status }))
            .await;
        self.finish("update booking status", result, |_| {
            format!("Booking status updated to {}", status)
        })
        .await
    }

    pub async fn update_payment_status(
        &self,
        id: &str,
        booking_type: BookingType,
        status: PaymentStatus,
    ) -> Result<(), OperationError> {
        info!(id, ?booking_type, %status, "updating payment status");
        let result = self
            .patch_one(id, booking_type, json!({ "payment_status": status }))
            .await;
        self.finish("update payment status", result, |_| {
            format!("Payment status updated to {}", status)
        })
        .await
    }

    async fn insert_hotel_booking(&self, booking: &NewHotelBooking) -> Result<Booking, OperationError> {
        validate_new_booking(booking)?;
        let stored: HotelBookingRow = self.backend().insert_one(tables::BOOKINGS, booking).await?;

        // The insert response has no embedded hotel; read the row back with the join
        let query = Query::by_id(&stored.id).select(HOTEL_BOOKING_COLUMNS);
        match self.backend().fetch_one::<HotelBookingRow>(tables::BOOKINGS, &query).await {
            Ok(row) => Ok(Booking::from(row)),
            Err(e) => {
                warn!(id = %stored.id, error = %e, "could not read back new booking");
                Ok(Booking::from(stored))
            }
        }
    }

    pub async fn create_booking(&self, booking: NewHotelBooking) -> Result<Booking, OperationError> {
        let result = self.insert_hotel_booking(&booking).await;
        self.finish("create booking", result, |created| {
            format!("Booking created for {}", created.guest_name)
        })
        .await
    }

    pub async fn delete_booking(&self, id: &str, booking_type: BookingType) -> Result<(), OperationError> {
        info!(id, ?booking_type, "deleting booking");
        let result = match self
            .backend()
            .delete(booking_type.table(), &Query::by_id(id))
            .await
        {
            Ok(0) => Err(OperationError::NotFound {
                entity: "booking",
                id: id.to_string(),
            }),
            Ok(_) => Ok(()),
            Err(e) => Err(e.into()),
        };
        self.finish("delete booking", result, |_| "Booking deleted".to_string())
            .await
    }

    // One update per backing table; returns how many bookings changed.
    // Tables are written in a fixed order and a failure stops the rest.
    pub async fn bulk_update_status(
        &self,
        targets: &[(String, BookingType)],
        status: BookingStatus,
    ) -> Result<usize, OperationError> {
        let mut by_type: BTreeMap<BookingType, Vec<&str>> = BTreeMap::new();
        for (id, booking_type) in targets {
            by_type.entry(*booking_type).or_default().push(id.as_str());
        }

        let mut completed: Vec<&'static str> = Vec::new();
        let mut updated = 0;
        let mut failure = None;
        for (booking_type, ids) in by_type {
            let query = Query::new().in_list("id", ids.iter().copied());
            match self
                .backend()
                .update(booking_type.table(), &query, json!({ booking_type.status_column(): status }))
                .await
            {
                Ok(rows) => {
                    updated += rows.len();
                    completed.push(booking_type.table());
                }
                Err(e) => {
                    failure = Some(OperationError::after_steps(
                        "bookings",
                        &ids.join(","),
                        &completed,
                        e,
                    ));
                    break;
                }
            }
        }

        // Whatever landed must show up in the feed, even after a later failure
        if !completed.is_empty() {
            self.refetch().await;
        }
        let result = match failure {
            Some(e) => Err(e),
            None => Ok(updated),
        };
        announce(self.notifier.as_ref(), "update bookings", result, |n| {
            format!("{} bookings updated to {}", n, status)
        })
    }
}

fn validate_new_booking(booking: &NewHotelBooking) -> Result<(), OperationError> {
    if booking.guest_name.trim().is_empty() {
        return Err(OperationError::validation("guest name is required"));
    }
    if !booking.guest_email.contains('@') {
        return Err(OperationError::validation("a valid guest email is required"));
    }
    if booking.check_out <= booking.check_in {
        return Err(OperationError::validation("check-out must be after check-in"));
    }
    if booking.guests == 0 {
        return Err(OperationError::validation("at least one guest is required"));
    }
    if booking.total_price < 0.0 {
        return Err(OperationError::validation("total price cannot be negative"));
    }
    Ok(())
}
