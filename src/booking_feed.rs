// Merged view over every booking source: hotels, cars, bikes and adventures

use crate::backend::{Backend, BackendError, BackendExt, Query};
use crate::models::{tables, AdventureRow, BikeRentalRow, Booking, CarRentalRow, HotelBookingRow};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

// Hotel bookings carry the hotel name through the `hotels` relation
pub const HOTEL_BOOKING_COLUMNS: &str = "*, hotels(name)";

// Fetch all four sources concurrently and merge them newest first
pub async fn fetch_all_bookings<B: Backend + ?Sized>(backend: &B) -> Result<Vec<Booking>, BackendError> {
    let hotel_query = Query::new().select(HOTEL_BOOKING_COLUMNS).order("created_at", false);
    let newest_first = Query::new().order("created_at", false);

    let (hotel_rows, car_rows, bike_rows, adventure_rows) = tokio::try_join!(
        backend.fetch::<HotelBookingRow>(tables::BOOKINGS, &hotel_query),
        backend.fetch::<CarRentalRow>(tables::CAR_RENTALS, &newest_first),
        backend.fetch::<BikeRentalRow>(tables::BIKE_RENTALS, &newest_first),
        backend.fetch::<AdventureRow>(tables::ADVENTURES, &newest_first),
    )?;

    let mut bookings: Vec<Booking> = hotel_rows
        .into_iter()
        .map(Booking::from)
        .chain(car_rows.into_iter().map(Booking::from))
        .chain(bike_rows.into_iter().map(Booking::from))
        .chain(adventure_rows.into_iter().map(Booking::from))
        .collect();
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(bookings)
}

#[derive(Debug, Default)]
struct FeedState {
    bookings: Arc<Vec<Booking>>,
    loading: bool,
    last_error: Option<String>,
}

pub struct BookingFeed<B: Backend + ?Sized> {
    backend: Arc<B>,
    state: RwLock<FeedState>,
    generation: AtomicU64,
    // Serializes refreshes so an older fetch never lands after a newer one
    refresh_lock: Mutex<()>,
}

impl<B: Backend + ?Sized> BookingFeed<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            state: RwLock::new(FeedState::default()),
            generation: AtomicU64::new(0),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn bookings(&self) -> Arc<Vec<Booking>> {
        Arc::clone(&self.state.read().bookings)
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    // Bumped on every successful refresh
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    // Refetch every source; on failure the previous bookings stay in place
    pub async fn refresh(&self) -> Result<usize, BackendError> {
        let _running = self.refresh_lock.lock().await;
        self.state.write().loading = true;
        let result = fetch_all_bookings(self.backend.as_ref()).await;

        let mut state = self.state.write();
        state.loading = false;
        match result {
            Ok(bookings) => {
                let count = bookings.len();
                state.bookings = Arc::new(bookings);
                state.last_error = None;
                self.generation.fetch_add(1, Ordering::SeqCst);
                info!(count, "bookings refreshed");
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch bookings");
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    // Refetch whenever the bookings table changes. Events arriving within
    // `debounce` of the first one are folded into a single refetch.
    pub fn watch(self: Arc<Self>, debounce: Duration) -> JoinHandle<()> {
        let mut changes = self.backend.subscribe(tables::BOOKINGS);
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(event) => debug!(kind = ?event.kind, "bookings changed"),
                    Err(RecvError::Lagged(skipped)) => debug!(skipped, "change feed lagged"),
                    Err(RecvError::Closed) => break,
                }

                if !debounce.is_zero() {
                    tokio::time::sleep(debounce).await;
                    loop {
                        match changes.try_recv() {
                            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                            Err(TryRecvError::Empty) => break,
                            Err(TryRecvError::Closed) => return,
                        }
                    }
                }

                if let Err(e) = self.refresh().await {
                    warn!(error = %e, "refetch after change failed");
                }
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::memory_store::MemoryStore;
    use crate::models::tables;
    use serde_json::json;

    // Two hotel bookings plus one of each other type, created on distinct days
    pub fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.seed(
            tables::HOTELS,
            vec![
                json!({"id": "h1", "name": "Harbour View", "location": "Lisbon"}),
                json!({"id": "h2", "name": "Alpine Lodge", "location": "Innsbruck"}),
            ],
        );
        store.seed(
            tables::BOOKINGS,
            vec![
                json!({
                    "id": "hb-1",
                    "guest_name": "Ana Ruiz",
                    "guest_email": "ana@example.com",
                    "guest_phone": "+34 600 000 000",
                    "hotel_id": "h1",
                    "room_type": "Deluxe King",
                    "check_in": "2025-06-01",
                    "check_out": "2025-06-04",
                    "guests": 2,
                    "total_price": 450.0,
                    "booking_status": "confirmed",
                    "payment_status": "paid",
                    "created_at": "2025-05-01T10:00:00Z"
                }),
                json!({
                    "id": "hb-2",
                    "guest_name": "Tom Becker",
                    "guest_email": "tom@example.org",
                    "hotel_id": "h2",
                    "room_type": "Family Suite",
                    "check_in": "2025-07-10",
                    "check_out": "2025-07-12",
                    "guests": 4,
                    "total_price": 380.0,
                    "booking_status": "pending",
                    "payment_status": "pending",
                    "created_at": "2025-06-15T09:00:00Z"
                }),
            ],
        );
        store.seed(
            tables::CAR_RENTALS,
            vec![json!({
                "id": "car-1",
                "car_name": "Compact SUV",
                "pickup_date": "2025-06-20",
                "return_date": "2025-06-23",
                "total_price": 210.0,
                "status": "completed",
                "payment_status": "paid",
                "user_id": "u-7",
                "created_at": "2025-06-01T12:00:00Z"
            })],
        );
        store.seed(
            tables::BIKE_RENTALS,
            vec![json!({
                "id": "bike-1",
                "bike_name": "City E-Bike",
                "pickup_date": "2025-06-05",
                "return_date": "2025-06-06",
                "total_price": 40.0,
                "status": "cancelled",
                "payment_status": "refunded",
                "created_at": "2025-05-20T08:00:00Z"
            })],
        );
        store.seed(
            tables::ADVENTURES,
            vec![json!({
                "id": "adv-1",
                "adventure_name": "Canyon Rafting",
                "date": "2025-08-10",
                "participants": 3,
                "total_price": 300.0,
                "status": "confirmed",
                "payment_status": "paid",
                "created_at": "2025-07-01T07:00:00Z"
            })],
        );
        store
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::seeded_store;
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::models::BookingType;
    use serde_json::json;

    #[tokio::test]
    async fn test_merges_sources_newest_first() {
        let store = seeded_store();
        let bookings = fetch_all_bookings(&store).await.unwrap();

        let ids: Vec<&str> = bookings.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["adv-1", "hb-2", "car-1", "bike-1", "hb-1"]);
        assert_eq!(bookings[0].booking_type, BookingType::Adventure);
        assert_eq!(store.stats().selects, 4);

        let hotel_names: Vec<&str> = bookings
            .iter()
            .filter(|b| b.booking_type == BookingType::Hotel)
            .map(|b| b.hotel_name.as_str())
            .collect();
        assert_eq!(hotel_names, vec!["Alpine Lodge", "Harbour View"]);
    }

    #[tokio::test]
    async fn test_any_source_failure_fails_the_fetch() {
        let store = seeded_store();
        store.fail_next_requests(1);
        assert!(fetch_all_bookings(&store).await.is_err());
    }

    #[tokio::test]
    async fn test_refresh_keeps_previous_bookings_on_error() {
        let feed = BookingFeed::new(Arc::new(seeded_store()));
        assert_eq!(feed.refresh().await.unwrap(), 5);
        assert_eq!(feed.generation(), 1);

        feed.backend().fail_next_requests(1);
        assert!(feed.refresh().await.is_err());
        assert_eq!(feed.bookings().len(), 5);
        assert_eq!(feed.generation(), 1);
        assert!(feed.last_error().is_some());
        assert!(!feed.is_loading());
    }

    #[tokio::test]
    async fn test_overlapping_refreshes_apply_in_order() {
        let store = Arc::new(seeded_store());
        let feed = BookingFeed::new(Arc::clone(&store));

        let (first, second) = tokio::join!(feed.refresh(), async {
            store
                .insert(
                    tables::BOOKINGS,
                    vec![json!({
                        "guest_name": "Late Guest",
                        "hotel_id": "h1",
                        "check_in": "2025-11-01",
                        "check_out": "2025-11-02"
                    })],
                )
                .await
                .unwrap();
            feed.refresh().await
        });

        assert!(first.is_ok());
        // The refresh queued behind the first sees the insert
        assert_eq!(second.unwrap(), 6);
        assert_eq!(feed.generation(), 2);
        assert_eq!(feed.bookings().len(), 6);
        assert!(!feed.is_loading());
    }

    #[tokio::test]
    async fn test_watch_refetches_on_change() {
        let store = Arc::new(MemoryStore::new());
        let feed = Arc::new(BookingFeed::new(Arc::clone(&store)));
        let handle = Arc::clone(&feed).watch(Duration::from_millis(20));

        for i in 0..3 {
            store
                .insert(
                    tables::BOOKINGS,
                    vec![json!({
                        "guest_name": format!("Guest {}", i),
                        "check_in": "2025-09-01",
                        "check_out": "2025-09-02"
                    })],
                )
                .await
                .unwrap();
        }

        for _ in 0..50 {
            if feed.bookings().len() == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(feed.bookings().len(), 3);
        // Three inserts inside the debounce window collapse into one refetch
        assert_eq!(feed.generation(), 1);
        handle.abort();
    }
}
