// Admin core for a travel booking backend: merged booking feed, hotel and
// early-hotel inventory operations, audit history and exports

pub mod audit;
pub mod backend;
pub mod booking_actions;
pub mod booking_export;
pub mod booking_feed;
pub mod booking_filters;
pub mod booking_stats;
pub mod config;
pub mod early_hotels;
pub mod error;
pub mod hotel_ops;
pub mod hotel_search;
pub mod memory_store;
pub mod models;
pub mod notify;
pub mod pricing;
pub mod rest_client;

// Re-export key types for convenience
pub use audit::AuditTrail;
pub use backend::{Backend, BackendConfig, BackendError, BackendExt, BackendStats, Query, RetryConfig};
pub use booking_actions::BookingActions;
pub use booking_export::{bookings_to_csv, CsvExport};
pub use booking_feed::{fetch_all_bookings, BookingFeed};
pub use booking_filters::{BookingFilters, FilteredBookings};
pub use booking_stats::BookingStats;
pub use config::{AppConfig, ConfigError};
pub use early_hotels::EarlyHotelOperations;
pub use error::OperationError;
pub use hotel_ops::{BulkAction, HotelOperations};
pub use hotel_search::HotelSearch;
pub use memory_store::MemoryStore;
pub use notify::{MemoryNotifier, Notification, Notifier, TracingNotifier};
pub use rest_client::RestClient;
