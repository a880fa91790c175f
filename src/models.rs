// Rows as stored by the backend, and the normalized booking shape used for display

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// Table names fixed by the backend schema
pub mod tables {
    pub const HOTELS: &str = "hotels";
    pub const ROOMS: &str = "rooms";
    pub const SEASONAL_PRICING: &str = "seasonal_pricing";
    pub const BOOKINGS: &str = "bookings";
    pub const CAR_RENTALS: &str = "car_rentals";
    pub const BIKE_RENTALS: &str = "bike_rentals";
    pub const ADVENTURES: &str = "adventures";
    pub const EARLY_HOTELS: &str = "early_hotels";
    pub const EARLY_HOTEL_IMAGES: &str = "early_hotel_images";
    pub const EARLY_HOTEL_FAQS: &str = "early_hotel_faqs";
    pub const EARLY_HOTEL_AVAILABILITY: &str = "early_hotel_availability";
    pub const AUDIT_LOGS: &str = "audit_logs";
    pub const HOTEL_VERSIONS: &str = "hotel_versions";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    #[serde(other)]
    Unknown,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
            BookingStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
    Failed,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "refunded" => Ok(PaymentStatus::Refunded),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

// Which backend resource a booking came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingType {
    Hotel,
    Car,
    Bike,
    Adventure,
}

impl BookingType {
    pub fn table(&self) -> &'static str {
        match self {
            BookingType::Hotel => tables::BOOKINGS,
            BookingType::Car => tables::CAR_RENTALS,
            BookingType::Bike => tables::BIKE_RENTALS,
            BookingType::Adventure => tables::ADVENTURES,
        }
    }

    // Hotel bookings predate the other tables and name the column differently
    pub fn status_column(&self) -> &'static str {
        match self {
            BookingType::Hotel => "booking_status",
            _ => "status",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookingType::Hotel => "Hotel",
            BookingType::Car => "Car Rental",
            BookingType::Bike => "Bike Rental",
            BookingType::Adventure => "Adventure",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotelStatus {
    #[default]
    Active,
    Inactive,
}

impl HotelStatus {
    pub fn toggled(&self) -> Self {
        match self {
            HotelStatus::Active => HotelStatus::Inactive,
            HotelStatus::Inactive => HotelStatus::Active,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HotelStatus::Active => "active",
            HotelStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    pub stars: u8,
    pub price_per_night: f64,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub status: HotelStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub hotel_id: String,
    pub room_type: String,
    pub capacity: u32,
    pub price: f64,
    pub count: u32,
    #[serde(default)]
    pub images: Vec<String>,
}

// A date-range-scoped multiplier on the hotel's nightly rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPricing {
    pub id: String,
    pub hotel_id: String,
    #[serde(default)]
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price_multiplier: f64,
}

// Admin form input for a hotel and its dependent rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelDraft {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    pub stars: u8,
    pub price_per_night: f64,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub status: HotelStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub rooms: Vec<RoomDraft>,
    #[serde(default)]
    pub seasons: Vec<SeasonDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDraft {
    pub room_type: String,
    pub capacity: u32,
    pub price: f64,
    pub count: u32,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonDraft {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price_multiplier: f64,
}

// Pay-by-hour hotel variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyHotel {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    pub stars: u8,
    pub hourly_rate: f64,
    pub min_hours: u32,
    pub max_hours: u32,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub status: HotelStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyHotelDraft {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    pub stars: u8,
    pub hourly_rate: f64,
    pub min_hours: u32,
    pub max_hours: u32,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub status: HotelStatus,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyHotelImage {
    pub id: String,
    pub early_hotel_id: String,
    pub image_url: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyHotelFaq {
    pub id: String,
    pub early_hotel_id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyHotelAvailability {
    pub id: String,
    pub early_hotel_id: String,
    pub date: NaiveDate,
    pub available_hours: u32,
    pub is_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: String,
    #[serde(default)]
    pub hotel_id: Option<String>,
    pub action: String,
    pub actor: String,
    #[serde(default)]
    pub details: Value,
    pub created_at: DateTime<Utc>,
}

// Snapshot of a hotel row taken before a change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelVersion {
    pub id: String,
    pub hotel_id: String,
    pub version_number: u32,
    pub snapshot: Value,
    pub changed_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelRef {
    pub name: String,
}

fn default_guests() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelBookingRow {
    pub id: String,
    #[serde(default)]
    pub guest_name: String,
    #[serde(default)]
    pub guest_email: String,
    #[serde(default)]
    pub guest_phone: Option<String>,
    #[serde(default)]
    pub hotel_id: Option<String>,
    // Embedded by the select clause "*, hotels(name)"
    #[serde(default)]
    pub hotels: Option<HotelRef>,
    #[serde(default)]
    pub room_type: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "default_guests")]
    pub guests: u32,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub booking_status: BookingStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarRentalRow {
    pub id: String,
    #[serde(default)]
    pub car_name: Option<String>,
    pub pickup_date: NaiveDate,
    pub return_date: NaiveDate,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeRentalRow {
    pub id: String,
    #[serde(default)]
    pub bike_name: Option<String>,
    pub pickup_date: NaiveDate,
    pub return_date: NaiveDate,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdventureRow {
    pub id: String,
    #[serde(default)]
    pub adventure_name: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub participants: Option<u32>,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Common shape every booking source is normalized into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub booking_type: BookingType,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub hotel_id: Option<String>,
    // Hotel name, or the car/bike/adventure name for other types
    pub hotel_name: String,
    pub room_type: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub total_price: f64,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Non-hotel tables carry no guest identity, only the owning user
fn placeholder_guest(booking_type: BookingType, user_id: Option<&str>) -> (String, String) {
    let name = format!("{} Customer", booking_type.label());
    let email = user_id
        .map(|id| format!("user:{}", id))
        .unwrap_or_else(|| "N/A".to_string());
    (name, email)
}

impl From<HotelBookingRow> for Booking {
    fn from(row: HotelBookingRow) -> Self {
        Booking {
            id: row.id,
            booking_type: BookingType::Hotel,
            guest_name: row.guest_name,
            guest_email: row.guest_email,
            guest_phone: row.guest_phone.unwrap_or_default(),
            hotel_id: row.hotel_id,
            hotel_name: row
                .hotels
                .map(|h| h.name)
                .unwrap_or_else(|| "Unknown Hotel".to_string()),
            room_type: row.room_type.unwrap_or_else(|| "Standard".to_string()),
            check_in: row.check_in,
            check_out: row.check_out,
            guests: row.guests,
            total_price: row.total_price.unwrap_or(0.0),
            booking_status: row.booking_status,
            payment_status: row.payment_status,
            special_requests: row.special_requests,
            created_at: row.created_at,
        }
    }
}

impl From<CarRentalRow> for Booking {
    fn from(row: CarRentalRow) -> Self {
        let (guest_name, guest_email) = placeholder_guest(BookingType::Car, row.user_id.as_deref());
        Booking {
            id: row.id,
            booking_type: BookingType::Car,
            guest_name,
            guest_email,
            guest_phone: String::new(),
            hotel_id: None,
            hotel_name: row.car_name.unwrap_or_else(|| "Car Rental".to_string()),
            room_type: BookingType::Car.label().to_string(),
            check_in: row.pickup_date,
            check_out: row.return_date,
            guests: 1,
            total_price: row.total_price.unwrap_or(0.0),
            booking_status: row.status,
            payment_status: row.payment_status,
            special_requests: None,
            created_at: row.created_at,
        }
    }
}

impl From<BikeRentalRow> for Booking {
    fn from(row: BikeRentalRow) -> Self {
        let (guest_name, guest_email) = placeholder_guest(BookingType::Bike, row.user_id.as_deref());
        Booking {
            id: row.id,
            booking_type: BookingType::Bike,
            guest_name,
            guest_email,
            guest_phone: String::new(),
            hotel_id: None,
            hotel_name: row.bike_name.unwrap_or_else(|| "Bike Rental".to_string()),
            room_type: BookingType::Bike.label().to_string(),
            check_in: row.pickup_date,
            check_out: row.return_date,
            guests: 1,
            total_price: row.total_price.unwrap_or(0.0),
            booking_status: row.status,
            payment_status: row.payment_status,
            special_requests: None,
            created_at: row.created_at,
        }
    }
}

impl From<AdventureRow> for Booking {
    fn from(row: AdventureRow) -> Self {
        let (guest_name, guest_email) =
            placeholder_guest(BookingType::Adventure, row.user_id.as_deref());
        Booking {
            id: row.id,
            booking_type: BookingType::Adventure,
            guest_name,
            guest_email,
            guest_phone: String::new(),
            hotel_id: None,
            hotel_name: row.adventure_name.unwrap_or_else(|| "Adventure".to_string()),
            room_type: BookingType::Adventure.label().to_string(),
            check_in: row.date,
            check_out: row.date,
            guests: row.participants.unwrap_or(1),
            total_price: row.total_price.unwrap_or(0.0),
            booking_status: row.status,
            payment_status: row.payment_status,
            special_requests: None,
            created_at: row.created_at,
        }
    }
}

// Insert payload for a new hotel booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHotelBooking {
    pub hotel_id: String,
    pub guest_name: String,
    pub guest_email: String,
    #[serde(default)]
    pub guest_phone: Option<String>,
    pub room_type: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub total_price: f64,
    #[serde(default)]
    pub booking_status: BookingStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub special_requests: Option<String>,
}
