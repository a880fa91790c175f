// CSV export of the currently filtered bookings

use crate::models::Booking;
use bytes::Bytes;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CSV_HEADERS: [&str; 11] = [
    "Guest Name",
    "Email",
    "Hotel",
    "Room Type",
    "Check In",
    "Check Out",
    "Guests",
    "Total Price",
    "Booking Status",
    "Payment Status",
    "Created At",
];

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn csv_line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|field| quote(field.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

// One header line plus one line per booking, every field quoted
pub fn bookings_to_csv(bookings: &[Booking]) -> String {
    let mut lines = Vec::with_capacity(bookings.len() + 1);
    lines.push(csv_line(CSV_HEADERS));
    for booking in bookings {
        lines.push(csv_line([
            booking.guest_name.clone(),
            booking.guest_email.clone(),
            booking.hotel_name.clone(),
            booking.room_type.clone(),
            booking.check_in.to_string(),
            booking.check_out.to_string(),
            booking.guests.to_string(),
            format!("{:.2}", booking.total_price),
            booking.booking_status.to_string(),
            booking.payment_status.to_string(),
            booking.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]));
    }
    lines.join("\n")
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsvExport {
    pub file_name: String,
    pub content: Bytes,
}

impl CsvExport {
    pub fn from_bookings(bookings: &[Booking], date: NaiveDate) -> Self {
        Self {
            file_name: format!("bookings-{}.csv", date.format("%Y-%m-%d")),
            content: Bytes::from(bookings_to_csv(bookings)),
        }
    }

    pub fn write_to(&self, directory: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(directory)?;
        let path = directory.join(&self.file_name);
        std::fs::write(&path, &self.content)?;
        info!(path = %path.display(), bytes = self.content.len(), "bookings exported");
        Ok(path)
    }
}
