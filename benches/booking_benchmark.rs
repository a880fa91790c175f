use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{seq::SliceRandom, thread_rng, Rng};
use travel_admin_core::booking_export::bookings_to_csv;
use travel_admin_core::booking_filters::BookingFilters;
use travel_admin_core::booking_stats::BookingStats;
use travel_admin_core::models::{Booking, BookingStatus, BookingType, PaymentStatus};

fn random_bookings(count: usize) -> Vec<Booking> {
    let mut rng = thread_rng();
    let hotels = ["Harbour View", "City Lights", "Mountain Lodge", "Canyon Rafting", "Compact SUV"];
    let rooms = ["Deluxe King", "Twin", "Suite", "Car Rental", "Adventure"];
    let types = [BookingType::Hotel, BookingType::Car, BookingType::Bike, BookingType::Adventure];
    let statuses = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];
    let payments = [PaymentStatus::Pending, PaymentStatus::Paid, PaymentStatus::Refunded];
    let season_start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default();

    (0..count)
        .map(|i| {
            let check_in = season_start + Duration::days(rng.gen_range(0..365));
            Booking {
                id: format!("booking{}", i),
                booking_type: *types.choose(&mut rng).unwrap(),
                guest_name: format!("Guest {}", i),
                guest_email: format!("guest{}@example.com", i),
                guest_phone: String::new(),
                hotel_id: Some(format!("hotel{}", i % 50)),
                hotel_name: hotels.choose(&mut rng).unwrap().to_string(),
                room_type: rooms.choose(&mut rng).unwrap().to_string(),
                check_in,
                check_out: check_in + Duration::days(rng.gen_range(1..8)),
                guests: rng.gen_range(1..5),
                total_price: rng.gen_range(50.0..2000.0),
                booking_status: *statuses.choose(&mut rng).unwrap(),
                payment_status: *payments.choose(&mut rng).unwrap(),
                special_requests: None,
                created_at: Utc.timestamp_opt(1_735_689_600 + i as i64 * 3600, 0).unwrap(),
            }
        })
        .collect()
}

pub fn booking_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("admin_bookings");

    let filters = BookingFilters {
        search: Some("harbour".to_string()),
        status: Some(BookingStatus::Confirmed),
        date_from: NaiveDate::from_ymd_opt(2025, 3, 1),
        date_to: NaiveDate::from_ymd_opt(2025, 9, 30),
        ..Default::default()
    };

    for size in [100, 1_000, 10_000].iter() {
        let bookings = random_bookings(*size);

        group.bench_with_input(BenchmarkId::new("stats", size), &bookings, |b, bookings| {
            b.iter(|| BookingStats::compute(black_box(bookings)))
        });

        group.bench_with_input(BenchmarkId::new("filter", size), &bookings, |b, bookings| {
            b.iter(|| filters.apply(black_box(bookings)))
        });

        group.bench_with_input(BenchmarkId::new("csv", size), &bookings, |b, bookings| {
            b.iter(|| bookings_to_csv(black_box(bookings)))
        });
    }

    group.finish();
}

criterion_group!(benches, booking_benchmark);
criterion_main!(benches);
