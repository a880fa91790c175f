// Seasonal nightly pricing and hourly pricing for early hotels

use crate::models::SeasonalPricing;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("Check-out {check_out} must be after check-in {check_in}")]
    InvalidStay {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("{hours} hours is outside the bookable range {min}-{max}")]
    HoursOutOfRange { hours: u32, min: u32, max: u32 },

    #[error("Invalid rate: {0}")]
    InvalidRate(String),
}

// The season covering `date`; on overlap the most recently started season wins
pub fn season_for(date: NaiveDate, seasons: &[SeasonalPricing]) -> Option<&SeasonalPricing> {
    seasons
        .iter()
        .filter(|season| season.start_date <= date && date <= season.end_date)
        .max_by_key(|season| season.start_date)
}

pub fn nightly_rate(base: f64, date: NaiveDate, seasons: &[SeasonalPricing]) -> f64 {
    season_for(date, seasons).map_or(base, |season| base * season.price_multiplier)
}

// Total for a stay: one nightly rate per night from check-in up to (not including) check-out
pub fn stay_total(
    base: f64,
    check_in: NaiveDate,
    check_out: NaiveDate,
    seasons: &[SeasonalPricing],
    rooms: u32,
) -> Result<f64, PricingError> {
    if check_out <= check_in {
        return Err(PricingError::InvalidStay { check_in, check_out });
    }
    if base < 0.0 || !base.is_finite() {
        return Err(PricingError::InvalidRate(format!("nightly rate {}", base)));
    }

    let per_room: f64 = check_in
        .iter_days()
        .take_while(|night| *night < check_out)
        .map(|night| nightly_rate(base, night, seasons))
        .sum();
    Ok(per_room * rooms as f64)
}

pub fn hourly_total(rate: f64, hours: u32, min_hours: u32, max_hours: u32) -> Result<f64, PricingError> {
    if hours < min_hours || hours > max_hours {
        return Err(PricingError::HoursOutOfRange {
            hours,
            min: min_hours,
            max: max_hours,
        });
    }
    if rate < 0.0 || !rate.is_finite() {
        return Err(PricingError::InvalidRate(format!("hourly rate {}", rate)));
    }
    Ok(rate * hours as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn season(id: &str, start: &str, end: &str, multiplier: f64) -> SeasonalPricing {
        SeasonalPricing {
            id: id.to_string(),
            hotel_id: "h1".to_string(),
            name: id.to_string(),
            start_date: date(start),
            end_date: date(end),
            price_multiplier: multiplier,
        }
    }

    #[test_case("2025-05-31", 100.0; "#1 before any season")]
    #[test_case("2025-06-01", 150.0; "#2 first day of summer")]
    #[test_case("2025-07-04", 200.0; "#3 overlapping holiday wins")]
    #[test_case("2025-08-31", 150.0; "#4 last day inclusive")]
    fn test_nightly_rate(day: &str, expected: f64) {
        let seasons = vec![
            season("summer", "2025-06-01", "2025-08-31", 1.5),
            season("july-4th", "2025-07-03", "2025-07-05", 2.0),
        ];
        assert_eq!(nightly_rate(100.0, date(day), &seasons), expected);
    }

    #[test]
    fn test_stay_total_crosses_season_boundary() {
        let seasons = vec![season("summer", "2025-06-01", "2025-08-31", 1.5)];
        // Nights of May 30, May 31, June 1
        let total = stay_total(100.0, date("2025-05-30"), date("2025-06-02"), &seasons, 2).unwrap();
        assert_eq!(total, (100.0 + 100.0 + 150.0) * 2.0);
    }

    #[test]
    fn test_stay_total_rejects_empty_stay() {
        let err = stay_total(100.0, date("2025-06-02"), date("2025-06-02"), &[], 1).unwrap_err();
        assert!(matches!(err, PricingError::InvalidStay { .. }));
    }

    #[test_case(3, Ok(75.0); "#1 within range")]
    #[test_case(1, Err(PricingError::HoursOutOfRange { hours: 1, min: 2, max: 12 }); "#2 below minimum")]
    #[test_case(13, Err(PricingError::HoursOutOfRange { hours: 13, min: 2, max: 12 }); "#3 above maximum")]
    fn test_hourly_total(hours: u32, expected: Result<f64, PricingError>) {
        assert_eq!(hourly_total(25.0, hours, 2, 12), expected);
    }
}
