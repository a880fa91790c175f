// Public hotel search over the active inventory

use crate::models::{Hotel, HotelStatus};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotelSearch {
    // Case-insensitive substring of the hotel location
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_stars: Option<u8>,
    // Every listed amenity must be offered
    pub amenities: Vec<String>,
    pub featured_only: bool,
}

impl HotelSearch {
    pub fn matches(&self, hotel: &Hotel) -> bool {
        if hotel.status != HotelStatus::Active {
            return false;
        }

        if !self.location.as_ref().map_or(true, |location| {
            hotel
                .location
                .to_lowercase()
                .contains(&location.trim().to_lowercase())
        }) {
            return false;
        }

        if !self.min_price.map_or(true, |min| hotel.price_per_night >= min) {
            return false;
        }

        if !self.max_price.map_or(true, |max| hotel.price_per_night <= max) {
            return false;
        }

        if !self.min_stars.map_or(true, |stars| hotel.stars >= stars) {
            return false;
        }

        if self.featured_only && !hotel.featured {
            return false;
        }

        self.amenities.iter().all(|wanted| {
            hotel
                .amenities
                .iter()
                .any(|offered| offered.eq_ignore_ascii_case(wanted))
        })
    }
}

// Matching hotels, featured first, then cheapest first
pub fn search_hotels(hotels: &[Hotel], criteria: &HotelSearch) -> Vec<Hotel> {
    let mut found: Vec<Hotel> = hotels
        .iter()
        .filter(|hotel| criteria.matches(hotel))
        .cloned()
        .collect();
    found.sort_by(|a, b| {
        b.featured.cmp(&a.featured).then_with(|| {
            a.price_per_night
                .partial_cmp(&b.price_per_night)
                .unwrap_or(Ordering::Equal)
        })
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn hotel(id: &str, location: &str, price: f64, stars: u8, amenities: &[&str], featured: bool, status: HotelStatus) -> Hotel {
        Hotel {
            id: id.to_string(),
            name: format!("Hotel {}", id),
            slug: id.to_string(),
            location: location.to_string(),
            description: None,
            stars,
            price_per_night: price,
            amenities: amenities.iter().map(|a| a.to_string()).collect(),
            gallery: vec![],
            status,
            featured,
            created_at: None,
            updated_at: None,
        }
    }

    fn inventory() -> Vec<Hotel> {
        vec![
            hotel("h1", "Lisbon, Portugal", 180.0, 4, &["wifi", "pool"], false, HotelStatus::Active),
            hotel("h2", "Porto, Portugal", 90.0, 3, &["wifi"], false, HotelStatus::Active),
            hotel("h3", "Lisbon, Portugal", 320.0, 5, &["wifi", "pool", "spa"], true, HotelStatus::Active),
            hotel("h4", "Lisbon, Portugal", 60.0, 2, &["wifi"], false, HotelStatus::Inactive),
            hotel("h5", "Madrid, Spain", 140.0, 4, &["Pool"], true, HotelStatus::Active),
        ]
    }

    #[test_case(HotelSearch::default(), vec!["h5", "h3", "h2", "h1"]; "#1 No criteria keeps active hotels")]
    #[test_case(HotelSearch {location: Some("lisbon".to_string()), ..Default::default()},
        vec!["h3", "h1"]; "#2 Filter by location")]
    #[test_case(HotelSearch {min_price: Some(100.0), max_price: Some(200.0), ..Default::default()},
        vec!["h5", "h1"]; "#3 Filter by price range")]
    #[test_case(HotelSearch {min_stars: Some(4), amenities: vec!["pool".to_string()], ..Default::default()},
        vec!["h5", "h3", "h1"]; "#4 Filter by stars and amenity")]
    #[test_case(HotelSearch {featured_only: true, location: Some("Portugal".to_string()), ..Default::default()},
        vec!["h3"]; "#5 Combined filters")]
    #[test_case(HotelSearch {max_price: Some(50.0), ..Default::default()},
        vec![]; "#6 Nothing matches")]
    fn test_search_hotels(criteria: HotelSearch, expected_ids: Vec<&str>) {
        let found = search_hotels(&inventory(), &criteria);
        let ids: Vec<&str> = found.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, expected_ids);
    }
}
