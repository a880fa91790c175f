// Admin operations on hotel inventory: hotels, rooms and seasonal pricing
//
// Multi-table writes run step by step with no rollback. When a later step
// fails the earlier rows stay written and the caller gets a PartialWrite
// naming the steps that landed.

use crate::audit::AuditTrail;
use crate::backend::{Backend, BackendError, BackendExt, Query};
use crate::error::OperationError;
use crate::hotel_search::{search_hotels, HotelSearch};
use crate::models::{tables, Hotel, HotelDraft, HotelStatus, Room, RoomDraft, SeasonDraft, SeasonalPricing};
use crate::notify::{announce, Notifier};
use crate::pricing::stay_total;
use chrono::{NaiveDate, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Activate,
    Deactivate,
    Feature,
    Unfeature,
    Delete,
}

impl BulkAction {
    fn patch(&self) -> Option<Value> {
        match self {
            BulkAction::Activate => Some(json!({"status": HotelStatus::Active})),
            BulkAction::Deactivate => Some(json!({"status": HotelStatus::Inactive})),
            BulkAction::Feature => Some(json!({"featured": true})),
            BulkAction::Unfeature => Some(json!({"featured": false})),
            BulkAction::Delete => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BulkAction::Activate => "activate",
            BulkAction::Deactivate => "deactivate",
            BulkAction::Feature => "feature",
            BulkAction::Unfeature => "unfeature",
            BulkAction::Delete => "delete",
        }
    }
}

// Lowercase ASCII alphanumerics joined by single dashes
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

pub fn validate_draft(draft: &HotelDraft) -> Result<(), OperationError> {
    if draft.name.trim().is_empty() {
        return Err(OperationError::validation("hotel name is required"));
    }
    if draft.location.trim().is_empty() {
        return Err(OperationError::validation("location is required"));
    }
    if !(1..=5).contains(&draft.stars) {
        return Err(OperationError::validation("stars must be between 1 and 5"));
    }
    if draft.price_per_night < 0.0 {
        return Err(OperationError::validation("price per night cannot be negative"));
    }
    for room in &draft.rooms {
        if room.room_type.trim().is_empty() {
            return Err(OperationError::validation("room type is required"));
        }
        if room.count == 0 || room.capacity == 0 {
            return Err(OperationError::validation(format!(
                "room {} needs a count and capacity of at least 1",
                room.room_type
            )));
        }
        if room.price < 0.0 {
            return Err(OperationError::validation(format!(
                "room {} has a negative price",
                room.room_type
            )));
        }
    }
    for season in &draft.seasons {
        if season.end_date < season.start_date {
            return Err(OperationError::validation(format!(
                "season {} ends before it starts",
                season.name
            )));
        }
        if season.price_multiplier <= 0.0 {
            return Err(OperationError::validation(format!(
                "season {} needs a positive multiplier",
                season.name
            )));
        }
    }
    Ok(())
}

fn hotel_row(draft: &HotelDraft, slug: &str) -> Value {
    json!({
        "name": draft.name.trim(),
        "slug": slug,
        "location": draft.location.trim(),
        "description": draft.description,
        "stars": draft.stars,
        "price_per_night": draft.price_per_night,
        "amenities": draft.amenities,
        "gallery": draft.gallery,
        "status": draft.status,
        "featured": draft.featured,
    })
}

fn room_rows(hotel_id: &str, rooms: &[RoomDraft]) -> Vec<Value> {
    rooms
        .iter()
        .map(|room| {
            json!({
                "hotel_id": hotel_id,
                "room_type": room.room_type,
                "capacity": room.capacity,
                "price": room.price,
                "count": room.count,
                "images": room.images,
            })
        })
        .collect()
}

fn season_rows(hotel_id: &str, seasons: &[SeasonDraft]) -> Vec<Value> {
    seasons
        .iter()
        .map(|season| {
            json!({
                "hotel_id": hotel_id,
                "name": season.name,
                "start_date": season.start_date,
                "end_date": season.end_date,
                "price_multiplier": season.price_multiplier,
            })
        })
        .collect()
}

pub struct HotelOperations<B: Backend + ?Sized, N: Notifier + ?Sized> {
    backend: Arc<B>,
    notifier: Arc<N>,
    audit: AuditTrail<B>,
    actor: String,
}

impl<B: Backend + ?Sized, N: Notifier + ?Sized> HotelOperations<B, N> {
    pub fn new(backend: Arc<B>, notifier: Arc<N>, actor: &str) -> Self {
        Self {
            audit: AuditTrail::new(Arc::clone(&backend)),
            backend,
            notifier,
            actor: actor.to_string(),
        }
    }

    pub fn audit(&self) -> &AuditTrail<B> {
        &self.audit
    }

    // Audit failures never undo the change they describe
    async fn audit_best_effort(&self, hotel_id: Option<&str>, action: &str, details: Value) {
        if let Err(e) = self.audit.record(hotel_id, action, &self.actor, details).await {
            warn!(hotel_id, action, error = %e, "failed to write audit log");
        }
    }

    pub async fn list_hotels(&self) -> Result<Vec<Hotel>, OperationError> {
        Ok(self
            .backend
            .fetch(tables::HOTELS, &Query::new().order("created_at", false))
            .await?)
    }

    pub async fn get_hotel(&self, id: &str) -> Result<Hotel, OperationError> {
        self.backend
            .fetch_one(tables::HOTELS, &Query::by_id(id))
            .await
            .map_err(|e| match e {
                BackendError::NotFound { .. } => OperationError::NotFound {
                    entity: "hotel",
                    id: id.to_string(),
                },
                other => other.into(),
            })
    }

    pub async fn rooms(&self, hotel_id: &str) -> Result<Vec<Room>, OperationError> {
        Ok(self
            .backend
            .fetch(tables::ROOMS, &Query::new().eq("hotel_id", hotel_id))
            .await?)
    }

    pub async fn seasonal_pricing(&self, hotel_id: &str) -> Result<Vec<SeasonalPricing>, OperationError> {
        Ok(self
            .backend
            .fetch(
                tables::SEASONAL_PRICING,
                &Query::new().eq("hotel_id", hotel_id).order("start_date", true),
            )
            .await?)
    }

    // Active hotels matching the public search form
    pub async fn search(&self, criteria: &HotelSearch) -> Result<Vec<Hotel>, OperationError> {
        let hotels: Vec<Hotel> = self
            .backend
            .fetch(tables::HOTELS, &Query::new().eq("status", HotelStatus::Active.as_str()))
            .await?;
        Ok(search_hotels(&hotels, criteria))
    }

    // Price of a stay at the hotel's base rate with its seasonal multipliers applied
    pub async fn quote_stay(
        &self,
        hotel_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        rooms: u32,
    ) -> Result<f64, OperationError> {
        let hotel = self.get_hotel(hotel_id).await?;
        let seasons = self.seasonal_pricing(hotel_id).await?;
        Ok(stay_total(hotel.price_per_night, check_in, check_out, &seasons, rooms)?)
    }

    // Names without ASCII letters or digits fall back to "hotel"
    async fn unique_slug(&self, base: &str) -> Result<String, BackendError> {
        let base = match base.trim_matches('-') {
            "" => "hotel",
            trimmed => trimmed,
        };
        let mut candidate = base.to_string();
        loop {
            let taken = self
                .backend
                .select(tables::HOTELS, &Query::new().eq("slug", candidate.as_str()).limit(1))
                .await?;
            if taken.is_empty() {
                return Ok(candidate);
            }
            let suffix: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(4)
                .map(|c| char::from(c).to_ascii_lowercase())
                .collect();
            candidate = format!("{}-{}", base, suffix);
        }
    }

    async fn insert_children(
        &self,
        hotel_id: &str,
        rooms: &[RoomDraft],
        seasons: &[SeasonDraft],
        completed: &mut Vec<&'static str>,
    ) -> Result<(), OperationError> {
        let room_values = room_rows(hotel_id, rooms);
        if !room_values.is_empty() {
            self.backend
                .insert(tables::ROOMS, room_values)
                .await
                .map_err(|e| OperationError::after_steps("hotel", hotel_id, completed, e))?;
            completed.push("rooms");
        }
        let season_values = season_rows(hotel_id, seasons);
        if !season_values.is_empty() {
            self.backend
                .insert(tables::SEASONAL_PRICING, season_values)
                .await
                .map_err(|e| OperationError::after_steps("hotel", hotel_id, completed, e))?;
            completed.push("seasonal_pricing");
        }
        Ok(())
    }

    async fn add_hotel_inner(&self, draft: &HotelDraft) -> Result<Hotel, OperationError> {
        validate_draft(draft)?;
        let slug = self.unique_slug(&slugify(&draft.name)).await?;
        let hotel: Hotel = self
            .backend
            .insert_one(tables::HOTELS, &hotel_row(draft, &slug))
            .await?;
        let mut completed = vec!["hotel"];
        self.insert_children(&hotel.id, &draft.rooms, &draft.seasons, &mut completed)
            .await?;

        info!(hotel_id = %hotel.id, slug = %hotel.slug, "hotel added");
        self.audit_best_effort(
            Some(hotel.id.as_str()),
            "create",
            json!({ "name": hotel.name, "rooms": draft.rooms.len(), "seasons": draft.seasons.len() }),
        )
        .await;
        Ok(hotel)
    }

    pub async fn add_hotel(&self, draft: &HotelDraft) -> Result<Hotel, OperationError> {
        let result = self.add_hotel_inner(draft).await;
        announce(self.notifier.as_ref(), "add hotel", result, |hotel| {
            format!("Hotel {} added", hotel.name)
        })
    }

    async fn edit_hotel_inner(&self, id: &str, draft: &HotelDraft) -> Result<Hotel, OperationError> {
        validate_draft(draft)?;
        let current = self.get_hotel(id).await?;
        self.audit.snapshot(&current, &self.actor).await?;

        let slug = if slugify(&draft.name) == current.slug || draft.name == current.name {
            current.slug.clone()
        } else {
            self.unique_slug(&slugify(&draft.name)).await?
        };
        let mut patch = hotel_row(draft, &slug);
        patch["updated_at"] = json!(Utc::now());

        let updated: Hotel = self
            .backend
            .update_as::<Hotel>(tables::HOTELS, &Query::by_id(id), patch)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OperationError::NotFound {
                entity: "hotel",
                id: id.to_string(),
            })?;
        let mut completed = vec!["hotel"];

        let by_hotel = Query::new().eq("hotel_id", id);
        self.backend
            .delete(tables::ROOMS, &by_hotel)
            .await
            .map_err(|e| OperationError::after_steps("hotel", id, &completed, e))?;
        completed.push("clear_rooms");
        self.backend
            .delete(tables::SEASONAL_PRICING, &by_hotel)
            .await
            .map_err(|e| OperationError::after_steps("hotel", id, &completed, e))?;
        completed.push("clear_seasonal_pricing");
        self.insert_children(id, &draft.rooms, &draft.seasons, &mut completed)
            .await?;

        let before = serde_json::to_value(&current).unwrap_or_default();
        let after = serde_json::to_value(&updated).unwrap_or_default();
        self.audit_best_effort(
            Some(id),
            "update",
            json!({ "changed": crate::audit::changed_fields(&before, &after) }),
        )
        .await;
        Ok(updated)
    }

    pub async fn edit_hotel(&self, id: &str, draft: &HotelDraft) -> Result<Hotel, OperationError> {
        let result = self.edit_hotel_inner(id, draft).await;
        announce(self.notifier.as_ref(), "update hotel", result, |hotel| {
            format!("Hotel {} updated", hotel.name)
        })
    }

    async fn delete_hotel_inner(&self, id: &str) -> Result<(), OperationError> {
        let hotel = self.get_hotel(id).await?;
        let by_hotel = Query::new().eq("hotel_id", id);
        let mut completed: Vec<&'static str> = Vec::new();

        self.backend
            .delete(tables::ROOMS, &by_hotel)
            .await
            .map_err(|e| OperationError::after_steps("hotel", id, &completed, e))?;
        completed.push("rooms");
        self.backend
            .delete(tables::SEASONAL_PRICING, &by_hotel)
            .await
            .map_err(|e| OperationError::after_steps("hotel", id, &completed, e))?;
        completed.push("seasonal_pricing");
        self.backend
            .delete(tables::HOTELS, &Query::by_id(id))
            .await
            .map_err(|e| OperationError::after_steps("hotel", id, &completed, e))?;

        info!(hotel_id = id, "hotel deleted");
        self.audit_best_effort(Some(id), "delete", json!({ "name": hotel.name }))
            .await;
        Ok(())
    }

    pub async fn delete_hotel(&self, id: &str) -> Result<(), OperationError> {
        let result = self.delete_hotel_inner(id).await;
        announce(self.notifier.as_ref(), "delete hotel", result, |_| {
            "Hotel deleted".to_string()
        })
    }

    async fn set_fields(&self, id: &str, patch: Value) -> Result<Hotel, OperationError> {
        self.backend
            .update_as::<Hotel>(tables::HOTELS, &Query::by_id(id), patch)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OperationError::NotFound {
                entity: "hotel",
                id: id.to_string(),
            })
    }

    // One read, one update
    pub async fn toggle_status(&self, id: &str) -> Result<Hotel, OperationError> {
        let result = async {
            let hotel = self.get_hotel(id).await?;
            let status = hotel.status.toggled();
            let updated = self.set_fields(id, json!({ "status": status })).await?;
            self.audit_best_effort(Some(id), "toggle_status", json!({ "status": status }))
                .await;
            Ok::<_, OperationError>(updated)
        }
        .await;
        announce(self.notifier.as_ref(), "update hotel status", result, |hotel| {
            format!("Hotel {} is now {}", hotel.name, hotel.status.as_str())
        })
    }

    // One read, one update
    pub async fn toggle_featured(&self, id: &str) -> Result<Hotel, OperationError> {
        let result = async {
            let hotel = self.get_hotel(id).await?;
            let featured = !hotel.featured;
            let updated = self.set_fields(id, json!({ "featured": featured })).await?;
            self.audit_best_effort(Some(id), "toggle_featured", json!({ "featured": featured }))
                .await;
            Ok::<_, OperationError>(updated)
        }
        .await;
        announce(self.notifier.as_ref(), "update featured flag", result, |hotel| {
            if hotel.featured {
                format!("Hotel {} is now featured", hotel.name)
            } else {
                format!("Hotel {} is no longer featured", hotel.name)
            }
        })
    }

    async fn bulk_action_inner(&self, ids: &[String], action: BulkAction) -> Result<usize, OperationError> {
        if ids.is_empty() {
            return Err(OperationError::validation("no hotels selected"));
        }
        let affected = match action.patch() {
            Some(patch) => self
                .backend
                .update(tables::HOTELS, &Query::new().in_list("id", ids.iter().map(String::as_str)), patch)
                .await?
                .len(),
            None => {
                let by_hotels = Query::new().in_list("hotel_id", ids.iter().map(String::as_str));
                self.backend.delete(tables::ROOMS, &by_hotels).await?;
                self.backend.delete(tables::SEASONAL_PRICING, &by_hotels).await?;
                self.backend
                    .delete(tables::HOTELS, &Query::new().in_list("id", ids.iter().map(String::as_str)))
                    .await?
            }
        };

        info!(action = action.as_str(), affected, "bulk hotel action");
        if let Err(e) = self
            .audit
            .record_many(ids, &format!("bulk_{}", action.as_str()), &self.actor, json!({ "count": ids.len() }))
            .await
        {
            warn!(error = %e, "failed to write bulk audit log");
        }
        Ok(affected)
    }

    pub async fn bulk_action(&self, ids: &[String], action: BulkAction) -> Result<usize, OperationError> {
        let result = self.bulk_action_inner(ids, action).await;
        announce(self.notifier.as_ref(), "apply bulk action", result, |n| {
            format!("{} hotels updated ({})", n, action.as_str())
        })
    }

    async fn clone_hotel_inner(&self, id: &str) -> Result<Hotel, OperationError> {
        let source = self.get_hotel(id).await?;
        let rooms = self.rooms(id).await?;
        let seasons = self.seasonal_pricing(id).await?;

        let slug = self.unique_slug(&format!("{}-copy", source.slug)).await?;
        let draft = HotelDraft {
            name: format!("{} (Copy)", source.name),
            location: source.location.clone(),
            description: source.description.clone(),
            stars: source.stars,
            price_per_night: source.price_per_night,
            amenities: source.amenities.clone(),
            gallery: source.gallery.clone(),
            status: HotelStatus::Inactive,
            featured: false,
            rooms: rooms
                .into_iter()
                .map(|room| RoomDraft {
                    room_type: room.room_type,
                    capacity: room.capacity,
                    price: room.price,
                    count: room.count,
                    images: room.images,
                })
                .collect(),
            seasons: seasons
                .into_iter()
                .map(|season| SeasonDraft {
                    name: season.name,
                    start_date: season.start_date,
                    end_date: season.end_date,
                    price_multiplier: season.price_multiplier,
                })
                .collect(),
        };

        let copy: Hotel = self
            .backend
            .insert_one(tables::HOTELS, &hotel_row(&draft, &slug))
            .await?;
        let mut completed = vec!["hotel"];
        self.insert_children(&copy.id, &draft.rooms, &draft.seasons, &mut completed)
            .await?;

        info!(source_id = id, copy_id = %copy.id, "hotel cloned");
        self.audit_best_effort(Some(copy.id.as_str()), "clone", json!({ "source_id": id }))
            .await;
        Ok(copy)
    }

    pub async fn clone_hotel(&self, id: &str) -> Result<Hotel, OperationError> {
        let result = self.clone_hotel_inner(id).await;
        announce(self.notifier.as_ref(), "clone hotel", result, |hotel| {
            format!("Hotel cloned as {}", hotel.name)
        })
    }
}
