// Pay-by-hour hotels and their images, FAQs and daily availability

use crate::audit::AuditTrail;
use crate::backend::{Backend, BackendError, BackendExt, Query};
use crate::error::OperationError;
use crate::hotel_ops::slugify;
use crate::models::{
    tables, EarlyHotel, EarlyHotelAvailability, EarlyHotelDraft, EarlyHotelFaq, EarlyHotelImage,
};
use crate::notify::{announce, Notifier};
use crate::pricing::hourly_total;
use chrono::NaiveDate;
use futures::future::try_join_all;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

pub const MAX_BOOKABLE_HOURS: u32 = 24;

pub fn validate_early_draft(draft: &EarlyHotelDraft) -> Result<(), OperationError> {
    if draft.name.trim().is_empty() {
        return Err(OperationError::validation("hotel name is required"));
    }
    if draft.location.trim().is_empty() {
        return Err(OperationError::validation("location is required"));
    }
    if !(1..=5).contains(&draft.stars) {
        return Err(OperationError::validation("stars must be between 1 and 5"));
    }
    if draft.hourly_rate < 0.0 || !draft.hourly_rate.is_finite() {
        return Err(OperationError::validation("hourly rate cannot be negative"));
    }
    if draft.min_hours < 1 || draft.min_hours > draft.max_hours || draft.max_hours > MAX_BOOKABLE_HOURS {
        return Err(OperationError::validation(format!(
            "hours must satisfy 1 <= min ({}) <= max ({}) <= {}",
            draft.min_hours, draft.max_hours, MAX_BOOKABLE_HOURS
        )));
    }
    Ok(())
}

fn early_hotel_row(draft: &EarlyHotelDraft, slug: &str) -> Value {
    json!({
        "name": draft.name.trim(),
        "slug": slug,
        "location": draft.location.trim(),
        "description": draft.description,
        "stars": draft.stars,
        "hourly_rate": draft.hourly_rate,
        "min_hours": draft.min_hours,
        "max_hours": draft.max_hours,
        "amenities": draft.amenities,
        "status": draft.status,
        "featured": draft.featured,
    })
}

fn not_found<'a>(entity: &'static str, id: &'a str) -> impl FnOnce(BackendError) -> OperationError + 'a {
    move |e| match e {
        BackendError::NotFound { .. } => OperationError::NotFound {
            entity,
            id: id.to_string(),
        },
        other => other.into(),
    }
}

pub struct EarlyHotelOperations<B: Backend + ?Sized, N: Notifier + ?Sized> {
    backend: Arc<B>,
    notifier: Arc<N>,
    audit: AuditTrail<B>,
    actor: String,
}

impl<B: Backend + ?Sized, N: Notifier + ?Sized> EarlyHotelOperations<B, N> {
    pub fn new(backend: Arc<B>, notifier: Arc<N>, actor: &str) -> Self {
        Self {
            audit: AuditTrail::new(Arc::clone(&backend)),
            backend,
            notifier,
            actor: actor.to_string(),
        }
    }

    // Early hotels share the audit table with a null hotel_id
    async fn audit_best_effort(&self, early_hotel_id: &str, action: &str, details: Value) {
        let mut details = details;
        details["early_hotel_id"] = json!(early_hotel_id);
        if let Err(e) = self
            .audit
            .record(None, &format!("early_hotel.{}", action), &self.actor, details)
            .await
        {
            warn!(early_hotel_id, action, error = %e, "failed to write audit log");
        }
    }

    pub async fn list(&self) -> Result<Vec<EarlyHotel>, OperationError> {
        Ok(self
            .backend
            .fetch(tables::EARLY_HOTELS, &Query::new().order("created_at", false))
            .await?)
    }

    pub async fn get(&self, id: &str) -> Result<EarlyHotel, OperationError> {
        self.backend
            .fetch_one(tables::EARLY_HOTELS, &Query::by_id(id))
            .await
            .map_err(not_found("early hotel", id))
    }

    // Names without ASCII letters or digits fall back to "early-hotel"
    async fn unique_slug(&self, base: &str, except_id: Option<&str>) -> Result<String, BackendError> {
        let base = match base.trim_matches('-') {
            "" => "early-hotel",
            trimmed => trimmed,
        };
        let mut candidate = base.to_string();
        let mut attempt = 1;
        loop {
            let taken = self
                .backend
                .select(tables::EARLY_HOTELS, &Query::new().eq("slug", candidate.as_str()))
                .await?;
            if taken.iter().all(|row| except_id.map_or(false, |id| row["id"] == id)) {
                return Ok(candidate);
            }
            attempt += 1;
            candidate = format!("{}-{}", base, attempt);
        }
    }

    pub async fn add(&self, draft: &EarlyHotelDraft) -> Result<EarlyHotel, OperationError> {
        let result = async {
            validate_early_draft(draft)?;
            let slug = self.unique_slug(&slugify(&draft.name), None).await?;
            let hotel: EarlyHotel = self
                .backend
                .insert_one(tables::EARLY_HOTELS, &early_hotel_row(draft, &slug))
                .await?;
            info!(early_hotel_id = %hotel.id, "early hotel added");
            self.audit_best_effort(&hotel.id, "create", json!({ "name": hotel.name }))
                .await;
            Ok::<_, OperationError>(hotel)
        }
        .await;
        announce(self.notifier.as_ref(), "add early hotel", result, |hotel| {
            format!("Early hotel {} added", hotel.name)
        })
    }

    pub async fn edit(&self, id: &str, draft: &EarlyHotelDraft) -> Result<EarlyHotel, OperationError> {
        let result = async {
            validate_early_draft(draft)?;
            let current = self.get(id).await?;
            let slug = if current.name == draft.name {
                current.slug.clone()
            } else {
                self.unique_slug(&slugify(&draft.name), Some(id)).await?
            };
            let updated = self
                .set_fields(id, early_hotel_row(draft, &slug))
                .await?;
            self.audit_best_effort(id, "update", json!({ "previous_name": current.name }))
                .await;
            Ok::<_, OperationError>(updated)
        }
        .await;
        announce(self.notifier.as_ref(), "update early hotel", result, |hotel| {
            format!("Early hotel {} updated", hotel.name)
        })
    }

    // Images, FAQs and availability go first; nothing is rolled back on failure
    pub async fn delete(&self, id: &str) -> Result<(), OperationError> {
        let result = async {
            self.get(id).await?;
            let by_hotel = Query::new().eq("early_hotel_id", id);
            let mut completed: Vec<&'static str> = Vec::new();
            for table in [
                tables::EARLY_HOTEL_IMAGES,
                tables::EARLY_HOTEL_FAQS,
                tables::EARLY_HOTEL_AVAILABILITY,
            ] {
                self.backend
                    .delete(table, &by_hotel)
                    .await
                    .map_err(|e| OperationError::after_steps("early hotel", id, &completed, e))?;
                completed.push(table);
            }
            self.backend
                .delete(tables::EARLY_HOTELS, &Query::by_id(id))
                .await
                .map_err(|e| OperationError::after_steps("early hotel", id, &completed, e))?;
            info!(early_hotel_id = id, "early hotel deleted");
            self.audit_best_effort(id, "delete", json!({})).await;
            Ok::<_, OperationError>(())
        }
        .await;
        announce(self.notifier.as_ref(), "delete early hotel", result, |_| {
            "Early hotel deleted".to_string()
        })
    }

    async fn set_fields(&self, id: &str, patch: Value) -> Result<EarlyHotel, OperationError> {
        self.backend
            .update_as::<EarlyHotel>(tables::EARLY_HOTELS, &Query::by_id(id), patch)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OperationError::NotFound {
                entity: "early hotel",
                id: id.to_string(),
            })
    }

    pub async fn toggle_status(&self, id: &str) -> Result<EarlyHotel, OperationError> {
        let result = async {
            let hotel = self.get(id).await?;
            let status = hotel.status.toggled();
            let updated = self.set_fields(id, json!({ "status": status })).await?;
            self.audit_best_effort(id, "toggle_status", json!({ "status": status }))
                .await;
            Ok::<_, OperationError>(updated)
        }
        .await;
        announce(self.notifier.as_ref(), "update early hotel status", result, |hotel| {
            format!("Early hotel {} is now {}", hotel.name, hotel.status.as_str())
        })
    }

    pub async fn toggle_featured(&self, id: &str) -> Result<EarlyHotel, OperationError> {
        let result = async {
            let hotel = self.get(id).await?;
            let featured = !hotel.featured;
            let updated = self.set_fields(id, json!({ "featured": featured })).await?;
            self.audit_best_effort(id, "toggle_featured", json!({ "featured": featured }))
                .await;
            Ok::<_, OperationError>(updated)
        }
        .await;
        announce(self.notifier.as_ref(), "update featured flag", result, |hotel| {
            if hotel.featured {
                format!("Early hotel {} is now featured", hotel.name)
            } else {
                format!("Early hotel {} is no longer featured", hotel.name)
            }
        })
    }

    pub async fn quote(&self, id: &str, hours: u32) -> Result<f64, OperationError> {
        let hotel = self.get(id).await?;
        Ok(hourly_total(hotel.hourly_rate, hours, hotel.min_hours, hotel.max_hours)?)
    }

    // Images

    pub async fn images(&self, early_hotel_id: &str) -> Result<Vec<EarlyHotelImage>, OperationError> {
        Ok(self
            .backend
            .fetch(
                tables::EARLY_HOTEL_IMAGES,
                &Query::new()
                    .eq("early_hotel_id", early_hotel_id)
                    .order("display_order", true),
            )
            .await?)
    }

    // Appended at the end; the first image of a hotel becomes its primary
    pub async fn add_image(&self, early_hotel_id: &str, image_url: &str) -> Result<EarlyHotelImage, OperationError> {
        if image_url.trim().is_empty() {
            return Err(OperationError::validation("image url is required"));
        }
        self.get(early_hotel_id).await?;
        let existing = self.images(early_hotel_id).await?;
        let display_order = existing.iter().map(|i| i.display_order + 1).max().unwrap_or(0);

        let image: EarlyHotelImage = self
            .backend
            .insert_one(
                tables::EARLY_HOTEL_IMAGES,
                &json!({
                    "early_hotel_id": early_hotel_id,
                    "image_url": image_url.trim(),
                    "is_primary": existing.is_empty(),
                    "display_order": display_order,
                }),
            )
            .await?;
        info!(early_hotel_id, image_id = %image.id, "image added");
        Ok(image)
    }

    // Removing the primary image promotes the next one in display order
    pub async fn remove_image(&self, image_id: &str) -> Result<(), OperationError> {
        let image: EarlyHotelImage = self
            .backend
            .fetch_one(tables::EARLY_HOTEL_IMAGES, &Query::by_id(image_id))
            .await
            .map_err(not_found("image", image_id))?;
        self.backend
            .delete(tables::EARLY_HOTEL_IMAGES, &Query::by_id(image_id))
            .await?;

        if image.is_primary {
            if let Some(next) = self.images(&image.early_hotel_id).await?.first() {
                self.backend
                    .update(
                        tables::EARLY_HOTEL_IMAGES,
                        &Query::by_id(&next.id),
                        json!({ "is_primary": true }),
                    )
                    .await
                    .map_err(|e| OperationError::after_steps("image", image_id, &["delete"], e))?;
            }
        }
        Ok(())
    }

    // Clears every primary flag of the hotel, then sets the chosen one
    pub async fn set_primary_image(&self, early_hotel_id: &str, image_id: &str) -> Result<EarlyHotelImage, OperationError> {
        let images = self.images(early_hotel_id).await?;
        if !images.iter().any(|i| i.id == image_id) {
            return Err(OperationError::NotFound {
                entity: "image",
                id: image_id.to_string(),
            });
        }

        self.backend
            .update(
                tables::EARLY_HOTEL_IMAGES,
                &Query::new().eq("early_hotel_id", early_hotel_id),
                json!({ "is_primary": false }),
            )
            .await?;
        self.backend
            .update_as::<EarlyHotelImage>(
                tables::EARLY_HOTEL_IMAGES,
                &Query::by_id(image_id),
                json!({ "is_primary": true }),
            )
            .await
            .map_err(|e| OperationError::after_steps("image", image_id, &["clear_primary"], e))?
            .into_iter()
            .next()
            .ok_or_else(|| OperationError::NotFound {
                entity: "image",
                id: image_id.to_string(),
            })
    }

    // `ordered_ids` must name every image of the hotel exactly once
    pub async fn reorder_images(&self, early_hotel_id: &str, ordered_ids: &[String]) -> Result<Vec<EarlyHotelImage>, OperationError> {
        let current: HashSet<String> = self
            .images(early_hotel_id)
            .await?
            .into_iter()
            .map(|i| i.id)
            .collect();
        let requested: HashSet<String> = ordered_ids.iter().cloned().collect();
        if requested.len() != ordered_ids.len() || requested != current {
            return Err(OperationError::validation(
                "image order must list each image of the hotel once",
            ));
        }

        try_join_all(ordered_ids.iter().enumerate().map(|(position, id)| {
            let query = Query::by_id(id);
            async move {
                self.backend
                    .update(
                        tables::EARLY_HOTEL_IMAGES,
                        &query,
                        json!({ "display_order": position }),
                    )
                    .await
            }
        }))
        .await?;
        self.images(early_hotel_id).await
    }

    // FAQs

    pub async fn faqs(&self, early_hotel_id: &str) -> Result<Vec<EarlyHotelFaq>, OperationError> {
        Ok(self
            .backend
            .fetch(
                tables::EARLY_HOTEL_FAQS,
                &Query::new()
                    .eq("early_hotel_id", early_hotel_id)
                    .order("display_order", true),
            )
            .await?)
    }

    pub async fn add_faq(&self, early_hotel_id: &str, question: &str, answer: &str) -> Result<EarlyHotelFaq, OperationError> {
        if question.trim().is_empty() || answer.trim().is_empty() {
            return Err(OperationError::validation("question and answer are required"));
        }
        self.get(early_hotel_id).await?;
        let display_order = self
            .faqs(early_hotel_id)
            .await?
            .iter()
            .map(|f| f.display_order + 1)
            .max()
            .unwrap_or(0);

        Ok(self
            .backend
            .insert_one(
                tables::EARLY_HOTEL_FAQS,
                &json!({
                    "early_hotel_id": early_hotel_id,
                    "question": question.trim(),
                    "answer": answer.trim(),
                    "display_order": display_order,
                }),
            )
            .await?)
    }

    pub async fn update_faq(&self, faq_id: &str, question: &str, answer: &str) -> Result<EarlyHotelFaq, OperationError> {
        if question.trim().is_empty() || answer.trim().is_empty() {
            return Err(OperationError::validation("question and answer are required"));
        }
        self.backend
            .update_as::<EarlyHotelFaq>(
                tables::EARLY_HOTEL_FAQS,
                &Query::by_id(faq_id),
                json!({ "question": question.trim(), "answer": answer.trim() }),
            )
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OperationError::NotFound {
                entity: "faq",
                id: faq_id.to_string(),
            })
    }

    pub async fn delete_faq(&self, faq_id: &str) -> Result<(), OperationError> {
        match self
            .backend
            .delete(tables::EARLY_HOTEL_FAQS, &Query::by_id(faq_id))
            .await?
        {
            0 => Err(OperationError::NotFound {
                entity: "faq",
                id: faq_id.to_string(),
            }),
            _ => Ok(()),
        }
    }

    // Availability

    // Insert or replace the row for one day
    pub async fn set_availability(
        &self,
        early_hotel_id: &str,
        date: NaiveDate,
        available_hours: u32,
        is_available: bool,
    ) -> Result<EarlyHotelAvailability, OperationError> {
        if available_hours > MAX_BOOKABLE_HOURS {
            return Err(OperationError::validation(format!(
                "at most {} hours can be available in a day",
                MAX_BOOKABLE_HOURS
            )));
        }
        let day = Query::new()
            .eq("early_hotel_id", early_hotel_id)
            .eq("date", date.to_string());
        let patch = json!({
            "early_hotel_id": early_hotel_id,
            "date": date,
            "available_hours": available_hours,
            "is_available": is_available,
        });

        let existing = self.backend.select(tables::EARLY_HOTEL_AVAILABILITY, &day).await?;
        let row = if existing.is_empty() {
            self.backend
                .insert_one(tables::EARLY_HOTEL_AVAILABILITY, &patch)
                .await?
        } else {
            self.backend
                .update_as::<EarlyHotelAvailability>(tables::EARLY_HOTEL_AVAILABILITY, &day, patch)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| OperationError::NotFound {
                    entity: "availability",
                    id: format!("{}@{}", early_hotel_id, date),
                })?
        };
        info!(early_hotel_id, %date, available_hours, is_available, "availability set");
        Ok(row)
    }

    // Rows for `from..=to`, earliest first
    pub async fn availability(
        &self,
        early_hotel_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<EarlyHotelAvailability>, OperationError> {
        Ok(self
            .backend
            .fetch(
                tables::EARLY_HOTEL_AVAILABILITY,
                &Query::new()
                    .eq("early_hotel_id", early_hotel_id)
                    .gte("date", from.to_string())
                    .lte("date", to.to_string())
                    .order("date", true),
            )
            .await?)
    }

    // A day with no availability row is open for up to max_hours
    pub async fn is_bookable(&self, early_hotel_id: &str, date: NaiveDate, hours: u32) -> Result<bool, OperationError> {
        let hotel = self.get(early_hotel_id).await?;
        if hours < hotel.min_hours || hours > hotel.max_hours {
            return Ok(false);
        }
        let day = self.availability(early_hotel_id, date, date).await?;
        Ok(day
            .first()
            .map_or(true, |row| row.is_available && hours <= row.available_hours))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::models::HotelStatus;
    use crate::notify::MemoryNotifier;
    use test_case::test_case;

    type Ops = EarlyHotelOperations<MemoryStore, MemoryNotifier>;

    fn setup() -> (Arc<MemoryStore>, Ops) {
        let store = Arc::new(MemoryStore::new());
        let ops = EarlyHotelOperations::new(Arc::clone(&store), Arc::new(MemoryNotifier::new()), "admin");
        (store, ops)
    }

    fn draft() -> EarlyHotelDraft {
        EarlyHotelDraft {
            name: "Airport Rest Pods".to_string(),
            location: "Lisbon Airport".to_string(),
            description: None,
            stars: 3,
            hourly_rate: 18.0,
            min_hours: 3,
            max_hours: 12,
            amenities: vec!["shower".to_string()],
            status: HotelStatus::Active,
            featured: false,
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test_case(18.0, 1, 24, true; "#1 full day range")]
    #[test_case(0.0, 3, 3, true; "#2 free single length")]
    #[test_case(-1.0, 3, 12, false; "#3 negative rate")]
    #[test_case(18.0, 0, 12, false; "#4 zero minimum")]
    #[test_case(18.0, 6, 4, false; "#5 min above max")]
    #[test_case(18.0, 3, 25, false; "#6 more than a day")]
    fn test_validate_early_draft(rate: f64, min_hours: u32, max_hours: u32, valid: bool) {
        let mut d = draft();
        d.hourly_rate = rate;
        d.min_hours = min_hours;
        d.max_hours = max_hours;
        assert_eq!(validate_early_draft(&d).is_ok(), valid);
    }

    #[tokio::test]
    async fn test_add_edit_and_toggle() {
        let (_store, ops) = setup();
        let hotel = ops.add(&draft()).await.unwrap();
        assert_eq!(hotel.slug, "airport-rest-pods");

        let second = ops.add(&draft()).await.unwrap();
        assert_eq!(second.slug, "airport-rest-pods-2");

        let mut changed = draft();
        changed.hourly_rate = 22.5;
        let edited = ops.edit(&hotel.id, &changed).await.unwrap();
        assert_eq!(edited.hourly_rate, 22.5);
        assert_eq!(edited.slug, "airport-rest-pods");

        assert!(ops.toggle_featured(&hotel.id).await.unwrap().featured);
        assert_eq!(ops.toggle_status(&hotel.id).await.unwrap().status, HotelStatus::Inactive);
        assert_eq!(ops.quote(&hotel.id, 4).await.unwrap(), 90.0);
        assert!(ops.quote(&hotel.id, 13).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_hotel_and_image_are_not_found() {
        let (_store, ops) = setup();
        assert!(matches!(
            ops.get("missing").await,
            Err(OperationError::NotFound { entity: "early hotel", .. })
        ));
        assert!(matches!(
            ops.remove_image("missing").await,
            Err(OperationError::NotFound { entity: "image", .. })
        ));
    }

    #[tokio::test]
    async fn test_name_without_ascii_gets_fallback_slug() {
        let (_store, ops) = setup();
        let mut d = draft();
        d.name = "東京旅館".to_string();

        let first = ops.add(&d).await.unwrap();
        let second = ops.add(&d).await.unwrap();
        assert_eq!(first.slug, "early-hotel");
        assert_eq!(second.slug, "early-hotel-2");
    }

    #[tokio::test]
    async fn test_exactly_one_primary_image() {
        let (_store, ops) = setup();
        let hotel = ops.add(&draft()).await.unwrap();
        let first = ops.add_image(&hotel.id, "https://img/1.jpg").await.unwrap();
        let second = ops.add_image(&hotel.id, "https://img/2.jpg").await.unwrap();
        let third = ops.add_image(&hotel.id, "https://img/3.jpg").await.unwrap();
        assert!(first.is_primary);
        assert!(!second.is_primary);
        assert_eq!(third.display_order, 2);

        ops.set_primary_image(&hotel.id, &third.id).await.unwrap();
        let images = ops.images(&hotel.id).await.unwrap();
        let primaries: Vec<&str> = images.iter().filter(|i| i.is_primary).map(|i| i.id.as_str()).collect();
        assert_eq!(primaries, vec![third.id.as_str()]);

        // Removing the primary promotes the first remaining image
        ops.remove_image(&third.id).await.unwrap();
        let images = ops.images(&hotel.id).await.unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images.iter().filter(|i| i.is_primary).count(), 1);
        assert!(images[0].is_primary);
    }

    #[tokio::test]
    async fn test_reorder_images() {
        let (_store, ops) = setup();
        let hotel = ops.add(&draft()).await.unwrap();
        let a = ops.add_image(&hotel.id, "a.jpg").await.unwrap();
        let b = ops.add_image(&hotel.id, "b.jpg").await.unwrap();
        let c = ops.add_image(&hotel.id, "c.jpg").await.unwrap();

        let order = vec![c.id.clone(), a.id.clone(), b.id.clone()];
        let reordered = ops.reorder_images(&hotel.id, &order).await.unwrap();
        let urls: Vec<&str> = reordered.iter().map(|i| i.image_url.as_str()).collect();
        assert_eq!(urls, vec!["c.jpg", "a.jpg", "b.jpg"]);

        let incomplete = vec![c.id.clone(), a.id.clone()];
        assert!(matches!(
            ops.reorder_images(&hotel.id, &incomplete).await,
            Err(OperationError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_faqs_in_display_order() {
        let (_store, ops) = setup();
        let hotel = ops.add(&draft()).await.unwrap();
        let first = ops.add_faq(&hotel.id, "Is there a shower?", "Yes").await.unwrap();
        ops.add_faq(&hotel.id, "Earliest check-in?", "05:00").await.unwrap();

        ops.update_faq(&first.id, "Are showers included?", "Yes, towels too").await.unwrap();
        let faqs = ops.faqs(&hotel.id).await.unwrap();
        assert_eq!(faqs.len(), 2);
        assert_eq!(faqs[0].question, "Are showers included?");
        assert_eq!(faqs[1].display_order, 1);

        ops.delete_faq(&first.id).await.unwrap();
        assert!(matches!(
            ops.delete_faq(&first.id).await,
            Err(OperationError::NotFound { entity: "faq", .. })
        ));
    }

    #[tokio::test]
    async fn test_availability_and_bookability() {
        let (_store, ops) = setup();
        let hotel = ops.add(&draft()).await.unwrap();

        ops.set_availability(&hotel.id, date("2025-07-01"), 6, true).await.unwrap();
        ops.set_availability(&hotel.id, date("2025-07-02"), 12, false).await.unwrap();
        // Replaces rather than duplicates the day
        ops.set_availability(&hotel.id, date("2025-07-01"), 8, true).await.unwrap();

        let rows = ops
            .availability(&hotel.id, date("2025-07-01"), date("2025-07-31"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].available_hours, 8);

        assert!(ops.is_bookable(&hotel.id, date("2025-07-01"), 8).await.unwrap());
        assert!(!ops.is_bookable(&hotel.id, date("2025-07-01"), 9).await.unwrap());
        assert!(!ops.is_bookable(&hotel.id, date("2025-07-02"), 4).await.unwrap());
        // No row for the day: open up to max_hours
        assert!(ops.is_bookable(&hotel.id, date("2025-07-03"), 12).await.unwrap());
        assert!(!ops.is_bookable(&hotel.id, date("2025-07-03"), 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_sub_resources() {
        let (store, ops) = setup();
        let hotel = ops.add(&draft()).await.unwrap();
        ops.add_image(&hotel.id, "a.jpg").await.unwrap();
        ops.add_faq(&hotel.id, "Q", "A").await.unwrap();
        ops.set_availability(&hotel.id, date("2025-07-01"), 6, true).await.unwrap();

        ops.delete(&hotel.id).await.unwrap();
        for table in [
            tables::EARLY_HOTELS,
            tables::EARLY_HOTEL_IMAGES,
            tables::EARLY_HOTEL_FAQS,
            tables::EARLY_HOTEL_AVAILABILITY,
        ] {
            assert!(store.rows(table).is_empty(), "{} not cleared", table);
        }
    }
}
