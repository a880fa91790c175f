// Audit log and version history for hotel records

use crate::backend::{Backend, BackendError, BackendExt, Query};
use crate::error::OperationError;
use crate::models::{tables, AuditLog, Hotel, HotelVersion};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::info;

// Columns a version restore writes back; ids and timestamps stay untouched
pub const RESTORABLE_FIELDS: [&str; 10] = [
    "name",
    "slug",
    "location",
    "description",
    "stars",
    "price_per_night",
    "amenities",
    "gallery",
    "status",
    "featured",
];

pub struct AuditTrail<B: Backend + ?Sized> {
    backend: Arc<B>,
}

impl<B: Backend + ?Sized> Clone for AuditTrail<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: Backend + ?Sized> AuditTrail<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub async fn record(
        &self,
        hotel_id: Option<&str>,
        action: &str,
        actor: &str,
        details: Value,
    ) -> Result<AuditLog, BackendError> {
        info!(hotel_id, action, actor, "audit");
        self.backend
            .insert_one(
                tables::AUDIT_LOGS,
                &json!({
                    "hotel_id": hotel_id,
                    "action": action,
                    "actor": actor,
                    "details": details,
                }),
            )
            .await
    }

    pub async fn record_many(
        &self,
        hotel_ids: &[String],
        action: &str,
        actor: &str,
        details: Value,
    ) -> Result<Vec<AuditLog>, BackendError> {
        let rows: Vec<Value> = hotel_ids
            .iter()
            .map(|id| {
                json!({
                    "hotel_id": id,
                    "action": action,
                    "actor": actor,
                    "details": details,
                })
            })
            .collect();
        self.backend.insert_all(tables::AUDIT_LOGS, &rows).await
    }

    // Newest first
    pub async fn history(&self, hotel_id: &str) -> Result<Vec<AuditLog>, BackendError> {
        self.backend
            .fetch(
                tables::AUDIT_LOGS,
                &Query::new().eq("hotel_id", hotel_id).order("created_at", false),
            )
            .await
    }

    pub async fn versions(&self, hotel_id: &str) -> Result<Vec<HotelVersion>, BackendError> {
        self.backend
            .fetch(
                tables::HOTEL_VERSIONS,
                &Query::new()
                    .eq("hotel_id", hotel_id)
                    .order("version_number", false),
            )
            .await
    }

    // Store the hotel as it is now under the next version number
    pub async fn snapshot(&self, hotel: &Hotel, actor: &str) -> Result<HotelVersion, BackendError> {
        let latest = self
            .backend
            .fetch::<HotelVersion>(
                tables::HOTEL_VERSIONS,
                &Query::new()
                    .eq("hotel_id", hotel.id.as_str())
                    .order("version_number", false)
                    .limit(1),
            )
            .await?;
        let version_number = latest.first().map_or(1, |v| v.version_number + 1);
        let snapshot = serde_json::to_value(hotel).map_err(|e| BackendError::Decode {
            table: tables::HOTELS.to_string(),
            message: e.to_string(),
        })?;

        self.backend
            .insert_one(
                tables::HOTEL_VERSIONS,
                &json!({
                    "hotel_id": hotel.id,
                    "version_number": version_number,
                    "snapshot": snapshot,
                    "changed_by": actor,
                }),
            )
            .await
    }

    // Manual rollback: write a stored snapshot back onto the hotel. The
    // current state is snapshotted first so the restore can itself be undone.
    pub async fn restore(&self, hotel_id: &str, version_number: u32, actor: &str) -> Result<Hotel, OperationError> {
        let version = self
            .backend
            .fetch::<HotelVersion>(
                tables::HOTEL_VERSIONS,
                &Query::new()
                    .eq("hotel_id", hotel_id)
                    .eq("version_number", version_number),
            )
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OperationError::NotFound {
                entity: "hotel version",
                id: format!("{}#{}", hotel_id, version_number),
            })?;

        let current: Hotel = self
            .backend
            .fetch_one(tables::HOTELS, &Query::by_id(hotel_id))
            .await?;
        self.snapshot(&current, actor).await?;

        let mut patch = Map::new();
        for field in RESTORABLE_FIELDS {
            if let Some(value) = version.snapshot.get(field) {
                patch.insert(field.to_string(), value.clone());
            }
        }
        let restored: Hotel = self
            .backend
            .update_as::<Hotel>(tables::HOTELS, &Query::by_id(hotel_id), Value::Object(patch))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OperationError::NotFound {
                entity: "hotel",
                id: hotel_id.to_string(),
            })?;

        self.record(
            Some(hotel_id),
            "restore_version",
            actor,
            json!({ "version_number": version_number }),
        )
        .await?;
        Ok(restored)
    }
}

// Top-level keys whose values differ between two snapshots, sorted
pub fn changed_fields(before: &Value, after: &Value) -> Vec<String> {
    let empty = Map::new();
    let before = before.as_object().unwrap_or(&empty);
    let after = after.as_object().unwrap_or(&empty);

    let mut changed: Vec<String> = before
        .keys()
        .chain(after.keys())
        .filter(|key| before.get(*key) != after.get(*key))
        .cloned()
        .collect();
    changed.sort();
    changed.dedup();
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;

    fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            tables::HOTELS,
            vec![json!({
                "id": "h1",
                "name": "Harbour View",
                "slug": "harbour-view",
                "location": "Lisbon",
                "stars": 4,
                "price_per_night": 150.0,
                "status": "active",
                "featured": false
            })],
        );
        store
    }

    #[tokio::test]
    async fn test_snapshot_numbers_versions_per_hotel() {
        let store = seeded();
        let trail = AuditTrail::new(Arc::clone(&store));
        let hotel: Hotel = store.fetch_one(tables::HOTELS, &Query::by_id("h1")).await.unwrap();

        assert_eq!(trail.snapshot(&hotel, "admin").await.unwrap().version_number, 1);
        assert_eq!(trail.snapshot(&hotel, "admin").await.unwrap().version_number, 2);

        let versions = trail.versions("h1").await.unwrap();
        assert_eq!(versions.iter().map(|v| v.version_number).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_restore_writes_snapshot_back() {
        let store = seeded();
        let trail = AuditTrail::new(Arc::clone(&store));
        let original: Hotel = store.fetch_one(tables::HOTELS, &Query::by_id("h1")).await.unwrap();
        trail.snapshot(&original, "admin").await.unwrap();

        store
            .update(
                tables::HOTELS,
                &Query::by_id("h1"),
                json!({"name": "Harbour View Deluxe", "price_per_night": 220.0}),
            )
            .await
            .unwrap();

        let restored = trail.restore("h1", 1, "admin").await.unwrap();
        assert_eq!(restored.name, "Harbour View");
        assert_eq!(restored.price_per_night, 150.0);

        // The overwritten state was kept as version 2
        let versions = trail.versions("h1").await.unwrap();
        assert_eq!(versions[0].snapshot["name"], "Harbour View Deluxe");

        let history = trail.history("h1").await.unwrap();
        assert_eq!(history[0].action, "restore_version");
    }

    #[tokio::test]
    async fn test_restore_unknown_version() {
        let trail = AuditTrail::new(seeded());
        let err = trail.restore("h1", 9, "admin").await.unwrap_err();
        assert!(matches!(err, OperationError::NotFound { entity: "hotel version", .. }));
    }

    #[test]
    fn test_changed_fields() {
        let before = json!({"name": "A", "stars": 3, "featured": false});
        let after = json!({"name": "B", "stars": 3, "gallery": []});
        assert_eq!(changed_fields(&before, &after), vec!["featured", "gallery", "name"]);
    }
}
