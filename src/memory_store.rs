// In-process stand-in for the hosted backend
// Used by tests, benchmarks and offline demos; supports injected failures

use crate::backend::{compare_values, Backend, BackendCounters, BackendError, BackendStats, ChangeEvent, ChangeKind, Query};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use tokio::sync::broadcast;
use uuid::Uuid;

const CHANGE_CHANNEL_CAPACITY: usize = 256;

pub struct MemoryStore {
    tables: DashMap<String, Vec<Value>>,
    channels: DashMap<String, broadcast::Sender<ChangeEvent>>,
    counters: BackendCounters,
    fail_next_requests: AtomicUsize,
    failing_tables: Mutex<HashSet<String>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
            channels: DashMap::new(),
            counters: BackendCounters::default(),
            fail_next_requests: AtomicUsize::new(0),
            failing_tables: Mutex::new(HashSet::new()),
        }
    }

    // Seed a table directly, bypassing counters and change events
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut stored = self.tables.entry(table.to_string()).or_default();
        for row in rows {
            stored.push(with_defaults(row));
        }
    }

    // Current contents of a table
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .get(table)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    // The next `count` requests of any kind fail with a 500
    pub fn fail_next_requests(&self, count: usize) {
        self.fail_next_requests.store(count, AtomicOrdering::SeqCst);
    }

    // Every write to `table` fails with a 503 until cleared
    pub fn fail_writes_to(&self, table: &str) {
        self.failing_tables.lock().insert(table.to_string());
    }

    pub fn clear_failures(&self) {
        self.fail_next_requests.store(0, AtomicOrdering::SeqCst);
        self.failing_tables.lock().clear();
    }

    fn check_failure(&self, table: &str, is_write: bool) -> Result<(), BackendError> {
        let pending = self.fail_next_requests.load(AtomicOrdering::SeqCst);
        if pending > 0 {
            self.fail_next_requests.store(pending - 1, AtomicOrdering::SeqCst);
            return Err(BackendError::Api {
                status_code: 500,
                message: "Internal Server Error".to_string(),
            });
        }
        if is_write && self.failing_tables.lock().contains(table) {
            return Err(BackendError::Api {
                status_code: 503,
                message: format!("writes to {} are unavailable", table),
            });
        }
        Ok(())
    }

    fn publish(&self, table: &str, kind: ChangeKind) {
        if let Some(sender) = self.channels.get(table) {
            // No subscribers is not an error
            let _ = sender.send(ChangeEvent {
                table: table.to_string(),
                kind,
            });
        }
    }

    fn run<T>(&self, result: Result<T, BackendError>) -> Result<T, BackendError> {
        self.counters.record_outcome(&result);
        result
    }

    // Resolves `relation(columns)` through the `{relation}_id` foreign key,
    // so `hotels(name)` on a booking reads `hotels` where id = hotel_id.
    // A dangling key embeds null.
    fn embed(&self, rows: &mut [Value], relation: &str, columns: &[&str]) {
        let foreign_key = format!("{}_id", relation.strip_suffix('s').unwrap_or(relation));
        let related = self
            .tables
            .get(relation)
            .map(|rows| rows.value().clone())
            .unwrap_or_default();

        for row in rows.iter_mut() {
            let target = row
                .get(foreign_key.as_str())
                .and_then(|id| related.iter().find(|candidate| candidate.get("id") == Some(id)));
            let value = match target {
                Some(found) if columns.is_empty() || columns.contains(&"*") => found.clone(),
                Some(found) => Value::Object(
                    columns
                        .iter()
                        .filter_map(|column| found.get(*column).map(|v| (column.to_string(), v.clone())))
                        .collect(),
                ),
                None => Value::Null,
            };
            if let Value::Object(fields) = row {
                fields.insert(relation.to_string(), value);
            }
        }
    }
}

// Embedded relations in a select list, e.g. "*, hotels(name, location)"
fn embedded_relations(columns: &str) -> Vec<(&str, Vec<&str>)> {
    let mut relations = Vec::new();
    let mut rest = columns;
    while let Some(open) = rest.find('(') {
        let Some(len) = rest[open..].find(')') else {
            break;
        };
        let name = rest[..open].rsplit(',').next().unwrap_or_default().trim();
        let fields = rest[open + 1..open + len]
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .collect();
        if !name.is_empty() {
            relations.push((name, fields));
        }
        rest = &rest[open + len + 1..];
    }
    relations
}

fn with_defaults(mut row: Value) -> Value {
    if let Value::Object(fields) = &mut row {
        fields
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        fields
            .entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
    }
    row
}

fn merge(row: &mut Value, patch: &Value) {
    if let (Value::Object(fields), Value::Object(changes)) = (row, patch) {
        for (key, value) in changes {
            fields.insert(key.clone(), value.clone());
        }
    }
}

#[async_trait]
impl Backend for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, BackendError> {
        self.counters.selects.fetch_add(1, AtomicOrdering::SeqCst);
        let result = self.check_failure(table, false).map(|_| {
            let mut rows: Vec<Value> = self
                .tables
                .get(table)
                .map(|rows| rows.iter().filter(|row| query.matches(row)).cloned().collect())
                .unwrap_or_default();

            if let Some(order) = &query.order {
                rows.sort_by(|a, b| {
                    let ord = match (a.get(&order.column), b.get(&order.column)) {
                        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                        _ => Ordering::Equal,
                    };
                    if order.ascending {
                        ord
                    } else {
                        ord.reverse()
                    }
                });
            }
            if let Some(limit) = query.limit {
                rows.truncate(limit);
            }
            if let Some(columns) = &query.columns {
                for (relation, fields) in embedded_relations(columns) {
                    self.embed(&mut rows, relation, &fields);
                }
            }
            rows
        });
        self.run(result)
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, BackendError> {
        self.counters.inserts.fetch_add(1, AtomicOrdering::SeqCst);
        if let Err(e) = self.check_failure(table, true) {
            return self.run(Err(e));
        }
        if let Some(bad) = rows.iter().find(|row| !row.is_object()) {
            return self.run(Err(BackendError::Api {
                status_code: 400,
                message: format!("expected an object row, got {}", bad),
            }));
        }

        let inserted: Vec<Value> = rows.into_iter().map(with_defaults).collect();
        self.tables
            .entry(table.to_string())
            .or_default()
            .extend(inserted.iter().cloned());
        self.publish(table, ChangeKind::Insert);
        self.run(Ok(inserted))
    }

    async fn update(&self, table: &str, query: &Query, patch: Value) -> Result<Vec<Value>, BackendError> {
        self.counters.updates.fetch_add(1, AtomicOrdering::SeqCst);
        if let Err(e) = self.check_failure(table, true) {
            return self.run(Err(e));
        }

        let updated: Vec<Value> = match self.tables.get_mut(table) {
            Some(mut rows) => rows
                .iter_mut()
                .filter(|row| query.matches(row))
                .map(|row| {
                    merge(row, &patch);
                    row.clone()
                })
                .collect(),
            None => Vec::new(),
        };
        if !updated.is_empty() {
            self.publish(table, ChangeKind::Update);
        }
        self.run(Ok(updated))
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<usize, BackendError> {
        self.counters.deletes.fetch_add(1, AtomicOrdering::SeqCst);
        if let Err(e) = self.check_failure(table, true) {
            return self.run(Err(e));
        }

        let removed = match self.tables.get_mut(table) {
            Some(mut rows) => {
                let before = rows.len();
                rows.retain(|row| !query.matches(row));
                before - rows.len()
            }
            None => 0,
        };
        if removed > 0 {
            self.publish(table, ChangeKind::Delete);
        }
        self.run(Ok(removed))
    }

    fn subscribe(&self, table: &str) -> broadcast::Receiver<ChangeEvent> {
        self.channels
            .entry(table.to_string())
            .or_insert_with(|| broadcast::channel(CHANGE_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    fn stats(&self) -> BackendStats {
        self.counters.report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_assigns_id_and_created_at() {
        let store = MemoryStore::new();
        let rows = store
            .insert("hotels", vec![json!({"name": "Seaside"})])
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert!(rows[0]["id"].as_str().map_or(false, |id| !id.is_empty()));
        assert!(rows[0]["created_at"].is_string());
        assert_eq!(store.rows("hotels").len(), 1);
    }

    #[tokio::test]
    async fn test_select_embeds_related_rows() {
        let store = MemoryStore::new();
        store.seed(
            "hotels",
            vec![json!({"id": "h1", "name": "Harbour View", "location": "Lisbon"})],
        );
        store.seed(
            "bookings",
            vec![
                json!({"id": "b1", "hotel_id": "h1", "created_at": "2025-05-01T00:00:00Z"}),
                json!({"id": "b2", "hotel_id": "gone", "created_at": "2025-04-01T00:00:00Z"}),
            ],
        );

        let rows = store
            .select("bookings", &Query::new().select("*, hotels(name)").order("created_at", false))
            .await
            .unwrap();
        assert_eq!(rows[0]["hotels"], json!({"name": "Harbour View"}));
        assert!(rows[1]["hotels"].is_null());

        // Without an embed the row comes back as stored
        let plain = store.select("bookings", &Query::by_id("b1")).await.unwrap();
        assert!(plain[0].get("hotels").is_none());
    }

    #[test]
    fn test_embedded_relations_parses_select_list() {
        assert_eq!(
            embedded_relations("*, hotels(name, location)"),
            vec![("hotels", vec!["name", "location"])]
        );
        assert!(embedded_relations("*").is_empty());
    }

    #[tokio::test]
    async fn test_select_orders_and_limits() {
        let store = MemoryStore::new();
        store.seed(
            "rooms",
            vec![
                json!({"id": "a", "price": 80}),
                json!({"id": "b", "price": 120}),
                json!({"id": "c", "price": 100}),
            ],
        );

        let rows = store
            .select("rooms", &Query::new().order("price", false).limit(2))
            .await
            .unwrap();
        let ids: Vec<&str> = rows.iter().filter_map(|r| r["id"].as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_update_and_delete_publish_changes() {
        let store = MemoryStore::new();
        store.seed("bookings", vec![json!({"id": "b1", "booking_status": "pending"})]);
        let mut changes = store.subscribe("bookings");

        let updated = store
            .update("bookings", &Query::by_id("b1"), json!({"booking_status": "confirmed"}))
            .await
            .unwrap();
        assert_eq!(updated[0]["booking_status"], "confirmed");
        assert_eq!(changes.recv().await.unwrap().kind, ChangeKind::Update);

        let removed = store.delete("bookings", &Query::by_id("b1")).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(changes.recv().await.unwrap().kind, ChangeKind::Delete);
    }

    #[tokio::test]
    async fn test_injected_failures_are_counted() {
        let store = MemoryStore::new();
        store.fail_next_requests(1);

        let first = store.select("hotels", &Query::new()).await;
        assert!(matches!(first, Err(BackendError::Api { status_code: 500, .. })));
        tokio_test::assert_ok!(store.select("hotels", &Query::new()).await);

        store.fail_writes_to("rooms");
        let write = store.insert("rooms", vec![json!({"room_type": "Double"})]).await;
        assert!(matches!(write, Err(BackendError::Api { status_code: 503, .. })));

        let stats = store.stats();
        assert_eq!(stats.requests_sent, 3);
        assert_eq!(stats.requests_failed, 2);
        assert_eq!(stats.selects, 2);
        assert_eq!(stats.inserts, 1);
    }

    #[tokio::test]
    async fn test_fetch_one_reports_missing_rows() {
        let store = MemoryStore::new();
        let missing: Result<Value, _> = store.fetch_one("hotels", &Query::by_id("nope")).await;
        assert!(matches!(missing, Err(BackendError::NotFound { .. })));
    }
}
