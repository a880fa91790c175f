// Data access layer for the hosted relational backend
// Rows travel as JSON objects keyed by column name; typed access goes through BackendExt

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

// Error types for backend calls
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status_code} - {message}")]
    Api { status_code: u16, message: String },

    #[error("No row in {table} matched the query")]
    NotFound { table: String },

    #[error("Could not decode row from {table}: {message}")]
    Decode { table: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BackendError {
    // Transient failures worth another attempt on idempotent reads
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Network(_) | BackendError::Timeout(_) => true,
            BackendError::Api { status_code, .. } => *status_code == 429 || *status_code >= 500,
            _ => false,
        }
    }
}

// Retry policy for reads; writes are never retried
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 100,
            max_backoff_ms: 2000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    // Exponential backoff with jitter for the given retry attempt (0-based)
    pub fn backoff(&self, retry_attempt: u32) -> Duration {
        let base_backoff_ms = (self.initial_backoff_ms as f64
            * self.backoff_multiplier.powf(retry_attempt as f64))
        .min(self.max_backoff_ms as f64);

        let jitter = rand::random::<f64>() * self.jitter_factor * base_backoff_ms;
        let backoff_ms = base_backoff_ms * (1.0 - self.jitter_factor / 2.0) + jitter;

        Duration::from_millis(backoff_ms as u64)
    }
}

// Connection settings for the hosted backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub retry: RetryConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            timeout_ms: 10_000,
            retry: RetryConfig::default(),
        }
    }
}

impl BackendConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.api_key.is_empty()
    }
}

// A single column predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
    Gte(String, Value),
    Lte(String, Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

// Row-level query: column filters are AND-ed together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub columns: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: &str) -> Self {
        Self::new().eq("id", id)
    }

    // Column list in the backend's select syntax, e.g. "*, hotels(name)"
    pub fn select(mut self, columns: &str) -> Self {
        self.columns = Some(columns.to_string());
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn in_list<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.filters.push(Filter::In(column.to_string(), values));
        self
    }

    pub fn gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Gte(column.to_string(), value.into()));
        self
    }

    pub fn lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Lte(column.to_string(), value.into()));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    // Evaluate the filters against a JSON row
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|filter| match filter {
            Filter::Eq(column, expected) => row.get(column).map_or(expected.is_null(), |v| v == expected),
            Filter::In(column, values) => row.get(column).map_or(false, |v| values.contains(v)),
            Filter::Gte(column, bound) => row
                .get(column)
                .and_then(|v| compare_values(v, bound))
                .map_or(false, |ord| ord != Ordering::Less),
            Filter::Lte(column, bound) => row
                .get(column)
                .and_then(|v| compare_values(v, bound))
                .map_or(false, |ord| ord != Ordering::Greater),
        })
    }

    // Encode as query-string pairs in the backend's REST dialect
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(columns) = &self.columns {
            params.push(("select".to_string(), columns.replace(' ', "")));
        }
        for filter in &self.filters {
            let (column, encoded) = match filter {
                Filter::Eq(column, value) => (column, format!("eq.{}", param_value(value))),
                Filter::In(column, values) => {
                    let list: Vec<String> = values.iter().map(list_value).collect();
                    (column, format!("in.({})", list.join(",")))
                }
                Filter::Gte(column, value) => (column, format!("gte.{}", param_value(value))),
                Filter::Lte(column, value) => (column, format!("lte.{}", param_value(value))),
            };
            params.push((column.clone(), encoded));
        }
        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

// Numbers compare numerically, strings lexically (ISO dates sort correctly)
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn param_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn list_value(value: &Value) -> String {
    match value {
        Value::String(s) if s.contains([',', '(', ')', '"']) => {
            format!("\"{}\"", s.replace('"', "\\\""))
        }
        other => param_value(other),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

// Real-time notification that a table changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
}

// Counters shared by backend implementations
#[derive(Debug, Default)]
pub struct BackendCounters {
    pub requests_sent: AtomicUsize,
    pub requests_succeeded: AtomicUsize,
    pub requests_failed: AtomicUsize,
    pub requests_retried: AtomicUsize,
    pub selects: AtomicUsize,
    pub inserts: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackendStats {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
    pub requests_retried: usize,
    pub selects: usize,
    pub inserts: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl BackendCounters {
    pub fn record_outcome<T>(&self, result: &Result<T, BackendError>) {
        self.requests_sent.fetch_add(1, AtomicOrdering::SeqCst);
        match result {
            Ok(_) => self.requests_succeeded.fetch_add(1, AtomicOrdering::SeqCst),
            Err(_) => self.requests_failed.fetch_add(1, AtomicOrdering::SeqCst),
        };
    }

    pub fn report(&self) -> BackendStats {
        BackendStats {
            requests_sent: self.requests_sent.load(AtomicOrdering::SeqCst),
            requests_succeeded: self.requests_succeeded.load(AtomicOrdering::SeqCst),
            requests_failed: self.requests_failed.load(AtomicOrdering::SeqCst),
            requests_retried: self.requests_retried.load(AtomicOrdering::SeqCst),
            selects: self.selects.load(AtomicOrdering::SeqCst),
            inserts: self.inserts.load(AtomicOrdering::SeqCst),
            updates: self.updates.load(AtomicOrdering::SeqCst),
            deletes: self.deletes.load(AtomicOrdering::SeqCst),
        }
    }
}

// Table-level access to the hosted backend
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    // Rows matching the query
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, BackendError>;

    // Insert rows; the backend fills in id and created_at and returns the stored rows
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, BackendError>;

    // Merge the patch into every matching row, returning the updated rows
    async fn update(&self, table: &str, query: &Query, patch: Value) -> Result<Vec<Value>, BackendError>;

    // Delete matching rows, returning how many were removed
    async fn delete(&self, table: &str, query: &Query) -> Result<usize, BackendError>;

    // Change notifications for a table
    fn subscribe(&self, table: &str) -> broadcast::Receiver<ChangeEvent>;

    fn stats(&self) -> BackendStats;
}

fn decode<T: DeserializeOwned>(table: &str, row: Value) -> Result<T, BackendError> {
    serde_json::from_value(row).map_err(|e| BackendError::Decode {
        table: table.to_string(),
        message: e.to_string(),
    })
}

fn encode<R: Serialize>(table: &str, row: &R) -> Result<Value, BackendError> {
    serde_json::to_value(row).map_err(|e| BackendError::Decode {
        table: table.to_string(),
        message: e.to_string(),
    })
}

// Typed helpers over the row-level API
#[async_trait]
pub trait BackendExt: Backend {
    async fn fetch<T>(&self, table: &str, query: &Query) -> Result<Vec<T>, BackendError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let rows = self.select(table, query).await?;
        rows.into_iter().map(|row| decode(table, row)).collect()
    }

    async fn fetch_one<T>(&self, table: &str, query: &Query) -> Result<T, BackendError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let query = query.clone().limit(1);
        let row = self
            .select(table, &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound {
                table: table.to_string(),
            })?;
        decode(table, row)
    }

    async fn insert_one<T, R>(&self, table: &str, row: &R) -> Result<T, BackendError>
    where
        T: DeserializeOwned + Send + 'static,
        R: Serialize + Sync,
    {
        let value = encode(table, row)?;
        let stored = self
            .insert(table, vec![value])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound {
                table: table.to_string(),
            })?;
        decode(table, stored)
    }

    async fn insert_all<T, R>(&self, table: &str, rows: &[R]) -> Result<Vec<T>, BackendError>
    where
        T: DeserializeOwned + Send + 'static,
        R: Serialize + Sync,
    {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let values = rows
            .iter()
            .map(|row| encode(table, row))
            .collect::<Result<Vec<_>, _>>()?;
        let stored = self.insert(table, values).await?;
        stored.into_iter().map(|row| decode(table, row)).collect()
    }

    async fn update_as<T>(&self, table: &str, query: &Query, patch: Value) -> Result<Vec<T>, BackendError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let rows = self.update(table, query, patch).await?;
        rows.into_iter().map(|row| decode(table, row)).collect()
    }
}

impl<B: Backend + ?Sized> BackendExt for B {}
