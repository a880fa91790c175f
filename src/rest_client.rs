// REST client for the hosted backend
// Speaks the backend's table API: {url}/rest/v1/{table}?column=op.value

use crate::backend::{Backend, BackendConfig, BackendCounters, BackendError, BackendStats, ChangeEvent, ChangeKind, Query};
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

pub struct RestClient {
    http: reqwest::Client,
    config: BackendConfig,
    counters: BackendCounters,
    channels: DashMap<String, broadcast::Sender<ChangeEvent>>,
}

impl RestClient {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        if !config.is_configured() {
            return Err(BackendError::Config(
                "backend url and api_key must both be set".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| BackendError::Config(format!("invalid api key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|e| BackendError::Config(format!("invalid api key: {}", e)))?;
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;

        Ok(Self {
            http,
            config,
            counters: BackendCounters::default(),
            channels: DashMap::new(),
        })
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), table)
    }

    fn request(&self, method: Method, table: &str, query: &Query) -> RequestBuilder {
        self.http
            .request(method, self.table_url(table))
            .query(&query.to_params())
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Vec<Value>, BackendError> {
        let result = self.send(request).await;
        self.counters.record_outcome(&result);
        result
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<Value>, BackendError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(self.config.timeout_ms)
            } else {
                BackendError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status_code: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Array(rows)) => Ok(rows),
            Ok(other) => Ok(vec![other]),
            Err(e) => Err(BackendError::Decode {
                table: String::new(),
                message: e.to_string(),
            }),
        }
    }

    // Writes return the stored representation so callers see ids and defaults
    fn write(&self, method: Method, table: &str, query: &Query) -> RequestBuilder {
        self.request(method, table, query)
            .header("Prefer", "return=representation")
    }

    fn publish(&self, table: &str, kind: ChangeKind) {
        if let Some(sender) = self.channels.get(table) {
            let _ = sender.send(ChangeEvent {
                table: table.to_string(),
                kind,
            });
        }
    }
}

#[async_trait]
impl Backend for RestClient {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, BackendError> {
        self.counters.selects.fetch_add(1, Ordering::SeqCst);
        let retry = &self.config.retry;
        let mut attempt = 0;
        loop {
            debug!(table, attempt, "select");
            match self.execute(self.request(Method::GET, table, query)).await {
                Ok(rows) => return Ok(rows),
                Err(e) if e.is_retryable() && attempt < retry.max_retries => {
                    let backoff = retry.backoff(attempt);
                    warn!(table, attempt, error = %e, "select failed, retrying in {:?}", backoff);
                    self.counters.requests_retried.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, BackendError> {
        self.counters.inserts.fetch_add(1, Ordering::SeqCst);
        debug!(table, count = rows.len(), "insert");
        let request = self
            .write(Method::POST, table, &Query::new())
            .json(&Value::Array(rows));
        let stored = self.execute(request).await?;
        self.publish(table, ChangeKind::Insert);
        Ok(stored)
    }

    async fn update(&self, table: &str, query: &Query, patch: Value) -> Result<Vec<Value>, BackendError> {
        self.counters.updates.fetch_add(1, Ordering::SeqCst);
        debug!(table, "update");
        let request = self.write(Method::PATCH, table, query).json(&patch);
        let updated = self.execute(request).await?;
        if !updated.is_empty() {
            self.publish(table, ChangeKind::Update);
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<usize, BackendError> {
        self.counters.deletes.fetch_add(1, Ordering::SeqCst);
        debug!(table, "delete");
        let removed = self.execute(self.write(Method::DELETE, table, query)).await?;
        if !removed.is_empty() {
            self.publish(table, ChangeKind::Delete);
        }
        Ok(removed.len())
    }

    // Only writes made through this client are observed
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
