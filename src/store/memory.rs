//! In-process store backed by concurrent maps.
//!
//! Used by tests and by `STORE_BACKEND=memory` local runs. Failure injection
//! per operation lets tests exercise the partial-success paths.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use dashmap::{DashMap, DashSet};
use serde_json::Value;
use tracing::debug;

use super::query::{Filter, Query, Record};
use super::{Collection, Operation, Store};
use crate::error::StoreError;

/// Configuration for in-process store behavior.
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreConfig {
    /// Simulated latency in milliseconds for every call.
    pub latency_ms: u64,
    /// Operations that fail from the start.
    pub failing: Vec<Operation>,
}

/// In-process [`Store`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: Arc<DashMap<Collection, Vec<Record>>>,
    failing: Arc<DashSet<Operation>>,
    latency_ms: u64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with custom configuration.
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        let store = Self {
            latency_ms: config.latency_ms,
            ..Self::default()
        };
        for op in config.failing {
            store.fail(op);
        }
        store
    }

    /// Make every subsequent call of `op` fail.
    pub fn fail(&self, op: Operation) {
        self.failing.insert(op);
    }

    /// Stop failing `op`.
    pub fn recover(&self, op: Operation) {
        self.failing.remove(&op);
    }

    /// Seed a record verbatim, bypassing failure injection and stamping.
    pub fn seed(&self, collection: Collection, record: Record) {
        self.rows.entry(collection).or_default().push(record);
    }

    /// Snapshot of every record in a collection.
    pub fn records(&self, collection: Collection) -> Vec<Record> {
        self.rows
            .get(&collection)
            .map(|rows| rows.value().clone())
            .unwrap_or_default()
    }

    async fn enter(&self, op: Operation, collection: Collection) -> Result<(), StoreError> {
        if self.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;
        }
        if self.failing.contains(&op) {
            return Err(StoreError::Unavailable(format!(
                "injected {} failure on {}",
                op, collection
            )));
        }
        Ok(())
    }
}

fn matches_all(filters: &[Filter], record: &Record) -> bool {
    filters.iter().all(|f| f.matches(record))
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert(&self, collection: Collection, mut record: Record) -> Result<Record, StoreError> {
        self.enter(Operation::Insert, collection).await?;

        record
            .entry("id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
        record.entry("created_at").or_insert_with(|| {
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false))
        });

        self.rows.entry(collection).or_default().push(record.clone());
        debug!(%collection, "record inserted");
        Ok(record)
    }

    async fn fetch(&self, collection: Collection, query: &Query) -> Result<Vec<Record>, StoreError> {
        self.enter(Operation::Fetch, collection).await?;

        let matched: Vec<Record> = self
            .rows
            .get(&collection)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();

        Ok(query.apply_modifiers(matched))
    }

    async fn update(
        &self,
        collection: Collection,
        fields: Record,
        filters: &[Filter],
    ) -> Result<Vec<Record>, StoreError> {
        self.enter(Operation::Update, collection).await?;

        let mut updated = Vec::new();
        if let Some(mut rows) = self.rows.get_mut(&collection) {
            for row in rows.iter_mut().filter(|r| matches_all(filters, r)) {
                for (key, value) in &fields {
                    row.insert(key.clone(), value.clone());
                }
                updated.push(row.clone());
            }
        }
        debug!(%collection, rows = updated.len(), "records updated");
        Ok(updated)
    }

    async fn delete(
        &self,
        collection: Collection,
        filters: &[Filter],
    ) -> Result<Vec<Record>, StoreError> {
        self.enter(Operation::Delete, collection).await?;

        let mut deleted = Vec::new();
        if let Some(mut rows) = self.rows.get_mut(&collection) {
            let (gone, kept): (Vec<Record>, Vec<Record>) =
                rows.drain(..).partition(|r| matches_all(filters, r));
            *rows = kept;
            deleted = gone;
        }
        Ok(deleted)
    }
}
