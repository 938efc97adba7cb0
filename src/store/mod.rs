//! Persistence collaborator.
//!
//! This module handles:
//! - The [`Store`] trait every backend implements
//! - Filter and modifier types shared by backends
//! - An in-process store for tests and local runs
//! - A REST store for the hosted PostgREST database

pub mod memory;
pub mod query;
pub mod rest;

use async_trait::async_trait;
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

use crate::error::StoreError;

pub use memory::{MemoryStore, MemoryStoreConfig};
pub use query::{Direction, Filter, FilterOp, Modifiers, Query, Record};
pub use rest::RestStore;

/// Collections the service reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Collection {
    /// Athlete rows carrying status, injury dates and team linkage.
    Athletes,
    /// Submitted health reports.
    Reports,
}

/// Store operation name, used for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    /// Insert one record.
    Insert,
    /// Read matching records.
    Fetch,
    /// Update matching records.
    Update,
    /// Delete matching records.
    Delete,
}

/// Insert/fetch/update/delete-by-filter over named collections.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a record and return it as stored.
    async fn insert(&self, collection: Collection, record: Record) -> Result<Record, StoreError>;

    /// Fetch records matching a query.
    async fn fetch(&self, collection: Collection, query: &Query) -> Result<Vec<Record>, StoreError>;

    /// Set `fields` on every record matching `filters`; returns updated rows.
    async fn update(
        &self,
        collection: Collection,
        fields: Record,
        filters: &[Filter],
    ) -> Result<Vec<Record>, StoreError>;

    /// Delete every record matching `filters`; returns deleted rows.
    async fn delete(
        &self,
        collection: Collection,
        filters: &[Filter],
    ) -> Result<Vec<Record>, StoreError>;
}

/// Convert any serializable value into a [`Record`].
pub fn to_record<T: serde::Serialize>(value: &T) -> Result<Record, StoreError> {
    match serde_json::to_value(value).map_err(|e| StoreError::Parse(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Parse(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Decode a [`Record`] into a typed row.
pub fn from_record<T: serde::de::DeserializeOwned>(record: Record) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(record)).map_err(|e| StoreError::Parse(e.to_string()))
}
