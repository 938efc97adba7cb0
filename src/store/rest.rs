//! REST store for the hosted database's PostgREST interface.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use tracing::{debug, error, instrument};
use url::Url;

use super::query::{Filter, Query, Record};
use super::{Collection, Operation, Store};
use crate::config::Config;
use crate::error::StoreError;
use crate::metrics;

/// PostgREST-backed [`Store`].
#[derive(Debug, Clone)]
pub struct RestStore {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Project base URL, always ending in `/`.
    base: Url,
    /// Service key sent as both `apikey` and bearer token.
    api_key: String,
}

impl RestStore {
    /// Create a store for `base_url` authenticated with `api_key`.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(2))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            base: Url::parse(&base)?,
            api_key: api_key.into(),
        })
    }

    /// Create a store from configuration.
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        let url = config
            .supabase_url
            .as_deref()
            .ok_or_else(|| StoreError::Unavailable("SUPABASE_URL is not set".to_string()))?;
        let key = config
            .supabase_key
            .as_deref()
            .ok_or_else(|| StoreError::Unavailable("SUPABASE_KEY is not set".to_string()))?;
        Self::new(url, key, config.http_timeout())
    }

    /// Endpoint for a collection.
    pub fn collection_url(&self, collection: Collection) -> Result<Url, StoreError> {
        Ok(self.base.join(&format!("rest/v1/{}", collection))?)
    }

    fn request(
        &self,
        method: Method,
        collection: Collection,
        filters: &[Filter],
    ) -> Result<RequestBuilder, StoreError> {
        let pairs: Vec<(String, String)> = filters.iter().map(Filter::to_query_pair).collect();
        Ok(self
            .http
            .request(method, self.collection_url(collection)?)
            .query(&pairs)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation"))
    }

    async fn send(
        &self,
        operation: Operation,
        collection: Collection,
        request: RequestBuilder,
    ) -> Result<Vec<Record>, StoreError> {
        let start = Instant::now();
        let result = Self::execute(collection, request).await;
        metrics::record_store_latency(start, operation);

        if let Err(e) = &result {
            metrics::inc_store_failures(operation);
            error!(%operation, %collection, error = %e, "store request failed");
        }
        result
    }

    async fn execute(
        collection: Collection,
        request: RequestBuilder,
    ) -> Result<Vec<Record>, StoreError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                collection,
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&body)
            .map_err(|e| StoreError::Parse(format!("{} response: {}", collection, e)))
    }
}

#[async_trait]
impl Store for RestStore {
    #[instrument(skip(self, record), fields(collection = %collection))]
    async fn insert(&self, collection: Collection, record: Record) -> Result<Record, StoreError> {
        let request = self.request(Method::POST, collection, &[])?.json(&record);
        let mut rows = self.send(Operation::Insert, collection, request).await?;
        debug!("record inserted");

        if rows.is_empty() {
            return Err(StoreError::Parse(format!(
                "{} insert returned no representation",
                collection
            )));
        }
        Ok(rows.swap_remove(0))
    }

    #[instrument(skip(self, query), fields(collection = %collection))]
    async fn fetch(&self, collection: Collection, query: &Query) -> Result<Vec<Record>, StoreError> {
        let mut params: Vec<(String, String)> = vec![("select".to_string(), "*".to_string())];
        if let Some((column, direction)) = &query.modifiers.order {
            params.push(("order".to_string(), format!("{}.{}", column, direction)));
        }
        if let Some(limit) = query.modifiers.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        let request = self
            .request(Method::GET, collection, &query.filters)?
            .query(&params);
        let rows = self.send(Operation::Fetch, collection, request).await?;
        debug!(rows = rows.len(), "records fetched");
        Ok(rows)
    }

    #[instrument(skip(self, fields, filters), fields(collection = %collection))]
    async fn update(
        &self,
        collection: Collection,
        fields: Record,
        filters: &[Filter],
    ) -> Result<Vec<Record>, StoreError> {
        let request = self.request(Method::PATCH, collection, filters)?.json(&fields);
        let rows = self.send(Operation::Update, collection, request).await?;
        debug!(rows = rows.len(), "records updated");
        Ok(rows)
    }

    #[instrument(skip(self, filters), fields(collection = %collection))]
    async fn delete(
        &self,
        collection: Collection,
        filters: &[Filter],
    ) -> Result<Vec<Record>, StoreError> {
        let request = self.request(Method::DELETE, collection, filters)?;
        self.send(Operation::Delete, collection, request).await
    }
}
