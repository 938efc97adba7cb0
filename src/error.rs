//! Unified error types for the health service.

use thiserror::Error;

use crate::store::Collection;

/// Unified error type for the health service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Report answers or identifiers could not be interpreted.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Lookup returned no rows.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of entity looked up.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The athlete status update was rejected; no report was stored.
    #[error("failed to update status for athlete {athlete_id}: {source}")]
    StatusUpdateFailed {
        /// Athlete whose status could not be written.
        athlete_id: String,
        /// Underlying store failure.
        #[source]
        source: StoreError,
    },

    /// The status update succeeded but the report insert failed.
    ///
    /// The status change is left in place.
    #[error("status updated for athlete {athlete_id} but report insert failed: {source}")]
    ReportInsertFailed {
        /// Athlete whose report was lost.
        athlete_id: String,
        /// Underlying store failure.
        #[source]
        source: StoreError,
    },

    /// Any other persistence failure.
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Shorthand for a [`ServiceError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Whether the failure came from the persistence collaborator.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::StatusUpdateFailed { .. } | Self::ReportInsertFailed { .. } | Self::Persistence(_)
        )
    }
}

/// Persistence collaborator errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{collection} request rejected with HTTP {status}: {body}")]
    Rejected {
        /// Collection the request targeted.
        collection: Collection,
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// Response or record could not be decoded.
    #[error("failed to parse store response: {0}")]
    Parse(String),

    /// Base URL could not be joined with a collection path.
    #[error("invalid store url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Store refused to serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ServiceError>;
