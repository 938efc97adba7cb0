//! Athlete health-reporting backend.
//!
//! Athletes submit health reports; the service derives an availability status
//! and keeps report history for coaches.
//!
//! # Status derivation
//!
//! ```text
//! expected_outage   missed_activity          status
//! ──────────────────────────────────────────────────────────────
//! (absent)          (any)                    Healthy
//! "14+ days"        "Competing Only"         No competing
//! "7 days"          "Training & Competing"   No training or competing
//! "7 days"          (other / absent)         Healthy
//! ```
//!
//! When an outage is declared the recovery estimate is `now + days`.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`status`]: Status levels and report classification
//! - [`reports`]: Report payloads and streak analysis
//! - [`store`]: Persistence collaborator and its backends
//! - [`service`]: Report submission and athlete queries
//! - [`api`]: HTTP API
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod reports;
pub mod service;
pub mod status;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{Result, ServiceError, StoreError};
pub use service::ReportService;
