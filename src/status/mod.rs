//! Health status derivation.
//!
//! This module handles:
//! - Status levels and restriction categories
//! - Classifying report answers into a status and recovery estimate

pub mod classifier;
pub mod types;

pub use classifier::{classify, parse_outage_days, Classification};
pub use types::{AthleteStatus, HealthStatus, MissedActivity, StatusUpdate, TeamHealthSummary};
