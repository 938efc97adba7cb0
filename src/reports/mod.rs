//! Report payloads and report-history analysis.
//!
//! This module handles:
//! - Submission and stored report types
//! - Consecutive-day streak calculation
//! - Stored timestamp parsing

pub mod streak;
pub mod types;

pub use streak::{parse_timestamp, report_streak};
pub use types::{
    AthleteStats, AuditRecord, HistoryFilter, ReportAnswers, ReportSubmission, StoredReport,
};
