//! Status classification from report answers.

use chrono::{DateTime, TimeDelta, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

use super::types::{HealthStatus, MissedActivity, StatusUpdate};
use crate::error::{Result, ServiceError};
use crate::reports::ReportAnswers;

/// Separators between the day count and its qualifiers (`"14+ days"`).
static OUTAGE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[+\s]+").expect("valid regex"));

/// Outcome of classifying one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Derived status.
    pub status: HealthStatus,
    /// Parsed outage, when one was declared. May be negative.
    pub outage_days: Option<i64>,
    /// Restriction start; set only for restricted statuses.
    pub injury_date: Option<DateTime<Utc>>,
    /// `now + outage_days`; set whenever an outage was declared.
    pub estimated_recovery_date: Option<DateTime<Utc>>,
}

impl Classification {
    /// Classification with no outage and no restriction.
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            outage_days: None,
            injury_date: None,
            estimated_recovery_date: None,
        }
    }

    /// Fields to write to the athlete record.
    ///
    /// A Healthy result clears both dates, even when an outage was declared.
    pub fn status_update(&self) -> StatusUpdate {
        if self.status.is_restricted() {
            StatusUpdate {
                status: self.status,
                injury_date: self.injury_date,
                estimated_recovery_date: self.estimated_recovery_date,
            }
        } else {
            StatusUpdate {
                status: HealthStatus::Healthy,
                injury_date: None,
                estimated_recovery_date: None,
            }
        }
    }
}

/// Parse the leading day count of an outage answer.
///
/// Only the first token (split on runs of `+` and whitespace) is meaningful:
/// `"14+ days"` is 14, `"7 days"` is 7, `"-3 days"` is -3.
pub fn parse_outage_days(raw: &str) -> Result<i64> {
    let token = OUTAGE_SEPARATOR.split(raw).next().unwrap_or_default();
    token.parse::<i64>().map_err(|_| {
        ServiceError::MalformedInput(format!(
            "expected_outage {:?} does not start with a day count",
            raw
        ))
    })
}

/// Derive the health status for a set of answers at time `now`.
#[instrument(skip(answers), fields(outage = ?answers.expected_outage, restriction = ?answers.missed_activity))]
pub fn classify(answers: &ReportAnswers, now: DateTime<Utc>) -> Result<Classification> {
    let outage = match answers.expected_outage.as_deref().map(str::trim) {
        None | Some("") => {
            debug!("no outage declared");
            return Ok(Classification::healthy());
        }
        Some(outage) => outage,
    };

    let days = parse_outage_days(outage)?;
    let recovery = TimeDelta::try_days(days)
        .and_then(|offset| now.checked_add_signed(offset))
        .ok_or_else(|| {
            ServiceError::MalformedInput(format!("expected_outage of {} days is out of range", days))
        })?;

    let status = MissedActivity::from_answer(answers.missed_activity.as_deref())
        .map(MissedActivity::status)
        .unwrap_or(HealthStatus::Healthy);

    let classification = Classification {
        status,
        outage_days: Some(days),
        injury_date: status.is_restricted().then_some(now),
        estimated_recovery_date: Some(recovery),
    };
    debug!(%status, days, "report classified");
    Ok(classification)
}
