//! Report payloads, stored report rows and derived statistics.

use serde::{Deserialize, Deserializer, Serialize};

/// Answer set of a single health report.
///
/// Every field is optional. Unknown keys sent by the client are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportAnswers {
    /// Athlete reports an injury.
    #[serde(deserialize_with = "deserialize_flag")]
    pub injured: Option<bool>,
    /// Expected days out, e.g. `"14+ days"`.
    pub expected_outage: Option<String>,
    /// Restriction category, e.g. `"Competing Only"`.
    pub missed_activity: Option<String>,
    /// Athlete reports an illness.
    #[serde(deserialize_with = "deserialize_flag")]
    pub ill: Option<bool>,
    /// New or recurring.
    pub injury_type: Option<String>,
    /// Whether the problem has cost training or competition time.
    #[serde(deserialize_with = "deserialize_flag")]
    pub timeloss: Option<bool>,
    /// Body location.
    pub injury_location: Option<String>,
    /// Onset description.
    pub injury_onset: Option<String>,
    /// Whether a practitioner was consulted.
    #[serde(deserialize_with = "deserialize_flag")]
    pub consulted: Option<bool>,
    /// Free-form comments.
    pub comments: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagValue {
    Bool(bool),
    Text(String),
}

/// Accept JSON booleans as well as the `"Yes"`/`"No"` labels of the
/// multiple-choice answers. Any other label counts as `false`.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<FlagValue>::deserialize(deserializer)? {
        None => None,
        Some(FlagValue::Bool(b)) => Some(b),
        Some(FlagValue::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                Some(text.eq_ignore_ascii_case("yes") || text.eq_ignore_ascii_case("true"))
            }
        }
    })
}

/// Inbound report submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSubmission {
    /// Submitting athlete.
    #[serde(default)]
    pub user_id: String,
    /// The answers.
    #[serde(default)]
    pub answers_list: ReportAnswers,
}

/// Audit row written to the reports collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord<'a> {
    /// Owning athlete.
    pub athlete_id: &'a str,
    /// Every answer, as submitted.
    #[serde(flatten)]
    pub answers: &'a ReportAnswers,
}

/// A report row as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReport {
    /// Row id.
    #[serde(default)]
    pub id: Option<String>,
    /// Owning athlete.
    pub athlete_id: String,
    /// Creation timestamp as stored.
    pub created_at: String,
    /// Answers.
    #[serde(flatten)]
    pub answers: ReportAnswers,
}

/// Filters for an athlete's report history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HistoryFilter {
    /// Only reports created at or after this date or timestamp.
    pub since: Option<String>,
    /// Raw `created_at` filter in `op.value` form, e.g. `lt.2026-10-01`.
    /// Without an operator prefix the value must match exactly.
    pub created_at: Option<String>,
    /// Maximum number of reports.
    pub limit: Option<usize>,
}

/// Report statistics for one athlete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AthleteStats {
    /// Number of reports on record.
    pub report_count: usize,
    /// Consecutive-day streak.
    pub consecutive_reports: u32,
}
