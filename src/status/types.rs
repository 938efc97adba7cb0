//! Health status levels and the records derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Availability level of an athlete.
///
/// Serialized with the labels stored in the athletes collection.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    Default,
)]
pub enum HealthStatus {
    /// No restriction.
    #[default]
    #[serde(rename = "Healthy")]
    #[strum(serialize = "Healthy")]
    Healthy,
    /// Barred from competition only.
    #[serde(rename = "No competing")]
    #[strum(serialize = "No competing")]
    AmberRestricted,
    /// Barred from training and competition.
    #[serde(rename = "No training or competing")]
    #[strum(serialize = "No training or competing")]
    RedRestricted,
}

impl HealthStatus {
    /// Whether any restriction applies.
    pub fn is_restricted(self) -> bool {
        self != HealthStatus::Healthy
    }

    /// Whether the athlete may compete.
    pub fn can_compete(self) -> bool {
        self == HealthStatus::Healthy
    }

    /// Whether the athlete may train.
    pub fn can_train(self) -> bool {
        self != HealthStatus::RedRestricted
    }
}

/// Restriction category declared in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum MissedActivity {
    /// Competition only.
    #[strum(serialize = "Competing Only")]
    CompetingOnly,
    /// Training and competition.
    #[strum(serialize = "Training & Competing")]
    TrainingAndCompeting,
}

impl MissedActivity {
    /// Interpret a raw answer. Unrecognised labels mean no restriction.
    pub fn from_answer(answer: Option<&str>) -> Option<Self> {
        answer.and_then(|a| a.parse().ok())
    }

    /// Status implied by this restriction.
    pub fn status(self) -> HealthStatus {
        match self {
            MissedActivity::CompetingOnly => HealthStatus::AmberRestricted,
            MissedActivity::TrainingAndCompeting => HealthStatus::RedRestricted,
        }
    }
}

/// Fields written to the athlete record in a single update.
///
/// Both dates are always present in the serialized form so that a Healthy
/// update clears them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// New status.
    pub status: HealthStatus,
    /// When the restriction began.
    pub injury_date: Option<DateTime<Utc>>,
    /// When the athlete is expected back.
    pub estimated_recovery_date: Option<DateTime<Utc>>,
}

/// Status fields as read from the athletes collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AthleteStatus {
    /// Athlete id.
    #[serde(rename = "id")]
    pub athlete_id: String,
    /// Current status. Rows without one are treated as Healthy.
    #[serde(default, deserialize_with = "status_or_healthy")]
    pub status: HealthStatus,
    /// Restriction start, as stored.
    #[serde(default)]
    pub injury_date: Option<String>,
    /// Expected return, as stored.
    #[serde(default)]
    pub estimated_recovery_date: Option<String>,
    /// Team linkage.
    #[serde(default)]
    pub team_id: Option<String>,
}

/// Status of every athlete on a team, with per-level counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamHealthSummary {
    /// Team id.
    pub team_id: String,
    /// Members and their status.
    pub athletes: Vec<AthleteStatus>,
    /// Number of members.
    pub num_athletes: usize,
    /// Members without restriction.
    pub healthy_athletes: usize,
    /// Members barred from competition only.
    pub amber_athletes: usize,
    /// Members barred from training and competition.
    pub red_athletes: usize,
    /// Members cleared to compete.
    pub available_to_compete: usize,
    /// Members cleared to train, restricted or not.
    pub available_to_train: usize,
}

impl TeamHealthSummary {
    /// Summarise the given members of `team_id`.
    pub fn new(team_id: impl Into<String>, athletes: Vec<AthleteStatus>) -> Self {
        let count = |level: HealthStatus| athletes.iter().filter(|a| a.status == level).count();
        Self {
            team_id: team_id.into(),
            num_athletes: athletes.len(),
            healthy_athletes: count(HealthStatus::Healthy),
            amber_athletes: count(HealthStatus::AmberRestricted),
            red_athletes: count(HealthStatus::RedRestricted),
            available_to_compete: athletes.iter().filter(|a| a.status.can_compete()).count(),
            available_to_train: athletes.iter().filter(|a| a.status.can_train()).count(),
            athletes,
        }
    }
}

fn status_or_healthy<'de, D>(deserializer: D) -> Result<HealthStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<HealthStatus>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_labels_match_stored_values() {
        assert_eq!(HealthStatus::Healthy.to_string(), "Healthy");
        assert_eq!(HealthStatus::AmberRestricted.to_string(), "No competing");
        assert_eq!(
            serde_json::to_value(HealthStatus::RedRestricted).unwrap(),
            json!("No training or competing")
        );
        assert_eq!(
            "No competing".parse::<HealthStatus>().unwrap(),
            HealthStatus::AmberRestricted
        );
    }

    #[test]
    fn restriction_predicates() {
        assert!(!HealthStatus::Healthy.is_restricted());
        assert!(HealthStatus::AmberRestricted.can_train());
        assert!(!HealthStatus::AmberRestricted.can_compete());
        assert!(!HealthStatus::RedRestricted.can_train());
    }

    #[test]
    fn missed_activity_mapping() {
        assert_eq!(
            MissedActivity::from_answer(Some("Competing Only")).map(MissedActivity::status),
            Some(HealthStatus::AmberRestricted)
        );
        assert_eq!(
            MissedActivity::from_answer(Some("Training & Competing")).map(MissedActivity::status),
            Some(HealthStatus::RedRestricted)
        );
        assert_eq!(MissedActivity::from_answer(Some("competing only")), None);
        assert_eq!(MissedActivity::from_answer(None), None);
    }

    #[test]
    fn healthy_update_serializes_explicit_nulls() {
        let update = StatusUpdate {
            status: HealthStatus::Healthy,
            injury_date: None,
            estimated_recovery_date: None,
        };
        assert_eq!(
            serde_json::to_value(update).unwrap(),
            json!({"status": "Healthy", "injury_date": null, "estimated_recovery_date": null})
        );
    }

    #[test]
    fn athlete_row_defaults_missing_status() {
        let row: AthleteStatus = serde_json::from_value(json!({"id": "a1", "team_id": "t1"})).unwrap();
        assert_eq!(row.status, HealthStatus::Healthy);
        assert_eq!(row.team_id.as_deref(), Some("t1"));

        let row: AthleteStatus = serde_json::from_value(json!({"id": "a2", "status": null})).unwrap();
        assert_eq!(row.status, HealthStatus::Healthy);
    }

    #[test]
    fn team_summary_counts_levels() {
        let member = |id: &str, status| AthleteStatus {
            athlete_id: id.to_string(),
            status,
            injury_date: None,
            estimated_recovery_date: None,
            team_id: Some("t1".to_string()),
        };
        let summary = TeamHealthSummary::new(
            "t1",
            vec![
                member("a1", HealthStatus::Healthy),
                member("a2", HealthStatus::RedRestricted),
                member("a3", HealthStatus::Healthy),
                member("a4", HealthStatus::AmberRestricted),
            ],
        );

        assert_eq!(summary.num_athletes, 4);
        assert_eq!(summary.healthy_athletes, 2);
        assert_eq!(summary.amber_athletes, 1);
        assert_eq!(summary.red_athletes, 1);
        assert_eq!(summary.available_to_compete, 2);
        assert_eq!(summary.available_to_train, 3);

        let empty = TeamHealthSummary::new("t2", Vec::new());
        assert_eq!(empty.num_athletes, 0);
        assert_eq!(empty.healthy_athletes, 0);
    }
}
