//! Report submission and athlete health queries over an injected store.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{error, info, instrument, warn};

use crate::error::{Result, ServiceError, StoreError};
use crate::metrics;
use crate::reports::{
    parse_timestamp, report_streak, AthleteStats, AuditRecord, HistoryFilter, ReportSubmission,
    StoredReport,
};
use crate::status::{classify, AthleteStatus, Classification, TeamHealthSummary};
use crate::store::{
    from_record, to_record, Collection, Direction, Filter, FilterOp, Query, Record, Store,
};

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Health reporting service.
///
/// Submission is two store calls, status update then report insert, with no
/// lock or transaction around the pair.
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn Store>,
    clock: Clock,
}

impl fmt::Debug for ReportService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportService").finish_non_exhaustive()
    }
}

impl ReportService {
    /// Create a service over `store` using the system clock.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Classify a report, apply the derived status and store the report.
    ///
    /// A failed status update aborts before the report is stored. A failed
    /// report insert is reported, but the status update stays applied.
    #[instrument(skip(self, submission), fields(athlete_id = %submission.user_id))]
    pub async fn submit_report(&self, submission: &ReportSubmission) -> Result<Classification> {
        let _timer = metrics::timer_report_submit();

        let athlete_id = submission.user_id.trim();
        if athlete_id.is_empty() {
            return Err(ServiceError::MalformedInput("user_id is required".to_string()));
        }
        metrics::inc_reports_submitted();
        info!(answers = ?submission.answers_list, "Received health report");

        let classification = classify(&submission.answers_list, self.now()).map_err(|e| {
            metrics::inc_classification_errors();
            warn!(error = %e, "Rejected health report");
            e
        })?;

        let update = classification.status_update();
        let fields = to_record(&update)?;
        let updated = self
            .store
            .update(Collection::Athletes, fields, &[Filter::eq("id", athlete_id)])
            .await
            .map_err(|source| {
                error!(error = %source, "Error updating athlete's health status");
                ServiceError::StatusUpdateFailed {
                    athlete_id: athlete_id.to_string(),
                    source,
                }
            })?;

        if updated.is_empty() {
            warn!("No athlete row matched; status was not recorded");
        }
        metrics::inc_status_updates(update.status);
        info!(
            status = %update.status,
            recovery = ?update.estimated_recovery_date,
            "Updated athlete's status"
        );

        let audit = to_record(&AuditRecord {
            athlete_id,
            answers: &submission.answers_list,
        })?;
        self.store
            .insert(Collection::Reports, audit)
            .await
            .map_err(|source| {
                metrics::inc_report_insert_failures();
                error!(error = %source, "Status updated but report insert failed");
                ServiceError::ReportInsertFailed {
                    athlete_id: athlete_id.to_string(),
                    source,
                }
            })?;

        info!("Inserted new report");
        Ok(classification)
    }

    /// Current status fields of an athlete.
    #[instrument(skip(self))]
    pub async fn athlete_status(&self, athlete_id: &str) -> Result<AthleteStatus> {
        let query = Query::new().eq("id", athlete_id).limit(1);
        let row = self
            .store
            .fetch(Collection::Athletes, &query)
            .await?
            .into_iter()
            .next();

        match row {
            Some(record) => Ok(from_record(record)?),
            None => {
                warn!("Athlete not found");
                Err(ServiceError::not_found("athlete", athlete_id))
            }
        }
    }

    /// Report count and consecutive-day streak for an athlete.
    ///
    /// An athlete with no reports has zero of both.
    #[instrument(skip(self))]
    pub async fn athlete_stats(&self, athlete_id: &str) -> Result<AthleteStats> {
        let query = Query::new().eq("athlete_id", athlete_id);
        let reports = self.store.fetch(Collection::Reports, &query).await?;

        let timestamps = reports
            .iter()
            .map(created_at)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let stats = AthleteStats {
            report_count: reports.len(),
            consecutive_reports: report_streak(&timestamps, self.now().date_naive()),
        };
        info!(
            report_count = stats.report_count,
            consecutive = stats.consecutive_reports,
            "Computed athlete stats"
        );
        Ok(stats)
    }

    /// Stored reports of an athlete, newest first.
    ///
    /// `since` limits results to reports created at or after that time.
    /// `created_at` is decoded with [`Filter::parse`]; its value must be a date
    /// or timestamp.
    #[instrument(skip(self))]
    pub async fn report_history(
        &self,
        athlete_id: &str,
        filter: &HistoryFilter,
    ) -> Result<Vec<StoredReport>> {
        let mut query = Query::new()
            .eq("athlete_id", athlete_id)
            .order_by("created_at", Direction::Desc);

        if let Some(raw) = filter.since.as_deref() {
            let value = normalize_timestamp("since", raw)?;
            query = query.filter(Filter::new("created_at", FilterOp::Gte, value));
        }
        if let Some(raw) = filter.created_at.as_deref() {
            let parsed = Filter::parse("created_at", raw);
            let value = normalize_timestamp("created_at", &parsed.value)?;
            query = query.filter(Filter::new("created_at", parsed.op, value));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        let rows = self.store.fetch(Collection::Reports, &query).await?;
        rows.into_iter()
            .map(|r| from_record(r).map_err(ServiceError::from))
            .collect()
    }

    /// Status of every athlete on a team.
    #[instrument(skip(self))]
    pub async fn team_health(&self, team_id: &str) -> Result<TeamHealthSummary> {
        let query = Query::new()
            .eq("team_id", team_id)
            .order_by("id", Direction::Asc);
        let athletes = self
            .store
            .fetch(Collection::Athletes, &query)
            .await?
            .into_iter()
            .map(from_record)
            .collect::<std::result::Result<Vec<AthleteStatus>, _>>()?;

        let summary = TeamHealthSummary::new(team_id, athletes);
        info!(
            athletes = summary.num_athletes,
            red = summary.red_athletes,
            "Fetched team health"
        );
        Ok(summary)
    }

    /// Whether the store answers a trivial query.
    pub async fn ping(&self) -> bool {
        self.store
            .fetch(Collection::Athletes, &Query::new().limit(1))
            .await
            .is_ok()
    }
}

/// Rewrite a user-supplied date or timestamp in the stored format.
fn normalize_timestamp(param: &str, raw: &str) -> Result<String> {
    parse_timestamp(raw)
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Micros, false))
        .ok_or_else(|| {
            ServiceError::MalformedInput(format!("{} {:?} is not a date or timestamp", param, raw))
        })
}

fn created_at(record: &Record) -> std::result::Result<DateTime<Utc>, StoreError> {
    let raw = record
        .get("created_at")
        .and_then(|v| v.as_str())
        .ok_or_else(|| StoreError::Parse("report without created_at".to_string()))?;
    parse_timestamp(raw)
        .ok_or_else(|| StoreError::Parse(format!("unreadable created_at {:?}", raw)))
}
