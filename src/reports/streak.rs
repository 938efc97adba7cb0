//! Consecutive-day report streak.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};

/// Count consecutive report days.
///
/// Timestamps are sorted ascending and walked from the oldest. Position `i`
/// qualifies when its calendar date equals `today - i days`. The first
/// position that does not qualify resets the count to zero and ends the scan.
///
/// The oldest entry is compared with `today` and each later entry with an
/// earlier date, so the result is never more than 1.
pub fn report_streak(timestamps: &[DateTime<Utc>], today: NaiveDate) -> u32 {
    let mut sorted = timestamps.to_vec();
    sorted.sort();

    let mut streak = 0;
    for (i, timestamp) in sorted.iter().enumerate() {
        let expected = today.checked_sub_days(Days::new(i as u64));
        if Some(timestamp.date_naive()) == expected {
            streak += 1;
        } else {
            streak = 0;
            break;
        }
    }
    streak
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339, naive ISO date-times (taken as UTC) and bare dates
/// (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
