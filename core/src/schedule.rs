//! Due-date arithmetic shared by the study plan and discussion insights,
//! kept in one place so the bucket thresholds cannot drift apart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Due-date bucket. Boundaries are inclusive on the low end of each bucket:
/// due today counts as urgent, due in exactly 3 days as upcoming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum WorkStatus {
    Overdue,
    Urgent,
    Upcoming,
    Later,
    NoDueDate,
}

/// Whole days until the due date, rounded up; negative once past due.
/// "now" is always injected by the caller, never read from the system clock.
pub fn days_until_due(due_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = due_at.signed_duration_since(now).num_milliseconds();
    (millis as f64 / MS_PER_DAY).ceil() as i64
}

pub fn classify_due(days_until_due: Option<i64>) -> WorkStatus {
    match days_until_due {
        None => WorkStatus::NoDueDate,
        Some(days) if days < 0 => WorkStatus::Overdue,
        Some(days) if days <= 2 => WorkStatus::Urgent,
        Some(days) if days <= 7 => WorkStatus::Upcoming,
        Some(_) => WorkStatus::Later,
    }
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{WorkStatus, classify_due, days_until_due, round1};

    #[test]
    fn days_round_up_toward_the_deadline() {
        let now = Utc::now();
        assert_eq!(days_until_due(now + Duration::hours(1), now), 1);
        assert_eq!(days_until_due(now + Duration::hours(47), now), 2);
        assert_eq!(days_until_due(now - Duration::hours(1), now), 0);
        assert_eq!(days_until_due(now - Duration::hours(25), now), -1);
    }

    #[test]
    fn bucket_boundaries_are_inclusive_on_the_low_end() {
        assert_eq!(classify_due(Some(-1)), WorkStatus::Overdue);
        assert_eq!(classify_due(Some(0)), WorkStatus::Urgent);
        assert_eq!(classify_due(Some(2)), WorkStatus::Urgent);
        assert_eq!(classify_due(Some(3)), WorkStatus::Upcoming);
        assert_eq!(classify_due(Some(7)), WorkStatus::Upcoming);
        assert_eq!(classify_due(Some(8)), WorkStatus::Later);
        assert_eq!(classify_due(None), WorkStatus::NoDueDate);
    }

    #[test]
    fn rounding_keeps_one_decimal() {
        assert_eq!(round1(86.666), 86.7);
        assert_eq!(round1(0.04), 0.0);
        assert_eq!(round1(100.0), 100.0);
    }
}
