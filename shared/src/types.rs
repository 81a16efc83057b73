//! Common types used across the platform

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive date range for report queries.
///
/// Built from two optional ISO dates; anything absent or unparseable falls
/// back to the bounds of the current calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// First instant through last instant of the month containing `now`.
    pub fn current_month(now: DateTime<Utc>) -> Self {
        let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
            .expect("first of month is always valid");
        let next_month = if now.month() == 12 {
            NaiveDate::from_ymd_opt(now.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(now.year(), now.month() + 1, 1)
        }
        .expect("first of next month is always valid");

        Self {
            from: Utc.from_utc_datetime(&first.and_hms_opt(0, 0, 0).unwrap()),
            to: Utc.from_utc_datetime(&next_month.and_hms_opt(0, 0, 0).unwrap())
                - Duration::nanoseconds(1),
        }
    }

    /// Resolve optional `from`/`to` ISO date strings (`YYYY-MM-DD`).
    ///
    /// `from` starts at midnight, `to` runs through the end of its day.
    /// Each bound defaults independently: a missing or unparseable value
    /// falls back to its side of the current-month range without discarding
    /// the other, explicitly supplied bound.
    pub fn resolve(from: Option<&str>, to: Option<&str>, now: DateTime<Utc>) -> Self {
        let default = Self::current_month(now);
        let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();

        Self {
            from: from
                .and_then(parse)
                .map(|d| Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0).unwrap()))
                .unwrap_or(default.from),
            to: to
                .and_then(parse)
                .map(|d| {
                    Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0).unwrap()) + Duration::days(1)
                        - Duration::nanoseconds(1)
                })
                .unwrap_or(default.to),
        }
    }

    /// Inclusive containment check.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.from && at <= self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn current_month_spans_first_to_last_instant() {
        let range = DateRange::current_month(at(2026, 2, 14));
        assert!(range.contains(at(2026, 2, 1)));
        assert!(range.contains(Utc.with_ymd_and_hms(2026, 2, 28, 23, 59, 59).unwrap()));
        assert!(!range.contains(at(2026, 3, 1)));
        assert!(!range.contains(at(2026, 1, 31)));
    }

    #[test]
    fn december_rolls_into_next_year() {
        let range = DateRange::current_month(at(2025, 12, 5));
        assert!(range.contains(Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap()));
        assert!(!range.contains(at(2026, 1, 1)));
    }

    #[test]
    fn resolve_uses_explicit_bounds_inclusively() {
        let range = DateRange::resolve(Some("2026-03-10"), Some("2026-03-20"), at(2026, 8, 1));
        assert!(range.contains(at(2026, 3, 10)));
        assert!(range.contains(Utc.with_ymd_and_hms(2026, 3, 20, 23, 0, 0).unwrap()));
        assert!(!range.contains(at(2026, 3, 21)));
    }

    #[test]
    fn resolve_falls_back_to_current_month_when_both_sides_are_absent() {
        let now = at(2026, 8, 15);
        assert_eq!(DateRange::resolve(None, None, now), DateRange::current_month(now));
        assert_eq!(
            DateRange::resolve(Some("not-a-date"), Some("also-bad"), now),
            DateRange::current_month(now)
        );
    }

    #[test]
    fn resolve_keeps_an_explicit_bound_when_only_the_other_is_missing() {
        let now = at(2026, 8, 15);
        let month = DateRange::current_month(now);

        let from_only = DateRange::resolve(Some("2026-08-10"), None, now);
        assert!(!from_only.contains(at(2026, 8, 9)));
        assert!(from_only.contains(at(2026, 8, 10)));
        assert_eq!(from_only.to, month.to);

        let to_only = DateRange::resolve(None, Some("2026-08-20"), now);
        assert_eq!(to_only.from, month.from);
        assert!(to_only.contains(Utc.with_ymd_and_hms(2026, 8, 20, 23, 0, 0).unwrap()));
        assert!(!to_only.contains(at(2026, 8, 21)));
    }

    #[test]
    fn resolve_defaults_an_unparseable_bound_without_discarding_the_valid_one() {
        let now = at(2026, 8, 15);
        let range = DateRange::resolve(Some("not-a-date"), Some("2026-08-20"), now);
        assert_eq!(range.from, DateRange::current_month(now).from);
        assert!(range.contains(at(2026, 8, 20)));
        assert!(!range.contains(at(2026, 8, 21)));
    }
}
