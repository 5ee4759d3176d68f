//! Range expansion: `start, start+30m, ...` up to and including the last slot <= `end`.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::interval::TimeInterval;

/// Planning failure. The caller reports it; no session is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("invalid range: end {end} must be after start {start}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Number of slots a valid range expands to: `floor((end - start) / 30m) + 1`.
pub fn interval_count(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<usize, PlanError> {
    if end <= start {
        return Err(PlanError::InvalidRange { start, end });
    }
    let span = (end - start).num_seconds();
    let step = TimeInterval::duration().num_seconds();
    Ok((span / step) as usize + 1)
}

/// Builds the ordered interval plan for a range.
///
/// Pure and deterministic: the same inputs always yield the same sequence.
pub fn plan_intervals(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<TimeInterval>, PlanError> {
    let count = interval_count(start, end)?;
    let mut out = Vec::with_capacity(count);
    let mut current = TimeInterval::new(start);
    out.push(current);
    // Advance only between slots; the slot after the last may not be representable.
    for _ in 1..count {
        current = current.next();
        out.push(current);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 10, 1, h, m, 0).unwrap()
    }

    #[test]
    fn two_hour_range_yields_five_slots() {
        let plan = plan_intervals(at(0, 0), at(2, 0)).unwrap();
        let times: Vec<String> = plan.iter().map(|i| i.time_token()).collect();
        assert_eq!(times, ["0000Z", "0030Z", "0100Z", "0130Z", "0200Z"]);
    }

    #[test]
    fn partial_trailing_slot_is_not_planned() {
        // 00:00..01:10 -> 00:00, 00:30, 01:00
        let plan = plan_intervals(at(0, 0), at(1, 10)).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.last().unwrap().start(), at(1, 0));
    }

    #[test]
    fn short_range_yields_one_slot() {
        let plan = plan_intervals(at(0, 0), at(0, 1)).unwrap();
        assert_eq!(plan, vec![TimeInterval::new(at(0, 0))]);
    }

    #[test]
    fn slots_strictly_increase_by_thirty_minutes() {
        let plan = plan_intervals(at(0, 0), at(23, 30)).unwrap();
        assert_eq!(plan.len(), 48);
        for pair in plan.windows(2) {
            assert_eq!(pair[1].start() - pair[0].start(), TimeInterval::duration());
        }
    }

    #[test]
    fn count_matches_formula() {
        for minutes in [1i64, 29, 30, 31, 59, 60, 61, 600, 1439] {
            let end = at(0, 0) + chrono::Duration::minutes(minutes);
            let plan = plan_intervals(at(0, 0), end).unwrap();
            assert_eq!(plan.len() as i64, minutes / 30 + 1, "minutes = {minutes}");
            assert_eq!(interval_count(at(0, 0), end).unwrap(), plan.len());
        }
    }

    #[test]
    fn range_ending_at_latest_instant_is_planned() {
        let end = DateTime::<Utc>::MAX_UTC;
        let start = end - chrono::Duration::hours(1);
        let plan = plan_intervals(start, end).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.last().unwrap().start(), end);
    }

    #[test]
    fn planning_is_deterministic() {
        let a = plan_intervals(at(3, 0), at(9, 0)).unwrap();
        let b = plan_intervals(at(3, 0), at(9, 0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_or_reversed_range_rejected() {
        assert!(matches!(
            plan_intervals(at(1, 0), at(1, 0)),
            Err(PlanError::InvalidRange { .. })
        ));
        assert!(matches!(
            plan_intervals(at(2, 0), at(1, 0)),
            Err(PlanError::InvalidRange { .. })
        ));
    }
}
