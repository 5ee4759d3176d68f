use super::*;
use crate::planner::{plan_intervals, TimeInterval};
use chrono::{TimeZone, Utc};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

fn plan(hours: u32) -> Vec<TimeInterval> {
    let start = Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2021, 10, 1, hours, 0, 0).unwrap();
    plan_intervals(start, end).unwrap()
}

#[test]
fn take_pending_in_plan_order_until_empty() {
    let intervals = plan(1);
    let q = WorkQueue::from_plan(intervals.clone());
    assert_eq!(q.take_pending(), Some(intervals[0]));
    assert_eq!(q.take_pending(), Some(intervals[1]));
    assert_eq!(q.take_pending(), Some(intervals[2]));
    assert_eq!(q.take_pending(), None);
    let counts = q.snapshot();
    assert_eq!(counts.in_flight, 3);
    assert!(counts.is_consistent());
}

#[test]
fn outcomes_move_units_out_of_flight() {
    let q = WorkQueue::from_plan(plan(1));
    let a = q.take_pending().unwrap();
    let b = q.take_pending().unwrap();
    q.mark_completed(a, PathBuf::from("/tmp/a.mp3")).unwrap();
    q.mark_failed(b, "HTTP 404").unwrap();

    let counts = q.snapshot();
    assert_eq!(
        counts,
        QueueCounts {
            planned: 3,
            pending: 1,
            in_flight: 0,
            completed: 1,
            failed: 1,
        }
    );
    let failed = q.failed();
    assert_eq!(failed[0].interval, b);
    assert_eq!(failed[0].error.as_deref(), Some("HTTP 404"));
    assert_eq!(q.completed()[0].artifact, Some(PathBuf::from("/tmp/a.mp3")));
}

#[test]
fn outcome_for_untracked_interval_is_rejected() {
    let intervals = plan(1);
    let q = WorkQueue::from_plan(intervals.clone());
    // Still pending, never dispatched.
    assert_eq!(
        q.mark_completed(intervals[0], PathBuf::from("x")),
        Err(QueueError::NotInFlight(intervals[0]))
    );
    let a = q.take_pending().unwrap();
    q.mark_failed(a, "boom").unwrap();
    // Reported twice.
    assert_eq!(q.mark_failed(a, "boom"), Err(QueueError::NotInFlight(a)));
    assert!(q.snapshot().is_consistent());
}

#[test]
fn requeue_failed_moves_exactly_the_failed_set() {
    let q = WorkQueue::from_plan(plan(1));
    let a = q.take_pending().unwrap();
    let b = q.take_pending().unwrap();
    let c = q.take_pending().unwrap();
    q.mark_failed(a, "timeout").unwrap();
    q.mark_completed(b, PathBuf::from("b")).unwrap();
    q.mark_failed(c, "HTTP 403").unwrap();

    assert_eq!(q.requeue_failed(), 2);
    let counts = q.snapshot();
    assert_eq!(counts.failed, 0);
    assert_eq!(counts.pending, 2);
    assert_eq!(counts.completed, 1);
    assert_eq!(q.pending(), vec![a, c]);
    assert_eq!(q.requeue_failed(), 0);
}

#[test]
fn records_cover_every_planned_interval_once() {
    let intervals = plan(2);
    let q = WorkQueue::from_plan(intervals.clone());
    let a = q.take_pending().unwrap();
    let b = q.take_pending().unwrap();
    q.take_pending().unwrap();
    q.mark_completed(a, PathBuf::from("a")).unwrap();
    q.mark_failed(b, "x").unwrap();

    let records = q.records();
    let seen: Vec<TimeInterval> = records.iter().map(|r| r.interval).collect();
    assert_eq!(seen, intervals);
    assert_eq!(records[0].status, UnitStatus::Completed);
    assert_eq!(records[1].status, UnitStatus::Failed);
    assert_eq!(records[2].status, UnitStatus::InFlight);
    assert_eq!(records[3].status, UnitStatus::Pending);
}

#[test]
fn concurrent_completions_keep_accounting_exact() {
    let intervals = plan(23);
    let total = intervals.len();
    let q = Arc::new(WorkQueue::from_plan(intervals.clone()));
    let mut handles = Vec::new();
    for worker in 0..8 {
        let q = Arc::clone(&q);
        handles.push(std::thread::spawn(move || {
            let mut mine = Vec::new();
            while let Some(iv) = q.take_pending() {
                if (iv.start().timestamp() / 1800 + worker) % 3 == 0 {
                    q.mark_failed(iv, "flaky").unwrap();
                } else {
                    q.mark_completed(iv, PathBuf::from(iv.to_string())).unwrap();
                }
                assert!(q.snapshot().is_consistent());
                mine.push(iv);
            }
            mine
        }));
    }
    let mut seen = HashSet::new();
    for h in handles {
        for iv in h.join().unwrap() {
            assert!(seen.insert(iv), "interval dispatched twice: {iv}");
        }
    }
    assert_eq!(seen.len(), total);
    let counts = q.snapshot();
    assert_eq!(counts.processed(), total);
    assert_eq!(counts.pending + counts.in_flight, 0);
}
