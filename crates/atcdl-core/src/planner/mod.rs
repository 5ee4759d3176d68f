//! Interval planning.
//!
//! Expands a requested time range into the ordered list of 30-minute
//! archive slots that make up one download session.

mod interval;
mod plan;

pub use interval::{TimeInterval, INTERVAL_MINUTES};
pub use plan::{interval_count, plan_intervals, PlanError};
