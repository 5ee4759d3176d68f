//! Work queue: the authoritative partition of planned intervals into
//! pending, in-flight, completed and failed.

mod record;
mod work_queue;

pub use record::{QueueCounts, TaskRecord, UnitStatus};
pub use work_queue::{QueueError, WorkQueue};

#[cfg(test)]
mod tests;
