//! Worker pool scheduler.
//!
//! Keeps up to `max_concurrency` workers in flight; when one finishes, the
//! next item is started until every item has reported. Outcomes are returned
//! in submission order regardless of completion order.

mod pool;

pub use pool::WorkerPool;
