//! # uniq-queue
//!
//! A deduplicating FIFO queue. Each key is queued at most once, keys pop
//! in the order they were first pushed, and pushing a queued key again
//! merges the new value into the stored one through a caller-supplied
//! merge function.
//!
//! The queue is a plain single-threaded container: it does no locking and
//! never fails. Configuration loading and logging setup live alongside it
//! for applications that pick the merge policy at runtime.

pub mod config;
pub mod error;
pub mod merge;
pub mod queue;
pub mod telemetry;

pub use error::{Error, Result};
pub use merge::{MergePolicy, retain_new, retain_old};
pub use queue::{BoxedMerge, UniqueQueue, UniqueQueueBuilder};
