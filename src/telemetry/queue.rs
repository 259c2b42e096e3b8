//! Span and event helpers for queue operations.

use tracing::Span;

/// Start a span scoping the lifetime of a named queue.
///
/// Queue events emitted while the span is entered carry `queue.name`.
pub fn queue_span(name: &str) -> Span {
    tracing::info_span!("queue", "queue.name" = name)
}

/// Report that the key index and the ordered sequence disagree.
///
/// Every mutation goes through the queue's own methods, so this only fires
/// if the queue was shared across threads without a lock or a merge
/// function panicked mid-push.
pub fn report_inconsistency(context: &str) {
    tracing::error!(context, "unique queue index and order out of sync");
}
