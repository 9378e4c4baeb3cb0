//! Bounded batch selection over an oldest-first instance listing.

use crate::types::Instance;

/// Returns at most `max_count` instances from the front of `sorted`.
///
/// Ordering comes entirely from discovery; nothing is re-sorted here.
/// A zero or negative `max_count` selects nothing.
pub fn select_batch(mut sorted: Vec<Instance>, max_count: i64) -> Vec<Instance> {
    let limit = usize::try_from(max_count).unwrap_or(0);
    sorted.truncate(limit);
    sorted
}
