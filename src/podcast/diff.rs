//! Subscription diff: which fetched episodes are new.

use super::types::EpisodeKey;

/// Return the episodes of `new` that are not in `old`.
///
/// Scans `new` from its last element backward, collecting every candidate
/// without a (title, media URL) match in `old`, and stops at the first
/// candidate that has one. The result is in scan order, so the tail of the
/// feed comes first.
///
/// Feeds are assumed to grow at the tail: an episode inserted before an
/// already known one is not reported.
pub fn new_items<O, N>(old: &[O], new: &[N]) -> Vec<N>
where
    O: EpisodeKey,
    N: EpisodeKey + Clone,
{
    let mut found = Vec::new();
    for candidate in new.iter().rev() {
        if old.iter().any(|known| known.same_episode(candidate)) {
            break;
        }
        found.push(candidate.clone());
    }
    found
}
