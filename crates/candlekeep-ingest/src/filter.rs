//! Duplicate filtering for one fetched batch.

use std::collections::HashSet;

/// Accepts each timestamp of a batch at most once.
///
/// A timestamp is rejected when it equals the latest stored timestamp of
/// the series or was already accepted earlier in the same batch. Older
/// stored history is not consulted.
#[derive(Debug, Clone, Default)]
pub struct BatchFilter {
    last_timestamp: i64,
    seen: HashSet<i64>,
}

impl BatchFilter {
    /// Creates a filter for a batch following `last_timestamp`.
    #[must_use]
    pub fn new(last_timestamp: i64) -> Self {
        Self {
            last_timestamp,
            seen: HashSet::new(),
        }
    }

    /// Returns true and records `timestamp` if it is not a duplicate.
    pub fn accept(&mut self, timestamp: i64) -> bool {
        timestamp != self.last_timestamp && self.seen.insert(timestamp)
    }

    /// Number of timestamps accepted so far.
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_last_timestamp() {
        let mut filter = BatchFilter::new(3000);
        assert!(!filter.accept(3000));
        assert!(filter.accept(4000));
        assert_eq!(filter.accepted(), 1);
    }

    #[test]
    fn test_rejects_repeat_within_batch() {
        let mut filter = BatchFilter::new(0);
        let accepted: Vec<_> = [1000, 2000, 1000, 3000, 2000]
            .into_iter()
            .filter(|&ts| filter.accept(ts))
            .collect();
        assert_eq!(accepted, vec![1000, 2000, 3000]);
    }

    #[test]
    fn test_does_not_check_older_history() {
        // Only the single latest timestamp is known to the filter
        let mut filter = BatchFilter::new(3000);
        assert!(filter.accept(1000));
    }
}
