use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartitionState {
    Active,
    Observed,
}

/// What a single end-of-partition marker meant to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EofOutcome {
    /// First marker for this partition.
    Observed {
        /// Offset to store so consumption resumes where it stopped.
        resume_offset: i64,
        /// The observed-count just reached the threshold.
        done: bool,
    },
    /// Partition was already observed; nothing changes.
    Duplicate,
    /// Partition is not being tracked.
    Unknown,
}

/// Per-partition end-of-stream bookkeeping for exit-at-EOF consumption.
///
/// Each partition moves `Active -> Observed` exactly once. The run is
/// complete when the number of observed partitions reaches the threshold.
#[derive(Debug, Clone)]
pub struct PartitionEofTracker {
    partitions: HashMap<i32, PartitionState>,
    observed: usize,
    threshold: usize,
}

impl PartitionEofTracker {
    /// Track `partitions` (the topic's full partition list).
    ///
    /// The threshold is `1` when a single partition was requested, else the
    /// topic's partition count.
    pub fn new(partitions: &[i32], single_partition: bool) -> Self {
        let table: HashMap<i32, PartitionState> =
            partitions.iter().map(|&p| (p, PartitionState::Active)).collect();
        let threshold = if single_partition { table.len().min(1) } else { table.len() };
        Self {
            partitions: table,
            observed: 0,
            threshold,
        }
    }

    pub fn observe(&mut self, partition: i32, offset: i64) -> EofOutcome {
        let Some(state) = self.partitions.get_mut(&partition) else {
            return EofOutcome::Unknown;
        };
        if *state == PartitionState::Observed {
            return EofOutcome::Duplicate;
        }

        *state = PartitionState::Observed;
        self.observed += 1;
        EofOutcome::Observed {
            resume_offset: resume_offset(offset),
            done: self.observed >= self.threshold,
        }
    }

    pub fn is_observed(&self, partition: i32) -> bool {
        self.partitions.get(&partition) == Some(&PartitionState::Observed)
    }

    pub fn observed_count(&self) -> usize {
        self.observed
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

/// Offset to store for an EOF marker at `offset`: the one before it, or `0`
/// for an empty partition.
pub fn resume_offset(offset: i64) -> i64 {
    if offset == 0 { 0 } else { offset - 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_partition_count_without_filter() {
        let tracker = PartitionEofTracker::new(&[0, 1, 2], false);
        assert_eq!(tracker.threshold(), 3);
    }

    #[test]
    fn threshold_is_one_with_explicit_partition() {
        let tracker = PartitionEofTracker::new(&[0, 1, 2], true);
        assert_eq!(tracker.threshold(), 1);
    }

    #[test]
    fn stops_exactly_once_in_any_order() {
        let orders: [[i32; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for order in orders {
            let mut tracker = PartitionEofTracker::new(&[0, 1, 2], false);
            let mut done_signals = 0;
            for (i, p) in order.iter().enumerate() {
                match tracker.observe(*p, 10) {
                    EofOutcome::Observed { done, .. } => {
                        assert_eq!(done, i == 2, "order {order:?}");
                        if done {
                            done_signals += 1;
                        }
                    }
                    other => panic!("unexpected {other:?}"),
                }
            }
            assert_eq!(done_signals, 1);
            assert_eq!(tracker.observed_count(), tracker.threshold());
        }
    }

    #[test]
    fn partial_observation_keeps_running() {
        let mut tracker = PartitionEofTracker::new(&[0, 1, 2], false);
        tracker.observe(0, 1);
        tracker.observe(1, 1);
        assert!(tracker.observed_count() < tracker.threshold());
        assert!(tracker.is_observed(1));
        assert!(!tracker.is_observed(2));
    }

    #[test]
    fn duplicate_marker_does_not_count() {
        let mut tracker = PartitionEofTracker::new(&[0, 1], false);
        assert!(matches!(tracker.observe(0, 4), EofOutcome::Observed { done: false, .. }));
        assert_eq!(tracker.observe(0, 4), EofOutcome::Duplicate);
        assert_eq!(tracker.observe(0, 9), EofOutcome::Duplicate);
        assert_eq!(tracker.observed_count(), 1);
        assert!(tracker.observed_count() < tracker.threshold());
    }

    #[test]
    fn unknown_partition_is_ignored() {
        let mut tracker = PartitionEofTracker::new(&[0], false);
        assert_eq!(tracker.observe(7, 0), EofOutcome::Unknown);
        assert_eq!(tracker.observed_count(), 0);
    }

    #[test]
    fn resume_offsets() {
        let mut tracker = PartitionEofTracker::new(&[0, 1], false);
        assert_eq!(
            tracker.observe(0, 0),
            EofOutcome::Observed { resume_offset: 0, done: false }
        );
        assert_eq!(
            tracker.observe(1, 42),
            EofOutcome::Observed { resume_offset: 41, done: true }
        );
    }
}
