/// Expected per-row cost of a transformation, used to size batches.
///
/// Cheaper workloads get larger batches so that scheduling overhead does not
/// dominate; expensive ones get smaller batches for better load balancing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Workload {
    /// Trivial per-row work, e.g. a single arithmetic operation.
    Small,
    /// Ordinary per-row work.
    Default,
    Medium,
    Large,
    /// Every single row is expensive enough to schedule on its own.
    Huge,
}

impl Workload {
    fn min_batch_rows(self) -> usize {
        match self {
            Workload::Small => 8192,
            Workload::Default => 2048,
            Workload::Medium => 512,
            Workload::Large => 64,
            Workload::Huge => 1,
        }
    }

    /// Number of batches to split `rows` operations into for the given
    /// parallelism. Returns 1 when running sequentially is cheaper.
    pub(crate) fn batches(self, rows: usize, parallelism: usize) -> usize {
        let min_rows = self.min_batch_rows();
        if parallelism <= 1 || rows < 2 * min_rows {
            return 1;
        }
        (parallelism * 4).min(rows / min_rows).max(1)
    }
}

/// Deterministic even split of `[0, rows)` into `batches` ranges. The bounds
/// depend only on the inputs, never on scheduling.
pub(crate) fn batch_bounds(rows: usize, batches: usize, batch: usize) -> (usize, usize) {
    (batch * rows / batches, (batch + 1) * rows / batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bounds_cover_all_rows_without_overlap() {
        for rows in [0usize, 1, 7, 100, 12345] {
            for batches in [1usize, 2, 3, 16] {
                let mut next = 0;
                for batch in 0..batches {
                    let (from, to) = batch_bounds(rows, batches, batch);
                    assert_eq!(from, next);
                    assert!(to >= from);
                    next = to;
                }
                assert_eq!(next, rows);
            }
        }
    }

    #[test]
    fn small_inputs_stay_sequential() {
        assert_eq!(Workload::Default.batches(100, 8), 1);
        assert_eq!(Workload::Default.batches(100_000, 1), 1);
        assert_eq!(Workload::Huge.batches(2, 8), 2);
    }

    #[test]
    fn batch_count_is_bounded_by_rows_and_parallelism() {
        // plenty of rows: four batches per thread
        assert_eq!(Workload::Default.batches(1_000_000, 8), 32);
        // few rows: bounded by rows per batch
        assert_eq!(Workload::Default.batches(3 * 2048, 8), 3);
    }
}
