use crate::context::Context;
use crate::workload::{batch_bounds, Workload};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fractional-progress callback; receives values in `[0, 1]`.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// A batched computation over a fixed number of row operations.
///
/// The executor calls `init` once, then `do_part` once per batch with
/// disjoint `[from, to)` ranges covering `0..number_of_operations()`,
/// possibly concurrently, and finally consumes the calculator for its
/// result. Implementations must not rely on any particular batch order.
pub trait Calculator: Sync {
    type Output;

    /// Called once with the number of batches before any `do_part` call.
    fn init(&mut self, batches: usize);

    /// Total number of row operations to split into batches.
    fn number_of_operations(&self) -> usize;

    /// Processes rows `[from, to)` as batch `batch`.
    fn do_part(&self, from: usize, to: usize, batch: usize);

    /// Consumes the calculator after every batch has completed.
    fn result(self) -> Self::Output;
}

/// Drives a [`Calculator`] through a [`Context`].
///
/// Splits the operations into deterministic batches sized by the workload,
/// reports fractional progress after each completed batch, and performs no
/// validation of its own; calculators are constructed from already-validated
/// inputs.
pub struct ParallelExecutor<'a> {
    context: &'a dyn Context,
    workload: Workload,
    callback: Option<ProgressCallback>,
}

impl<'a> ParallelExecutor<'a> {
    pub fn new(context: &'a dyn Context, workload: Workload) -> ParallelExecutor<'a> {
        ParallelExecutor {
            context,
            workload,
            callback: None,
        }
    }

    pub fn with_callback(mut self, callback: Option<ProgressCallback>) -> ParallelExecutor<'a> {
        self.callback = callback;
        self
    }

    pub fn run<C: Calculator>(&self, mut calculator: C) -> C::Output {
        let rows = calculator.number_of_operations();
        let batches = self
            .workload
            .batches(rows, self.context.parallelism_hint());
        calculator.init(batches);

        let completed = AtomicUsize::new(0);
        let calculator_ref = &calculator;
        self.context.run_batches(batches, &|batch| {
            let (from, to) = batch_bounds(rows, batches, batch);
            calculator_ref.do_part(from, to, batch);
            if let Some(callback) = &self.callback {
                let done = completed.fetch_add(to - from, Ordering::Relaxed) + (to - from);
                callback(done as f64 / rows.max(1) as f64);
            }
        });
        calculator.result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SequentialContext;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    struct SumCalculator {
        rows: usize,
        partials: Mutex<Vec<(usize, usize)>>,
    }

    impl Calculator for SumCalculator {
        type Output = Vec<(usize, usize)>;

        fn init(&mut self, _batches: usize) {}

        fn number_of_operations(&self) -> usize {
            self.rows
        }

        fn do_part(&self, from: usize, to: usize, _batch: usize) {
            self.partials.lock().expect("partials").push((from, to));
        }

        fn result(self) -> Self::Output {
            self.partials.into_inner().expect("partials")
        }
    }

    #[test]
    fn sequential_context_runs_one_batch() {
        let executor = ParallelExecutor::new(&SequentialContext, Workload::Default);
        let parts = executor.run(SumCalculator {
            rows: 100_000,
            partials: Mutex::new(Vec::new()),
        });
        assert_eq!(parts, vec![(0, 100_000)]);
    }

    #[test]
    fn progress_reaches_one() {
        let progress = Arc::new(Mutex::new(Vec::new()));
        let sink = progress.clone();
        let executor = ParallelExecutor::new(&SequentialContext, Workload::Default)
            .with_callback(Some(Arc::new(move |p| {
                sink.lock().expect("progress").push(p);
            })));
        executor.run(SumCalculator {
            rows: 10,
            partials: Mutex::new(Vec::new()),
        });
        let reported = progress.lock().expect("progress").clone();
        assert_eq!(reported, vec![1.0]);
    }
}
