/// Execution environment for batch tasks.
///
/// The engine never spawns threads itself; it hands batches to a context and
/// waits for all of them to complete. Results do not depend on which context
/// runs them.
pub trait Context: Sync {
    /// Upper bound on the number of batches worth running concurrently.
    fn parallelism_hint(&self) -> usize;

    /// Runs `task` for every batch index in `0..batches` and waits for all
    /// of them. Completion order is unspecified.
    fn run_batches(&self, batches: usize, task: &(dyn Fn(usize) + Sync));
}

/// Runs every batch on the calling thread, in index order.
pub struct SequentialContext;

impl Context for SequentialContext {
    fn parallelism_hint(&self) -> usize {
        1
    }

    fn run_batches(&self, batches: usize, task: &(dyn Fn(usize) + Sync)) {
        for batch in 0..batches {
            task(batch);
        }
    }
}

/// Runs batches on the crate-local Rayon pool.
///
/// Falls back to the calling thread when the `parallel` feature is off, on
/// WASM targets, or when no pool could be built.
#[derive(Default)]
pub struct PoolContext;

impl PoolContext {
    pub fn new() -> PoolContext {
        PoolContext
    }
}

impl Context for PoolContext {
    fn parallelism_hint(&self) -> usize {
        #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
        if let Some(pool) = crate::parallel::rayon_pool() {
            return pool.current_num_threads();
        }
        1
    }

    fn run_batches(&self, batches: usize, task: &(dyn Fn(usize) + Sync)) {
        #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
        if batches > 1 {
            if let Some(pool) = crate::parallel::rayon_pool() {
                pool.install(|| {
                    use rayon::prelude::*;
                    (0..batches).into_par_iter().for_each(|batch| task(batch));
                });
                return;
            }
        }
        for batch in 0..batches {
            task(batch);
        }
    }
}
