//! Deterministic batched map/reduce over Strata columns.
//!
//! This crate focuses on:
//! - A [`Calculator`] abstraction splitting row-wise work into disjoint
//!   batches with deterministic bounds.
//! - Execution contexts: strictly sequential, or a crate-local Rayon pool
//!   behind the default-on `parallel` feature with a sequential fallback.
//! - A [`CombineTree`] that merges per-batch results in a fixed order, so
//!   reductions with an associative combiner do not depend on which batch
//!   finishes first.
//! - [`RowTransformer`], the row-wise map/reduce entry point producing new
//!   columns from existing ones.

#![forbid(unsafe_code)]

mod applier;
mod combine;
mod context;
mod error;
mod executor;
mod parallel;
mod reduce;
mod transformer;
mod workload;

pub use crate::combine::CombineTree;
pub use crate::context::{Context, PoolContext, SequentialContext};
pub use crate::error::TransformError;
pub use crate::executor::{Calculator, ParallelExecutor, ProgressCallback};
pub use crate::transformer::RowTransformer;
pub use crate::workload::Workload;
