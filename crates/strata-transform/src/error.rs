use strata_columnar::ColumnError;
use thiserror::Error;

/// Errors surfaced by transformation setup.
///
/// All of these are fail-fast: they are returned before any batch is
/// dispatched.
#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("transformation requires at least one input column")]
    EmptyColumns,

    #[error("input columns must all have the same length ({expected} != {actual})")]
    MismatchedLengths { expected: usize, actual: usize },

    #[error(transparent)]
    Column(#[from] ColumnError),
}
