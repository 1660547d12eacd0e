use crate::types::{ElementType, TypeId};
use thiserror::Error;

/// Errors surfaced by column, buffer, reader and table construction.
///
/// All of these are fail-fast: they are returned to the immediate caller
/// before any row is processed.
#[derive(Debug, Error, PartialEq)]
pub enum ColumnError {
    #[error("column of type {0:?} is not numeric-readable")]
    NotNumericReadable(TypeId),

    #[error("column of type {0:?} is not object-readable")]
    NotObjectReadable(TypeId),

    #[error("column of type {0:?} is not categorical")]
    NotCategorical(TypeId),

    #[error("column of type {0:?} is not sortable")]
    NotSortable(TypeId),

    #[error("column element type {actual:?} is not assignable to the requested reader type")]
    IncompatibleElementType { actual: ElementType },

    #[error("categorical dictionary is full: format holds at most {capacity} distinct values")]
    DictionaryFull { capacity: usize },

    #[error("expected {columns} labels, got {labels}")]
    LabelCountMismatch { columns: usize, labels: usize },

    #[error("columns must all have the same length ({expected} != {actual})")]
    MismatchedLengths { expected: usize, actual: usize },

    #[error("column list must not be empty")]
    EmptyColumns,
}
