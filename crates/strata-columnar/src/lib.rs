//! Immutable columnar table storage for Strata.
//!
//! This crate focuses on:
//! - Typed column representation (numeric, dictionary-encoded nominal, time,
//!   date-time and text) with packed category indices.
//! - A buffer-then-freeze construction protocol: mutable buffers and row
//!   writers are consumed to produce immutable, cheaply shareable columns.
//! - Row reordering and selection via `Column::map`, returning either a
//!   mapped view or a materialized copy.
//! - Buffered readers and row writers that stage rows in fixed-size scratch
//!   buffers for cache-friendly access.

#![forbid(unsafe_code)]

mod buffer;
mod column;
mod dictionary;
mod error;
mod packed;
mod reader;
mod table;
mod types;
mod writer;

pub use crate::buffer::{
    CategoricalBuffer, DateTimeBuffer, NumericBuffer, TextBuffer, TimeBuffer,
};
pub use crate::column::Column;
pub use crate::dictionary::Dictionary;
pub use crate::error::ColumnError;
pub use crate::packed::IndexFormat;
pub use crate::reader::{
    CategoricalReader, CategoricalRow, CategoricalRowReader, MixedRow, MixedRowReader,
    NumericReader, NumericRow, NumericRowReader, ObjectReader, ObjectRow, ObjectRowReader,
    BEFORE_FIRST_ROW, BUFFER_BYTES, BUFFER_ELEMENTS, MAX_BUFFER_ROWS, MIN_BUFFER_ROWS,
};
pub use crate::table::Table;
pub use crate::types::{
    Capability, Category, ColumnObject, ElementType, ObjectValue, Order, TypeId,
    MAPPING_THRESHOLD, MISSING_INSTANT, MISSING_TIME,
};
pub use crate::writer::{MixedRowWriter, NumericRowWriter};
