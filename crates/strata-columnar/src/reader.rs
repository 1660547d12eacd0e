use crate::column::Column;
use crate::error::ColumnError;
use crate::types::{Capability, Category, ColumnObject, ObjectValue};
use std::sync::Arc;

/// Total byte budget of a reader's scratch buffer.
pub const BUFFER_BYTES: usize = 256 * 1024;

/// Desired elements in a scratch buffer so that its size stays within
/// [`BUFFER_BYTES`].
pub const BUFFER_ELEMENTS: usize = BUFFER_BYTES / 8;

/// Minimal number of rows buffered per refill.
pub const MIN_BUFFER_ROWS: usize = 16;

/// Maximal number of rows buffered per refill.
pub const MAX_BUFFER_ROWS: usize = 1024;

/// Position reported before the first `move_next` call.
pub const BEFORE_FIRST_ROW: isize = -1;

/// Row view over numeric-readable columns.
pub trait NumericRow {
    /// Value in column `index` of the current row. Well-defined for indices
    /// `0..width()`; performs no range checks.
    fn get(&self, index: usize) -> f64;
    /// Number of values per row.
    fn width(&self) -> usize;
    /// Current 0-based row, [`BEFORE_FIRST_ROW`] before the first move.
    fn position(&self) -> isize;
}

/// Row view over categorical columns, reading raw category indices.
pub trait CategoricalRow {
    fn get_index(&self, index: usize) -> u32;
    fn width(&self) -> usize;
    fn position(&self) -> isize;
}

/// Row view over object-readable columns.
pub trait ObjectRow<T: ColumnObject> {
    /// Value in column `index` of the current row; `None` marks missing.
    fn get(&self, index: usize) -> Option<T>;
    fn width(&self) -> usize;
    fn position(&self) -> isize;
}

/// Row view exposing numeric, index and object reads side by side.
pub trait MixedRow {
    fn get_numeric(&self, index: usize) -> f64;
    fn get_index(&self, index: usize) -> u32;
    fn get_object(&self, index: usize) -> Option<ObjectValue>;
    fn width(&self) -> usize;
    fn position(&self) -> isize;
}

/// Scratch-buffer element that knows how to refill from a column.
trait Readable: Clone + Default {
    fn fill_strided(column: &Column, out: &mut [Self], start_row: usize, offset: usize, step: usize);
}

impl Readable for f64 {
    fn fill_strided(column: &Column, out: &mut [Self], start_row: usize, offset: usize, step: usize) {
        column.fill_numeric_strided(out, start_row, offset, step);
    }
}

impl Readable for u32 {
    fn fill_strided(column: &Column, out: &mut [Self], start_row: usize, offset: usize, step: usize) {
        column.fill_indices_strided(out, start_row, offset, step);
    }
}

impl Readable for Option<ObjectValue> {
    fn fill_strided(column: &Column, out: &mut [Self], start_row: usize, offset: usize, step: usize) {
        column.fill_objects_strided(out, start_row, offset, step);
    }
}

fn buffer_height(width: usize, table_height: usize, elements_hint: usize) -> usize {
    if width == 0 {
        return 0;
    }
    // at least the min buffer rows, at most the max buffer rows or the table
    // height, otherwise as many rows as fit the element budget
    MIN_BUFFER_ROWS
        .max(elements_hint / width)
        .min(table_height.min(MAX_BUFFER_ROWS))
}

/// Shared buffered-iteration core of all readers.
///
/// States are before-first, positioned and exhausted. `move_next` advances,
/// `set_position` jumps without loading; the next `move_next` performs the
/// actual load. Reads before the first `move_next` are outside the caller
/// contract and return unspecified values (or panic), matching the
/// check-free hot path.
#[derive(Debug)]
struct Raw<'a, E: Readable> {
    columns: Vec<&'a Column>,
    table_height: usize,
    width: usize,
    buffer_height: usize,
    buffer: Vec<E>,
    /// First table row currently held in the scratch buffer (in rows).
    buffer_offset: isize,
    /// Start of the current row within the scratch buffer (in elements).
    buffer_row_index: isize,
    row_index: isize,
}

impl<'a, E: Readable> Raw<'a, E> {
    fn new(columns: Vec<&'a Column>, elements_hint: usize) -> Raw<'a, E> {
        let width = columns.len();
        let table_height = columns.first().map_or(0, |c| c.size());
        let buffer_height = buffer_height(width, table_height, elements_hint);
        Raw {
            columns,
            table_height,
            width,
            buffer_height,
            buffer: Vec::new(),
            buffer_offset: -(buffer_height as isize),
            buffer_row_index: 0,
            row_index: BEFORE_FIRST_ROW,
        }
    }

    fn move_next(&mut self) {
        if self.buffer_row_index >= self.buffer.len() as isize - self.width as isize {
            if self.buffer.is_empty() {
                self.buffer = vec![E::default(); self.width * self.buffer_height];
            }
            self.buffer_offset += self.buffer_height as isize;
            debug_assert!(self.buffer_offset >= 0);
            for (i, column) in self.columns.iter().enumerate() {
                E::fill_strided(
                    column,
                    &mut self.buffer,
                    self.buffer_offset as usize,
                    i,
                    self.width,
                );
            }
            self.buffer_row_index = 0;
        } else {
            self.buffer_row_index += self.width as isize;
        }
        self.row_index += 1;
    }

    /// Jumps to `position` without loading data; the next `move_next` loads
    /// and lands on `position + 1`. `-1` rewinds before the first row.
    fn set_position(&mut self, position: isize) {
        assert!(position >= -1, "position must not be smaller than -1");
        let next = position + 1;
        if next >= self.buffer_offset && next < self.buffer_offset + self.buffer_height as isize {
            // still inside the current buffer window
            self.buffer_row_index =
                (next - self.buffer_offset) * self.width as isize - self.width as isize;
        } else {
            self.buffer_offset = next - self.buffer_height as isize;
            self.buffer_row_index = self.buffer.len() as isize;
        }
        self.row_index = position;
    }

    fn get(&self, index: usize) -> E {
        self.buffer[(self.buffer_row_index + index as isize) as usize].clone()
    }

    fn position(&self) -> isize {
        self.row_index
    }

    fn remaining(&self) -> usize {
        (self.table_height as isize - self.row_index - 1).max(0) as usize
    }

    fn has_remaining(&self) -> bool {
        self.row_index < self.table_height as isize - 1
    }
}

fn check_numeric(columns: &[Arc<Column>]) -> Result<(), ColumnError> {
    for column in columns {
        if !column.has_capability(Capability::NumericReadable) {
            return Err(ColumnError::NotNumericReadable(column.type_id()));
        }
    }
    Ok(())
}

fn check_categorical(columns: &[Arc<Column>]) -> Result<(), ColumnError> {
    for column in columns {
        if column.category() != Category::Categorical {
            return Err(ColumnError::NotCategorical(column.type_id()));
        }
    }
    Ok(())
}

fn check_object<T: ColumnObject>(columns: &[Arc<Column>]) -> Result<(), ColumnError> {
    for column in columns {
        let element_type = column
            .element_type()
            .ok_or(ColumnError::NotObjectReadable(column.type_id()))?;
        if !T::accepts(element_type) {
            return Err(ColumnError::IncompatibleElementType {
                actual: element_type,
            });
        }
    }
    Ok(())
}

macro_rules! forward_reader_api {
    () => {
        /// Moves the reader to the next row.
        pub fn move_next(&mut self) {
            self.raw.move_next();
        }

        /// Repositions without loading; see the reader state machine notes.
        pub fn set_position(&mut self, position: isize) {
            self.raw.set_position(position);
        }

        /// Number of remaining rows.
        pub fn remaining(&self) -> usize {
            self.raw.remaining()
        }

        /// Whether further rows can be read.
        pub fn has_remaining(&self) -> bool {
            self.raw.has_remaining()
        }
    };
}

/// Buffered column-oriented reader over one numeric-readable column.
pub struct NumericReader<'a> {
    raw: Raw<'a, f64>,
}

impl<'a> NumericReader<'a> {
    pub fn new(column: &'a Column) -> Result<NumericReader<'a>, ColumnError> {
        if !column.has_capability(Capability::NumericReadable) {
            return Err(ColumnError::NotNumericReadable(column.type_id()));
        }
        Ok(NumericReader {
            raw: Raw::new(vec![column], BUFFER_ELEMENTS),
        })
    }

    /// Advances to the next row and returns its value.
    pub fn read(&mut self) -> f64 {
        self.raw.move_next();
        self.raw.get(0)
    }

    pub fn position(&self) -> isize {
        self.raw.position()
    }

    forward_reader_api!();
}

/// Buffered column-oriented reader over one categorical column.
pub struct CategoricalReader<'a> {
    raw: Raw<'a, u32>,
}

impl<'a> CategoricalReader<'a> {
    pub fn new(column: &'a Column) -> Result<CategoricalReader<'a>, ColumnError> {
        if column.category() != Category::Categorical {
            return Err(ColumnError::NotCategorical(column.type_id()));
        }
        Ok(CategoricalReader {
            raw: Raw::new(vec![column], BUFFER_ELEMENTS),
        })
    }

    /// Advances to the next row and returns its category index.
    pub fn read(&mut self) -> u32 {
        self.raw.move_next();
        self.raw.get(0)
    }

    pub fn position(&self) -> isize {
        self.raw.position()
    }

    forward_reader_api!();
}

/// Buffered column-oriented reader over one object-readable column.
pub struct ObjectReader<'a, T: ColumnObject> {
    raw: Raw<'a, Option<ObjectValue>>,
    _marker: std::marker::PhantomData<T>,
}

impl<'a, T: ColumnObject> ObjectReader<'a, T> {
    pub fn new(column: &'a Column) -> Result<ObjectReader<'a, T>, ColumnError> {
        let element_type = column
            .element_type()
            .ok_or(ColumnError::NotObjectReadable(column.type_id()))?;
        if !T::accepts(element_type) {
            return Err(ColumnError::IncompatibleElementType {
                actual: element_type,
            });
        }
        Ok(ObjectReader {
            raw: Raw::new(vec![column], BUFFER_ELEMENTS),
            _marker: std::marker::PhantomData,
        })
    }

    /// Advances to the next row and returns its value.
    pub fn read(&mut self) -> Option<T> {
        self.raw.move_next();
        self.raw.get(0).and_then(T::from_value)
    }

    pub fn position(&self) -> isize {
        self.raw.position()
    }

    forward_reader_api!();
}

/// Buffered row-oriented reader over numeric-readable columns of equal
/// length.
///
/// In its initial state the reader does not point at a valid row; call
/// `move_next` at least once before reading:
///
/// ```ignore
/// while reader.has_remaining() {
///     reader.move_next();
///     for i in 0..reader.width() {
///         let value = reader.get(i);
///     }
/// }
/// ```
#[derive(Debug)]
pub struct NumericRowReader<'a> {
    raw: Raw<'a, f64>,
}

impl<'a> NumericRowReader<'a> {
    pub fn new(columns: &'a [Arc<Column>]) -> Result<NumericRowReader<'a>, ColumnError> {
        NumericRowReader::with_buffer_hint(columns, BUFFER_ELEMENTS)
    }

    /// Like `new` with a suggested total scratch-buffer element count,
    /// mostly useful to force refills in tests.
    pub fn with_buffer_hint(
        columns: &'a [Arc<Column>],
        elements_hint: usize,
    ) -> Result<NumericRowReader<'a>, ColumnError> {
        check_numeric(columns)?;
        Ok(NumericRowReader {
            raw: Raw::new(columns.iter().map(Arc::as_ref).collect(), elements_hint),
        })
    }

    forward_reader_api!();
}

impl NumericRow for NumericRowReader<'_> {
    fn get(&self, index: usize) -> f64 {
        self.raw.get(index)
    }

    fn width(&self) -> usize {
        self.raw.width
    }

    fn position(&self) -> isize {
        self.raw.position()
    }
}

/// Buffered row-oriented reader over categorical columns.
pub struct CategoricalRowReader<'a> {
    raw: Raw<'a, u32>,
}

impl<'a> CategoricalRowReader<'a> {
    pub fn new(columns: &'a [Arc<Column>]) -> Result<CategoricalRowReader<'a>, ColumnError> {
        CategoricalRowReader::with_buffer_hint(columns, BUFFER_ELEMENTS)
    }

    pub fn with_buffer_hint(
        columns: &'a [Arc<Column>],
        elements_hint: usize,
    ) -> Result<CategoricalRowReader<'a>, ColumnError> {
        check_categorical(columns)?;
        Ok(CategoricalRowReader {
            raw: Raw::new(columns.iter().map(Arc::as_ref).collect(), elements_hint),
        })
    }

    forward_reader_api!();
}

impl CategoricalRow for CategoricalRowReader<'_> {
    fn get_index(&self, index: usize) -> u32 {
        self.raw.get(index)
    }

    fn width(&self) -> usize {
        self.raw.width
    }

    fn position(&self) -> isize {
        self.raw.position()
    }
}

/// Buffered row-oriented reader over object-readable columns.
///
/// Construction verifies that every column's element type is assignable to
/// the requested type `T`; a violation is an error here, never a per-row
/// failure.
#[derive(Debug)]
pub struct ObjectRowReader<'a, T: ColumnObject> {
    raw: Raw<'a, Option<ObjectValue>>,
    _marker: std::marker::PhantomData<T>,
}

impl<'a, T: ColumnObject> ObjectRowReader<'a, T> {
    pub fn new(columns: &'a [Arc<Column>]) -> Result<ObjectRowReader<'a, T>, ColumnError> {
        ObjectRowReader::with_buffer_hint(columns, BUFFER_ELEMENTS)
    }

    pub fn with_buffer_hint(
        columns: &'a [Arc<Column>],
        elements_hint: usize,
    ) -> Result<ObjectRowReader<'a, T>, ColumnError> {
        check_object::<T>(columns)?;
        Ok(ObjectRowReader {
            raw: Raw::new(columns.iter().map(Arc::as_ref).collect(), elements_hint),
            _marker: std::marker::PhantomData,
        })
    }

    forward_reader_api!();
}

impl<T: ColumnObject> ObjectRow<T> for ObjectRowReader<'_, T> {
    fn get(&self, index: usize) -> Option<T> {
        // conversion cannot fail after the construction-time element check
        self.raw.get(index).and_then(T::from_value)
    }

    fn width(&self) -> usize {
        self.raw.width
    }

    fn position(&self) -> isize {
        self.raw.position()
    }
}

/// Buffered row-oriented reader exposing numeric, index and object views of
/// every row side by side. Accepts columns of any category; reads that a
/// column does not support come back as NaN, index 0 or `None` respectively.
pub struct MixedRowReader<'a> {
    columns: Vec<&'a Column>,
    table_height: usize,
    width: usize,
    buffer_height: usize,
    numeric: Vec<f64>,
    indices: Vec<u32>,
    objects: Vec<Option<ObjectValue>>,
    buffer_offset: isize,
    buffer_row_index: isize,
    row_index: isize,
}

impl<'a> MixedRowReader<'a> {
    pub fn new(columns: &'a [Arc<Column>]) -> MixedRowReader<'a> {
        // three parallel scratch buffers share the byte budget
        MixedRowReader::with_buffer_hint(columns, BUFFER_ELEMENTS / 2)
    }

    pub fn with_buffer_hint(columns: &'a [Arc<Column>], elements_hint: usize) -> MixedRowReader<'a> {
        let columns: Vec<&Column> = columns.iter().map(Arc::as_ref).collect();
        let width = columns.len();
        let table_height = columns.first().map_or(0, |c| c.size());
        let buffer_height = buffer_height(width, table_height, elements_hint);
        MixedRowReader {
            columns,
            table_height,
            width,
            buffer_height,
            numeric: Vec::new(),
            indices: Vec::new(),
            objects: Vec::new(),
            buffer_offset: -(buffer_height as isize),
            buffer_row_index: 0,
            row_index: BEFORE_FIRST_ROW,
        }
    }

    pub fn move_next(&mut self) {
        if self.buffer_row_index >= self.numeric.len() as isize - self.width as isize {
            if self.numeric.is_empty() {
                let elements = self.width * self.buffer_height;
                self.numeric = vec![f64::NAN; elements];
                self.indices = vec![0; elements];
                self.objects = vec![None; elements];
            }
            self.buffer_offset += self.buffer_height as isize;
            debug_assert!(self.buffer_offset >= 0);
            let start_row = self.buffer_offset as usize;
            for (i, column) in self.columns.iter().enumerate() {
                column.fill_numeric_strided(&mut self.numeric, start_row, i, self.width);
                column.fill_indices_strided(&mut self.indices, start_row, i, self.width);
                column.fill_objects_strided(&mut self.objects, start_row, i, self.width);
            }
            self.buffer_row_index = 0;
        } else {
            self.buffer_row_index += self.width as isize;
        }
        self.row_index += 1;
    }

    pub fn set_position(&mut self, position: isize) {
        assert!(position >= -1, "position must not be smaller than -1");
        let next = position + 1;
        if next >= self.buffer_offset && next < self.buffer_offset + self.buffer_height as isize {
            self.buffer_row_index =
                (next - self.buffer_offset) * self.width as isize - self.width as isize;
        } else {
            self.buffer_offset = next - self.buffer_height as isize;
            self.buffer_row_index = self.numeric.len() as isize;
        }
        self.row_index = position;
    }

    pub fn remaining(&self) -> usize {
        (self.table_height as isize - self.row_index - 1).max(0) as usize
    }

    pub fn has_remaining(&self) -> bool {
        self.row_index < self.table_height as isize - 1
    }
}

impl MixedRow for MixedRowReader<'_> {
    fn get_numeric(&self, index: usize) -> f64 {
        self.numeric[(self.buffer_row_index + index as isize) as usize]
    }

    fn get_index(&self, index: usize) -> u32 {
        self.indices[(self.buffer_row_index + index as isize) as usize]
    }

    fn get_object(&self, index: usize) -> Option<ObjectValue> {
        self.objects[(self.buffer_row_index + index as isize) as usize].clone()
    }

    fn width(&self) -> usize {
        self.width
    }

    fn position(&self) -> isize {
        self.row_index
    }
}
