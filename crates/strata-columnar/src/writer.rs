use crate::buffer::nano_of_day;
use crate::column::Column;
use crate::dictionary::DictionaryBuilder;
use crate::error::ColumnError;
use crate::packed::{IndexArrayMut, IndexFormat};
use crate::reader::MAX_BUFFER_ROWS;
use crate::table::Table;
use crate::types::{ElementType, ObjectValue, TypeId, MISSING_INSTANT, MISSING_TIME};
use std::sync::Arc;

const BUFFER_HEIGHT: usize = MAX_BUFFER_ROWS;

/// Growing storage behind one column of a row writer.
#[derive(Debug)]
enum ColumnData {
    Real(Vec<f64>),
    Integer(Vec<f64>),
    Nominal {
        indices: Vec<u32>,
        dictionary: DictionaryBuilder,
    },
    Time(Vec<i64>),
    DateTime {
        seconds: Vec<i64>,
        nanos: Vec<i32>,
    },
    Text(Vec<Option<Arc<str>>>),
}

impl ColumnData {
    fn for_type(type_id: TypeId) -> ColumnData {
        match type_id {
            TypeId::Real => ColumnData::Real(Vec::new()),
            TypeId::Integer => ColumnData::Integer(Vec::new()),
            TypeId::Nominal => ColumnData::Nominal {
                indices: Vec::new(),
                // the widest format; the final column picks the smallest one
                dictionary: DictionaryBuilder::new(IndexFormat::U32),
            },
            TypeId::Time => ColumnData::Time(Vec::new()),
            TypeId::DateTime => ColumnData::DateTime {
                seconds: Vec::new(),
                nanos: Vec::new(),
            },
            TypeId::Text => ColumnData::Text(Vec::new()),
        }
    }

    fn freeze(self, length: usize) -> Column {
        match self {
            ColumnData::Real(data) => {
                debug_assert_eq!(data.len(), length);
                Column::new_numeric(TypeId::Real, data)
            }
            ColumnData::Integer(data) => {
                debug_assert_eq!(data.len(), length);
                Column::new_numeric(TypeId::Integer, data)
            }
            ColumnData::Nominal {
                indices,
                dictionary,
            } => {
                let format = IndexFormat::for_max_cardinality(dictionary.cardinality());
                let mut packed = IndexArrayMut::new(format, length);
                for (i, index) in indices.iter().enumerate() {
                    packed.set(i, *index);
                }
                Column::new_categorical(packed.freeze(), dictionary.freeze())
            }
            ColumnData::Time(data) => Column::new_time(data),
            ColumnData::DateTime { seconds, nanos } => {
                Column::new_date_time(seconds, Some(nanos))
            }
            ColumnData::Text(data) => Column::new_text(data),
        }
    }
}

/// Row-oriented writer producing a table of numeric columns.
///
/// Rows are staged in a row-major scratch buffer and appended to growing
/// column storage in chunks. The writer starts before the first row; call
/// `move_next` before the first `set`:
///
/// ```ignore
/// for row in values {
///     writer.move_next();
///     writer.set(0, row);
/// }
/// let table = writer.create()?;
/// ```
#[derive(Debug)]
pub struct NumericRowWriter {
    labels: Vec<String>,
    columns: Vec<ColumnData>,
    width: usize,
    initialize: bool,
    buffer: Vec<f64>,
    buffer_offset: isize,
    buffer_row_index: isize,
    row_index: isize,
}

impl NumericRowWriter {
    /// Creates a writer for the given labels and numeric column types.
    ///
    /// With `initialize` set, values not written before the next `move_next`
    /// become missing; otherwise unset values are unspecified.
    pub fn new(
        labels: Vec<String>,
        types: &[TypeId],
        initialize: bool,
    ) -> Result<NumericRowWriter, ColumnError> {
        if labels.len() != types.len() {
            return Err(ColumnError::LabelCountMismatch {
                columns: types.len(),
                labels: labels.len(),
            });
        }
        let columns = types
            .iter()
            .map(|&t| match t {
                TypeId::Real | TypeId::Integer => Ok(ColumnData::for_type(t)),
                other => Err(ColumnError::NotNumericReadable(other)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NumericRowWriter {
            labels,
            width: columns.len(),
            columns,
            initialize,
            buffer: Vec::new(),
            buffer_offset: -(BUFFER_HEIGHT as isize),
            buffer_row_index: 0,
            row_index: -1,
        })
    }

    /// Moves the writer to the next row, flushing the scratch buffer when it
    /// is full.
    pub fn move_next(&mut self) {
        if self.buffer_row_index >= self.buffer.len() as isize - self.width as isize {
            if self.buffer.is_empty() {
                self.buffer = vec![f64::NAN; self.width * BUFFER_HEIGHT];
            } else {
                self.flush(BUFFER_HEIGHT);
                if self.initialize {
                    self.buffer.fill(f64::NAN);
                }
            }
            self.buffer_offset += BUFFER_HEIGHT as isize;
            self.buffer_row_index = 0;
        } else {
            self.buffer_row_index += self.width as isize;
        }
        self.row_index += 1;
    }

    /// Sets the value in column `index` of the current row.
    pub fn set(&mut self, index: usize, value: f64) {
        self.buffer[(self.buffer_row_index + index as isize) as usize] = value;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn position(&self) -> isize {
        self.row_index
    }

    fn flush(&mut self, rows: usize) {
        let width = self.width;
        let buffer = &self.buffer;
        for (c, column) in self.columns.iter_mut().enumerate() {
            match column {
                ColumnData::Real(data) => {
                    data.extend((0..rows).map(|r| buffer[r * width + c]));
                }
                ColumnData::Integer(data) => {
                    data.extend((0..rows).map(|r| {
                        let v = buffer[r * width + c];
                        if v.is_finite() {
                            v.round()
                        } else {
                            v
                        }
                    }));
                }
                _ => {}
            }
        }
    }

    /// Flushes the remaining rows and freezes the result into a table.
    pub fn create(mut self) -> Result<Table, ColumnError> {
        let pending = (self.row_index - self.buffer_offset + 1).max(0) as usize;
        if pending > 0 && !self.buffer.is_empty() {
            self.flush(pending);
        }
        let length = (self.row_index + 1) as usize;
        let columns = self
            .columns
            .into_iter()
            .map(|c| Arc::new(c.freeze(length)))
            .collect();
        Table::new(columns, self.labels)
    }
}

/// Row-oriented writer producing a table of columns of any type.
///
/// Numeric columns are written through `set`, all others through
/// `set_object`. Writes to the wrong kind of column are ignored for `set`
/// and rejected for `set_object`.
pub struct MixedRowWriter {
    labels: Vec<String>,
    columns: Vec<ColumnData>,
    width: usize,
    initialize: bool,
    numeric: Vec<f64>,
    indices: Vec<u32>,
    objects: Vec<Option<ObjectValue>>,
    buffer_offset: isize,
    buffer_row_index: isize,
    row_index: isize,
}

impl MixedRowWriter {
    pub fn new(
        labels: Vec<String>,
        types: &[TypeId],
        initialize: bool,
    ) -> Result<MixedRowWriter, ColumnError> {
        if labels.len() != types.len() {
            return Err(ColumnError::LabelCountMismatch {
                columns: types.len(),
                labels: labels.len(),
            });
        }
        let columns: Vec<ColumnData> = types.iter().map(|&t| ColumnData::for_type(t)).collect();
        Ok(MixedRowWriter {
            labels,
            width: columns.len(),
            columns,
            initialize,
            numeric: Vec::new(),
            indices: Vec::new(),
            objects: Vec::new(),
            buffer_offset: -(BUFFER_HEIGHT as isize),
            buffer_row_index: 0,
            row_index: -1,
        })
    }

    pub fn move_next(&mut self) {
        if self.buffer_row_index >= self.numeric.len() as isize - self.width as isize {
            if self.numeric.is_empty() {
                let elements = self.width * BUFFER_HEIGHT;
                self.numeric = vec![f64::NAN; elements];
                self.indices = vec![0; elements];
                self.objects = vec![None; elements];
            } else {
                self.flush(BUFFER_HEIGHT);
                if self.initialize {
                    self.numeric.fill(f64::NAN);
                    self.indices.fill(0);
                    self.objects.fill(None);
                }
            }
            self.buffer_offset += BUFFER_HEIGHT as isize;
            self.buffer_row_index = 0;
        } else {
            self.buffer_row_index += self.width as isize;
        }
        self.row_index += 1;
    }

    /// Sets the value in numeric column `index` of the current row. Writes
    /// to non-numeric columns are dropped when the row is flushed.
    pub fn set(&mut self, index: usize, value: f64) {
        self.numeric[(self.buffer_row_index + index as isize) as usize] = value;
    }

    /// Sets the value in non-numeric column `index` of the current row;
    /// `None` marks the value missing.
    ///
    /// The value's element type must match the column type. Nominal values
    /// are interned right away, so the error for an exhausted dictionary
    /// surfaces here.
    pub fn set_object(
        &mut self,
        index: usize,
        value: Option<ObjectValue>,
    ) -> Result<(), ColumnError> {
        let slot = (self.buffer_row_index + index as isize) as usize;
        let required = match &self.columns[index] {
            ColumnData::Nominal { .. } | ColumnData::Text(_) => ElementType::Text,
            ColumnData::Time(_) => ElementType::Time,
            ColumnData::DateTime { .. } => ElementType::Instant,
            ColumnData::Real(_) => return Err(ColumnError::NotObjectReadable(TypeId::Real)),
            ColumnData::Integer(_) => {
                return Err(ColumnError::NotObjectReadable(TypeId::Integer));
            }
        };
        if let Some(value) = &value {
            if value.element_type() != required {
                return Err(ColumnError::IncompatibleElementType {
                    actual: value.element_type(),
                });
            }
        }
        if let ColumnData::Nominal { dictionary, .. } = &mut self.columns[index] {
            self.indices[slot] = match value {
                Some(ObjectValue::Text(s)) => dictionary.intern(s)?,
                _ => 0,
            };
        } else {
            self.objects[slot] = value;
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn position(&self) -> isize {
        self.row_index
    }

    fn flush(&mut self, rows: usize) {
        let width = self.width;
        let numeric = &self.numeric;
        let indices = &self.indices;
        let objects = &self.objects;
        for (c, column) in self.columns.iter_mut().enumerate() {
            match column {
                ColumnData::Real(data) => {
                    data.extend((0..rows).map(|r| numeric[r * width + c]));
                }
                ColumnData::Integer(data) => {
                    data.extend((0..rows).map(|r| {
                        let v = numeric[r * width + c];
                        if v.is_finite() {
                            v.round()
                        } else {
                            v
                        }
                    }));
                }
                ColumnData::Nominal { indices: data, .. } => {
                    data.extend((0..rows).map(|r| indices[r * width + c]));
                }
                ColumnData::Time(data) => {
                    data.extend((0..rows).map(|r| match &objects[r * width + c] {
                        Some(ObjectValue::Time(t)) => nano_of_day(*t),
                        _ => MISSING_TIME,
                    }));
                }
                ColumnData::DateTime { seconds, nanos } => {
                    for r in 0..rows {
                        match &objects[r * width + c] {
                            Some(ObjectValue::Instant(dt)) => {
                                seconds.push(dt.timestamp());
                                nanos.push(dt.timestamp_subsec_nanos() as i32);
                            }
                            _ => {
                                seconds.push(MISSING_INSTANT);
                                nanos.push(0);
                            }
                        }
                    }
                }
                ColumnData::Text(data) => {
                    data.extend((0..rows).map(|r| match &objects[r * width + c] {
                        Some(ObjectValue::Text(s)) => Some(s.clone()),
                        _ => None,
                    }));
                }
            }
        }
    }

    pub fn create(mut self) -> Result<Table, ColumnError> {
        let pending = (self.row_index - self.buffer_offset + 1).max(0) as usize;
        if pending > 0 && !self.numeric.is_empty() {
            self.flush(pending);
        }
        let length = (self.row_index + 1) as usize;
        let columns = self
            .columns
            .into_iter()
            .map(|c| Arc::new(c.freeze(length)))
            .collect();
        Table::new(columns, self.labels)
    }
}
