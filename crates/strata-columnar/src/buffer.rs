use crate::column::Column;
use crate::dictionary::DictionaryBuilder;
use crate::error::ColumnError;
use crate::packed::{IndexArrayMut, IndexFormat};
use crate::types::{Capability, Category, TypeId, MISSING_INSTANT, MISSING_TIME};
use chrono::{DateTime, NaiveTime, Timelike, Utc};
use std::sync::Arc;

/// Mutable, fixed-length staging area that freezes into exactly one numeric
/// [`Column`].
///
/// Freezing consumes the buffer, transferring ownership of the backing array
/// to the column; writing after the freeze is therefore unrepresentable.
#[derive(Debug)]
pub struct NumericBuffer {
    type_id: TypeId,
    data: Vec<f64>,
}

impl NumericBuffer {
    /// A buffer for a real column. With `initialize` every entry starts out
    /// missing (NaN); otherwise entries are zero until set.
    pub fn real(length: usize, initialize: bool) -> NumericBuffer {
        NumericBuffer {
            type_id: TypeId::Real,
            data: vec![if initialize { f64::NAN } else { 0.0 }; length],
        }
    }

    /// A buffer for an integer column; see [`NumericBuffer::real`].
    pub fn integer(length: usize, initialize: bool) -> NumericBuffer {
        NumericBuffer {
            type_id: TypeId::Integer,
            data: vec![if initialize { f64::NAN } else { 0.0 }; length],
        }
    }

    /// Copies a numeric-readable column into a fresh buffer of the given
    /// numeric type.
    ///
    /// For integer buffers the copied values are re-rounded unless the
    /// source is already discrete (integer, time or categorical data never
    /// needs another rounding pass).
    pub fn from_column(column: &Column, type_id: TypeId) -> Result<NumericBuffer, ColumnError> {
        debug_assert!(matches!(type_id, TypeId::Integer | TypeId::Real));
        if !column.has_capability(Capability::NumericReadable) {
            return Err(ColumnError::NotNumericReadable(column.type_id()));
        }
        let mut data = vec![0.0; column.size()];
        column.fill_numeric(&mut data, 0);
        if type_id == TypeId::Integer
            && column.type_id() != TypeId::Integer
            && column.type_id() != TypeId::Time
            && column.category() != Category::Categorical
        {
            for value in &mut data {
                if value.is_finite() {
                    *value = value.round();
                }
            }
        }
        Ok(NumericBuffer { type_id, data })
    }

    /// Wraps already-conforming values. Integer buffers round finite entries.
    pub fn from_values(type_id: TypeId, mut data: Vec<f64>) -> NumericBuffer {
        debug_assert!(matches!(type_id, TypeId::Integer | TypeId::Real));
        if type_id == TypeId::Integer {
            for value in &mut data {
                if value.is_finite() {
                    *value = value.round();
                }
            }
        }
        NumericBuffer { type_id, data }
    }

    /// Sets the value at `index`. Integer buffers round finite values to the
    /// nearest integer (ties away from zero) and pass NaN and the infinities
    /// through unchanged.
    pub fn set(&mut self, index: usize, value: f64) {
        self.data[index] = if self.type_id == TypeId::Integer && value.is_finite() {
            value.round()
        } else {
            value
        };
    }

    pub fn get(&self, index: usize) -> f64 {
        self.data[index]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Freezes the buffer into a column, transferring the backing array.
    pub fn to_column(self) -> Column {
        Column::new_numeric(self.type_id, self.data)
    }
}

/// Staging area for a dictionary-encoded categorical column.
///
/// The index format is fixed at construction; running out of dictionary
/// slots is a [`ColumnError::DictionaryFull`], never an automatic upgrade.
#[derive(Debug)]
pub struct CategoricalBuffer {
    indices: IndexArrayMut,
    dictionary: DictionaryBuilder,
}

impl CategoricalBuffer {
    /// A buffer of the given length using `format`. All entries start out
    /// missing.
    pub fn new(length: usize, format: IndexFormat) -> CategoricalBuffer {
        CategoricalBuffer {
            indices: IndexArrayMut::new(format, length),
            dictionary: DictionaryBuilder::new(format),
        }
    }

    /// A buffer using the minimal format able to hold `max_cardinality`
    /// distinct values.
    pub fn with_max_cardinality(length: usize, max_cardinality: usize) -> CategoricalBuffer {
        CategoricalBuffer::new(length, IndexFormat::for_max_cardinality(max_cardinality))
    }

    pub fn format(&self) -> IndexFormat {
        self.indices.format()
    }

    /// Sets the value at `index`, interning new values into the dictionary.
    pub fn set(&mut self, index: usize, value: Option<Arc<str>>) -> Result<(), ColumnError> {
        let dictionary_index = match value {
            None => 0,
            Some(value) => self.dictionary.intern(value)?,
        };
        self.indices.set(index, dictionary_index);
        Ok(())
    }

    pub fn set_missing(&mut self, index: usize) {
        self.indices.set(index, 0);
    }

    /// Category index currently stored at `index`.
    pub fn index_at(&self, index: usize) -> u32 {
        self.indices.get(index)
    }

    /// Number of distinct values interned so far.
    pub fn different_values(&self) -> usize {
        self.dictionary.cardinality()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.len() == 0
    }

    pub fn to_column(self) -> Column {
        Column::new_categorical(self.indices.freeze(), self.dictionary.freeze())
    }
}

/// Staging area for a time column storing nanoseconds of the day.
#[derive(Debug)]
pub struct TimeBuffer {
    data: Vec<i64>,
}

impl TimeBuffer {
    pub fn new(length: usize, initialize: bool) -> TimeBuffer {
        TimeBuffer {
            data: vec![if initialize { MISSING_TIME } else { 0 }; length],
        }
    }

    pub fn set(&mut self, index: usize, value: Option<NaiveTime>) {
        self.data[index] = value.map_or(MISSING_TIME, nano_of_day);
    }

    pub fn get(&self, index: usize) -> Option<NaiveTime> {
        crate::column::nano_of_day_to_time(self.data[index])
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_column(self) -> Column {
        Column::new_time(self.data)
    }
}

/// Staging area for a date-time column: epoch seconds plus, when created
/// with sub-second precision, a parallel nano array.
#[derive(Debug)]
pub struct DateTimeBuffer {
    seconds: Vec<i64>,
    nanos: Option<Vec<i32>>,
}

impl DateTimeBuffer {
    pub fn new(length: usize, subsecond_precision: bool, initialize: bool) -> DateTimeBuffer {
        DateTimeBuffer {
            seconds: vec![if initialize { MISSING_INSTANT } else { 0 }; length],
            nanos: subsecond_precision.then(|| vec![0; length]),
        }
    }

    pub fn set(&mut self, index: usize, value: Option<DateTime<Utc>>) {
        match value {
            None => {
                self.seconds[index] = MISSING_INSTANT;
                if let Some(nanos) = &mut self.nanos {
                    nanos[index] = 0;
                }
            }
            Some(instant) => {
                self.seconds[index] = instant.timestamp();
                if let Some(nanos) = &mut self.nanos {
                    nanos[index] = instant.timestamp_subsec_nanos() as i32;
                }
            }
        }
    }

    /// Sets raw epoch seconds, e.g. when converting external data without
    /// going through `chrono`.
    pub fn set_epoch_seconds(&mut self, index: usize, seconds: i64) {
        self.seconds[index] = seconds;
        if let Some(nanos) = &mut self.nanos {
            nanos[index] = 0;
        }
    }

    pub fn set_missing(&mut self, index: usize) {
        self.set(index, None);
    }

    pub fn get(&self, index: usize) -> Option<DateTime<Utc>> {
        crate::column::epoch_to_instant(
            self.seconds[index],
            self.nanos.as_ref().map_or(0, |n| n[index]),
        )
    }

    pub fn len(&self) -> usize {
        self.seconds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seconds.is_empty()
    }

    pub fn to_column(self) -> Column {
        Column::new_date_time(self.seconds, self.nanos)
    }
}

/// Staging area for a free-text column.
#[derive(Debug)]
pub struct TextBuffer {
    data: Vec<Option<Arc<str>>>,
}

impl TextBuffer {
    pub fn new(length: usize) -> TextBuffer {
        TextBuffer {
            data: vec![None; length],
        }
    }

    pub fn from_values(data: Vec<Option<Arc<str>>>) -> TextBuffer {
        TextBuffer { data }
    }

    pub fn set(&mut self, index: usize, value: Option<Arc<str>>) {
        self.data[index] = value;
    }

    pub fn get(&self, index: usize) -> Option<&Arc<str>> {
        self.data[index].as_ref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_column(self) -> Column {
        Column::new_text(self.data)
    }
}

pub(crate) fn nano_of_day(time: NaiveTime) -> i64 {
    time.num_seconds_from_midnight() as i64 * 1_000_000_000 + time.nanosecond() as i64
}
