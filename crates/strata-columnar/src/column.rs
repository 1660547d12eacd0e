use crate::dictionary::Dictionary;
use crate::error::ColumnError;
use crate::packed::{IndexArray, IndexArrayMut};
use crate::types::{
    Capability, Category, ElementType, ObjectValue, Order, TypeId, MAPPING_THRESHOLD,
    MISSING_INSTANT, MISSING_TIME,
};
use chrono::{DateTime, NaiveTime, Utc};
use std::cmp::Ordering;
use std::sync::Arc;

/// Immutable, fixed-length, typed data holder.
///
/// A column never exposes its backing storage; all access goes through the
/// `fill`/`get` operations or a dictionary lookup. Row selections produced by
/// [`Column::map`] share the backing arrays of the original column via
/// reference counting, so views stay valid for as long as any owner is alive.
#[derive(Clone, Debug)]
pub struct Column {
    rep: Rep,
}

#[derive(Clone, Debug)]
enum Rep {
    Numeric {
        type_id: TypeId,
        data: Arc<[f64]>,
        mapping: Option<Arc<[i32]>>,
    },
    Categorical {
        indices: IndexArray,
        dictionary: Arc<Dictionary>,
        mapping: Option<Arc<[i32]>>,
    },
    Time {
        data: Arc<[i64]>,
        mapping: Option<Arc<[i32]>>,
    },
    DateTime {
        seconds: Arc<[i64]>,
        nanos: Option<Arc<[i32]>>,
        mapping: Option<Arc<[i32]>>,
    },
    Text {
        data: Arc<[Option<Arc<str>>]>,
        mapping: Option<Arc<[i32]>>,
    },
}

/// Resolves a row of a (possibly mapped) column to an index into the backing
/// arrays. `None` marks a missing row introduced by an out-of-range or
/// negative mapping entry.
#[inline]
fn resolve(mapping: &Option<Arc<[i32]>>, backing_len: usize, row: usize) -> Option<usize> {
    match mapping {
        None => Some(row),
        Some(mapping) => {
            let index = mapping[row];
            (index >= 0 && (index as usize) < backing_len).then_some(index as usize)
        }
    }
}

impl Column {
    pub(crate) fn new_numeric(type_id: TypeId, data: Vec<f64>) -> Column {
        debug_assert!(matches!(type_id, TypeId::Integer | TypeId::Real));
        Column {
            rep: Rep::Numeric {
                type_id,
                data: data.into(),
                mapping: None,
            },
        }
    }

    pub(crate) fn new_categorical(indices: IndexArray, dictionary: Dictionary) -> Column {
        Column {
            rep: Rep::Categorical {
                indices,
                dictionary: Arc::new(dictionary),
                mapping: None,
            },
        }
    }

    pub(crate) fn new_time(data: Vec<i64>) -> Column {
        Column {
            rep: Rep::Time {
                data: data.into(),
                mapping: None,
            },
        }
    }

    pub(crate) fn new_date_time(seconds: Vec<i64>, nanos: Option<Vec<i32>>) -> Column {
        if let Some(nanos) = &nanos {
            debug_assert_eq!(seconds.len(), nanos.len());
        }
        Column {
            rep: Rep::DateTime {
                seconds: seconds.into(),
                nanos: nanos.map(Into::into),
                mapping: None,
            },
        }
    }

    pub(crate) fn new_text(data: Vec<Option<Arc<str>>>) -> Column {
        Column {
            rep: Rep::Text {
                data: data.into(),
                mapping: None,
            },
        }
    }

    /// Number of rows. Fixed for the column's lifetime.
    pub fn size(&self) -> usize {
        match &self.rep {
            Rep::Numeric { data, mapping, .. } => {
                mapping.as_ref().map_or(data.len(), |m| m.len())
            }
            Rep::Categorical {
                indices, mapping, ..
            } => mapping.as_ref().map_or(indices.len(), |m| m.len()),
            Rep::Time { data, mapping } => mapping.as_ref().map_or(data.len(), |m| m.len()),
            Rep::DateTime {
                seconds, mapping, ..
            } => mapping.as_ref().map_or(seconds.len(), |m| m.len()),
            Rep::Text { data, mapping } => mapping.as_ref().map_or(data.len(), |m| m.len()),
        }
    }

    pub fn type_id(&self) -> TypeId {
        match &self.rep {
            Rep::Numeric { type_id, .. } => *type_id,
            Rep::Categorical { .. } => TypeId::Nominal,
            Rep::Time { .. } => TypeId::Time,
            Rep::DateTime { .. } => TypeId::DateTime,
            Rep::Text { .. } => TypeId::Text,
        }
    }

    pub fn category(&self) -> Category {
        self.type_id().category()
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.type_id().has_capability(capability)
    }

    pub fn element_type(&self) -> Option<ElementType> {
        self.type_id().element_type()
    }

    /// Whether this column is a view sharing another column's backing arrays.
    pub fn is_view(&self) -> bool {
        match &self.rep {
            Rep::Numeric { mapping, .. }
            | Rep::Categorical { mapping, .. }
            | Rep::Time { mapping, .. }
            | Rep::DateTime { mapping, .. }
            | Rep::Text { mapping, .. } => mapping.is_some(),
        }
    }

    /// Dictionary of a categorical column.
    pub fn dictionary(&self) -> Option<&Arc<Dictionary>> {
        match &self.rep {
            Rep::Categorical { dictionary, .. } => Some(dictionary),
            _ => None,
        }
    }

    /// Whether a date-time column carries a sub-second nano array.
    pub fn has_subsecond_precision(&self) -> bool {
        matches!(&self.rep, Rep::DateTime { nanos: Some(_), .. })
    }

    /// Numeric read of a single row: the value for numeric columns, the
    /// category index for categorical columns, nanos of the day for time
    /// columns and NaN for anything else or missing.
    pub fn get_numeric(&self, row: usize) -> f64 {
        match &self.rep {
            Rep::Numeric { data, mapping, .. } => resolve(mapping, data.len(), row)
                .map_or(f64::NAN, |i| data[i]),
            Rep::Categorical {
                indices, mapping, ..
            } => match resolve(mapping, indices.len(), row).map_or(0, |i| indices.get(i)) {
                0 => f64::NAN,
                index => index as f64,
            },
            Rep::Time { data, mapping } => match resolve(mapping, data.len(), row) {
                Some(i) if data[i] != MISSING_TIME => data[i] as f64,
                _ => f64::NAN,
            },
            Rep::DateTime { .. } | Rep::Text { .. } => f64::NAN,
        }
    }

    /// Category index of a single row; 0 for missing rows and non-categorical
    /// columns.
    pub fn get_index(&self, row: usize) -> u32 {
        match &self.rep {
            Rep::Categorical {
                indices, mapping, ..
            } => resolve(mapping, indices.len(), row).map_or(0, |i| indices.get(i)),
            _ => 0,
        }
    }

    /// Object read of a single row; `None` for missing rows and columns that
    /// are not object-readable.
    pub fn get_object(&self, row: usize) -> Option<ObjectValue> {
        match &self.rep {
            Rep::Numeric { .. } => None,
            Rep::Categorical {
                indices,
                dictionary,
                mapping,
            } => {
                let index = resolve(mapping, indices.len(), row).map_or(0, |i| indices.get(i));
                dictionary.get(index).cloned().map(ObjectValue::Text)
            }
            Rep::Time { data, mapping } => {
                let i = resolve(mapping, data.len(), row)?;
                nano_of_day_to_time(data[i]).map(ObjectValue::Time)
            }
            Rep::DateTime {
                seconds,
                nanos,
                mapping,
            } => {
                let i = resolve(mapping, seconds.len(), row)?;
                let nano = nanos.as_ref().map_or(0, |n| n[i]);
                epoch_to_instant(seconds[i], nano).map(ObjectValue::Instant)
            }
            Rep::Text { data, mapping } => resolve(mapping, data.len(), row)
                .and_then(|i| data[i].clone())
                .map(ObjectValue::Text),
        }
    }

    /// Fills `buffer` with consecutive numeric reads starting at `row_index`.
    /// Stops at the end of the column; entries past the end keep their
    /// previous contents.
    pub fn fill_numeric(&self, buffer: &mut [f64], row_index: usize) {
        let start = row_index.min(self.size());
        let end = (start + buffer.len()).min(self.size());
        for (slot, row) in buffer.iter_mut().zip(start..end) {
            *slot = self.get_numeric(row);
        }
    }

    /// Strided numeric fill: writes rows `start_row..` into
    /// `buffer[offset]`, `buffer[offset + step]`, … The step must be at
    /// least 1. This is the refill primitive of the buffered readers; the
    /// column index determines the offset and the row width the step.
    pub fn fill_numeric_strided(
        &self,
        buffer: &mut [f64],
        start_row: usize,
        offset: usize,
        step: usize,
    ) {
        assert!(step >= 1, "step size must not be smaller than 1");
        if offset >= buffer.len() {
            return;
        }
        let max = (start_row + (buffer.len() - offset - 1) / step + 1).min(self.size());
        let mut slot = offset;
        for row in start_row..max {
            buffer[slot] = self.get_numeric(row);
            slot += step;
        }
    }

    /// Strided categorical-index fill; see [`Column::fill_numeric_strided`].
    pub fn fill_indices_strided(
        &self,
        buffer: &mut [u32],
        start_row: usize,
        offset: usize,
        step: usize,
    ) {
        assert!(step >= 1, "step size must not be smaller than 1");
        if offset >= buffer.len() {
            return;
        }
        let max = (start_row + (buffer.len() - offset - 1) / step + 1).min(self.size());
        let mut slot = offset;
        for row in start_row..max {
            buffer[slot] = self.get_index(row);
            slot += step;
        }
    }

    /// Strided object fill; see [`Column::fill_numeric_strided`].
    pub fn fill_objects_strided(
        &self,
        buffer: &mut [Option<ObjectValue>],
        start_row: usize,
        offset: usize,
        step: usize,
    ) {
        assert!(step >= 1, "step size must not be smaller than 1");
        if offset >= buffer.len() {
            return;
        }
        let max = (start_row + (buffer.len() - offset - 1) / step + 1).min(self.size());
        let mut slot = offset;
        for row in start_row..max {
            buffer[slot] = self.get_object(row);
            slot += step;
        }
    }

    /// Produces a row selection of this column: new row `i` reads what old
    /// row `mapping[i]` read. Negative or out-of-range entries become
    /// missing.
    ///
    /// The result is either a view wrapping the original backing arrays
    /// (O(1)) or a materialized copy (O(n)): a view is used iff
    /// `prefer_view` is set or the selection covers more than
    /// [`MAPPING_THRESHOLD`] of the column, since selecting most of a large
    /// column favors the cheap wrapper while small selections keep working
    /// sets compact when copied.
    pub fn map(&self, mapping: Vec<i32>, prefer_view: bool) -> Column {
        if prefer_view || mapping.len() as f64 > self.size() as f64 * MAPPING_THRESHOLD {
            self.view(mapping)
        } else {
            self.materialize(mapping)
        }
    }

    fn view(&self, new_mapping: Vec<i32>) -> Column {
        let size = self.size();
        // A view of a view composes the two mappings so the result still
        // points directly into the backing arrays.
        let compose = |existing: &Option<Arc<[i32]>>| -> Arc<[i32]> {
            match existing {
                None => new_mapping.clone().into(),
                Some(existing) => new_mapping
                    .iter()
                    .map(|&j| {
                        if j >= 0 && (j as usize) < size {
                            existing[j as usize]
                        } else {
                            -1
                        }
                    })
                    .collect(),
            }
        };
        let rep = match &self.rep {
            Rep::Numeric {
                type_id,
                data,
                mapping,
            } => Rep::Numeric {
                type_id: *type_id,
                data: data.clone(),
                mapping: Some(compose(mapping)),
            },
            Rep::Categorical {
                indices,
                dictionary,
                mapping,
            } => Rep::Categorical {
                indices: indices.clone(),
                dictionary: dictionary.clone(),
                mapping: Some(compose(mapping)),
            },
            Rep::Time { data, mapping } => Rep::Time {
                data: data.clone(),
                mapping: Some(compose(mapping)),
            },
            Rep::DateTime {
                seconds,
                nanos,
                mapping,
            } => Rep::DateTime {
                seconds: seconds.clone(),
                nanos: nanos.clone(),
                mapping: Some(compose(mapping)),
            },
            Rep::Text { data, mapping } => Rep::Text {
                data: data.clone(),
                mapping: Some(compose(mapping)),
            },
        };
        Column { rep }
    }

    fn materialize(&self, new_mapping: Vec<i32>) -> Column {
        let size = self.size();
        // Row of this column selected by mapping entry `j`, or `None` for a
        // missing marker.
        let select = |j: i32| -> Option<usize> { (j >= 0 && (j as usize) < size).then_some(j as usize) };
        match &self.rep {
            Rep::Numeric { type_id, .. } => {
                let data = new_mapping
                    .iter()
                    .map(|&j| select(j).map_or(f64::NAN, |row| self.get_numeric(row)))
                    .collect();
                Column::new_numeric(*type_id, data)
            }
            Rep::Categorical {
                indices, dictionary, ..
            } => {
                let mut copied = IndexArrayMut::new(indices.format(), new_mapping.len());
                for (i, &j) in new_mapping.iter().enumerate() {
                    copied.set(i, select(j).map_or(0, |row| self.get_index(row)));
                }
                Column {
                    rep: Rep::Categorical {
                        indices: copied.freeze(),
                        dictionary: dictionary.clone(),
                        mapping: None,
                    },
                }
            }
            Rep::Time { data, mapping } => {
                let copied = new_mapping
                    .iter()
                    .map(|&j| {
                        select(j)
                            .and_then(|row| resolve(mapping, data.len(), row))
                            .map_or(MISSING_TIME, |i| data[i])
                    })
                    .collect();
                Column::new_time(copied)
            }
            Rep::DateTime {
                seconds,
                nanos,
                mapping,
            } => {
                let backing: Vec<Option<usize>> = new_mapping
                    .iter()
                    .map(|&j| select(j).and_then(|row| resolve(mapping, seconds.len(), row)))
                    .collect();
                let new_seconds = backing
                    .iter()
                    .map(|i| i.map_or(MISSING_INSTANT, |i| seconds[i]))
                    .collect();
                let new_nanos = nanos
                    .as_ref()
                    .map(|nanos| backing.iter().map(|i| i.map_or(0, |i| nanos[i])).collect());
                Column::new_date_time(new_seconds, new_nanos)
            }
            Rep::Text { data, mapping } => {
                let copied = new_mapping
                    .iter()
                    .map(|&j| {
                        select(j)
                            .and_then(|row| resolve(mapping, data.len(), row))
                            .and_then(|i| data[i].clone())
                    })
                    .collect();
                Column::new_text(copied)
            }
        }
    }

    /// Computes the permutation that sorts this column, usable directly as a
    /// `map` mapping. Ascending order places missing values last.
    pub fn sort(&self, order: Order) -> Result<Vec<i32>, ColumnError> {
        if !self.has_capability(Capability::Sortable) {
            return Err(ColumnError::NotSortable(self.type_id()));
        }
        let mut permutation: Vec<i32> = (0..self.size() as i32).collect();
        match &self.rep {
            Rep::Numeric { .. } => {
                permutation.sort_by(|&a, &b| {
                    compare_with_missing_last(self.get_numeric(a as usize), self.get_numeric(b as usize))
                });
            }
            Rep::Categorical { dictionary, .. } => {
                permutation.sort_by(|&a, &b| {
                    compare_labels_missing_last(
                        dictionary.get(self.get_index(a as usize)),
                        dictionary.get(self.get_index(b as usize)),
                    )
                });
            }
            Rep::Time { .. } => {
                // The missing sentinel is i64::MAX, so natural order already
                // sorts missing last.
                permutation.sort_by_key(|&row| self.time_key(row as usize));
            }
            Rep::DateTime { .. } => {
                permutation.sort_by_key(|&row| self.date_time_key(row as usize));
            }
            Rep::Text { .. } => unreachable!("checked above"),
        }
        if order == Order::Descending {
            permutation.reverse();
        }
        Ok(permutation)
    }

    fn time_key(&self, row: usize) -> i64 {
        match &self.rep {
            Rep::Time { data, mapping } => {
                resolve(mapping, data.len(), row).map_or(MISSING_TIME, |i| data[i])
            }
            _ => MISSING_TIME,
        }
    }

    fn date_time_key(&self, row: usize) -> (i64, i32) {
        match &self.rep {
            Rep::DateTime {
                seconds,
                nanos,
                mapping,
            } => resolve(mapping, seconds.len(), row).map_or((MISSING_INSTANT, 0), |i| {
                (seconds[i], nanos.as_ref().map_or(0, |n| n[i]))
            }),
            _ => (MISSING_INSTANT, 0),
        }
    }
}

fn compare_labels_missing_last(a: Option<&Arc<str>>, b: Option<&Arc<str>>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.cmp(b),
    }
}

fn compare_with_missing_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

pub(crate) fn nano_of_day_to_time(nanos: i64) -> Option<NaiveTime> {
    if nanos == MISSING_TIME || !(0..86_400_000_000_000).contains(&nanos) {
        return None;
    }
    NaiveTime::from_num_seconds_from_midnight_opt(
        (nanos / 1_000_000_000) as u32,
        (nanos % 1_000_000_000) as u32,
    )
}

pub(crate) fn epoch_to_instant(seconds: i64, nanos: i32) -> Option<DateTime<Utc>> {
    if seconds == MISSING_INSTANT {
        return None;
    }
    DateTime::<Utc>::from_timestamp(seconds, nanos as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn real_column(values: &[f64]) -> Column {
        Column::new_numeric(TypeId::Real, values.to_vec())
    }

    #[test]
    fn numeric_reads_and_fill() {
        let column = real_column(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(column.size(), 5);
        assert_eq!(column.get_numeric(2), 3.0);

        let mut buffer = [0.0; 3];
        column.fill_numeric(&mut buffer, 3);
        assert_eq!(buffer, [4.0, 5.0, 0.0]);
    }

    #[test]
    fn strided_fill_places_column_at_offset() {
        let column = real_column(&[1.0, 2.0, 3.0, 4.0]);
        let mut buffer = [f64::NAN; 8];
        // two-column row layout, this column at offset 1
        column.fill_numeric_strided(&mut buffer, 0, 1, 2);
        assert_eq!(buffer[1], 1.0);
        assert_eq!(buffer[3], 2.0);
        assert_eq!(buffer[5], 3.0);
        assert_eq!(buffer[7], 4.0);
        assert!(buffer[0].is_nan());
    }

    #[test]
    #[should_panic(expected = "step size")]
    fn strided_fill_rejects_zero_step() {
        let column = real_column(&[1.0]);
        let mut buffer = [0.0; 2];
        column.fill_numeric_strided(&mut buffer, 0, 0, 0);
    }

    #[test]
    fn view_and_copy_read_the_same() {
        let column = real_column(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let mapping = vec![4, 2, -1, 0, 7];
        let view = column.map(mapping.clone(), true);
        let copy = column.map(mapping, false);
        assert!(view.is_view());
        assert!(!copy.is_view());
        assert_eq!(view.size(), 5);
        for row in 0..5 {
            let a = view.get_numeric(row);
            let b = copy.get_numeric(row);
            assert!(a == b || (a.is_nan() && b.is_nan()), "row {row}: {a} vs {b}");
        }
        assert!(view.get_numeric(2).is_nan());
        assert!(view.get_numeric(4).is_nan());
    }

    #[test]
    fn view_of_view_composes() {
        let column = real_column(&[10.0, 20.0, 30.0, 40.0]);
        let first = column.map(vec![3, 2, 1, 0], true);
        let second = first.map(vec![1, -5, 3], true);
        assert_eq!(second.size(), 3);
        assert_eq!(second.get_numeric(0), 30.0);
        assert!(second.get_numeric(1).is_nan());
        assert_eq!(second.get_numeric(2), 10.0);
    }

    #[test]
    fn date_time_sort_puts_missing_last() {
        let column = Column::new_date_time(vec![100, MISSING_INSTANT, 0], None);
        assert!(!column.has_subsecond_precision());
        assert_eq!(column.get_object(1), None);

        let ascending = column.sort(Order::Ascending).unwrap();
        assert_eq!(ascending, vec![2, 0, 1]);
        let descending = column.sort(Order::Descending).unwrap();
        assert_eq!(descending, vec![1, 0, 2]);
    }

    #[test]
    fn nominal_sort_orders_labels_with_missing_last() {
        // dictionary order differs from label order on purpose
        let mut indices = IndexArrayMut::new(crate::packed::IndexFormat::U8, 4);
        indices.set(0, 1); // "b"
        indices.set(1, 0); // missing
        indices.set(2, 3); // "c"
        indices.set(3, 2); // "a"
        let column = Column::new_categorical(
            indices.freeze(),
            Dictionary::from_slots(vec![None, Some("b".into()), Some("a".into()), Some("c".into())]),
        );

        let ascending = column.sort(Order::Ascending).unwrap();
        assert_eq!(ascending, vec![3, 0, 2, 1]);
        let descending = column.sort(Order::Descending).unwrap();
        assert_eq!(descending, vec![1, 2, 0, 3]);

        let sorted = column.map(ascending, false);
        assert_eq!(sorted.get_object(0), Some(ObjectValue::Text("a".into())));
        assert_eq!(sorted.get_object(2), Some(ObjectValue::Text("c".into())));
        assert_eq!(sorted.get_object(3), None);
    }

    #[test]
    fn text_columns_are_not_sortable() {
        let column = Column::new_text(vec![Some("x".into()), None]);
        assert_eq!(
            column.sort(Order::Ascending),
            Err(ColumnError::NotSortable(TypeId::Text))
        );
    }

    #[test]
    fn time_reads() {
        let column = Column::new_time(vec![0, MISSING_TIME, 3_600_000_000_000]);
        assert_eq!(column.get_numeric(0), 0.0);
        assert!(column.get_numeric(1).is_nan());
        assert_eq!(column.get_numeric(2), 3_600_000_000_000.0);
        match column.get_object(2) {
            Some(ObjectValue::Time(t)) => {
                assert_eq!(t, NaiveTime::from_hms_opt(1, 0, 0).unwrap())
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(column.get_object(1), None);
    }
}
