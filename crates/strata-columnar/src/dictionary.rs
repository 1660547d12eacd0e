use crate::error::ColumnError;
use crate::packed::IndexFormat;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable dictionary of a categorical column.
///
/// Slot 0 is always `None` and stands for the missing value.
#[derive(Clone, Debug, PartialEq)]
pub struct Dictionary {
    values: Vec<Option<Arc<str>>>,
}

impl Dictionary {
    pub(crate) fn from_slots(values: Vec<Option<Arc<str>>>) -> Self {
        debug_assert!(values.first().is_some_and(|v| v.is_none()));
        Self { values }
    }

    /// Value behind the given index; `None` for index 0 and out-of-range
    /// indices.
    pub fn get(&self, index: u32) -> Option<&Arc<str>> {
        self.values.get(index as usize).and_then(|v| v.as_ref())
    }

    /// Number of distinct values (the reserved missing slot does not count).
    pub fn cardinality(&self) -> usize {
        self.values.len() - 1
    }

    /// Highest index currently in use.
    pub fn max_index(&self) -> u32 {
        (self.values.len() - 1) as u32
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Arc<str>)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (i as u32, v)))
    }
}

/// Interning builder used while a categorical buffer or writer is open.
#[derive(Debug)]
pub(crate) struct DictionaryBuilder {
    values: Vec<Option<Arc<str>>>,
    indices: HashMap<Arc<str>, u32>,
    format: IndexFormat,
}

impl DictionaryBuilder {
    pub fn new(format: IndexFormat) -> Self {
        Self {
            values: vec![None],
            indices: HashMap::new(),
            format,
        }
    }

    /// Returns the index of `value`, interning it if unseen.
    ///
    /// Fails once the chosen format cannot represent another index. The
    /// format never upgrades automatically.
    pub fn intern(&mut self, value: Arc<str>) -> Result<u32, ColumnError> {
        if let Some(index) = self.indices.get(value.as_ref()) {
            return Ok(*index);
        }
        if self.values.len() > self.format.max_index() as usize {
            return Err(ColumnError::DictionaryFull {
                capacity: self.format.max_cardinality(),
            });
        }
        let index = self.values.len() as u32;
        self.values.push(Some(value.clone()));
        self.indices.insert(value, index);
        Ok(index)
    }

    pub fn cardinality(&self) -> usize {
        self.values.len() - 1
    }

    pub fn freeze(self) -> Dictionary {
        Dictionary::from_slots(self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn interning_reuses_indices() {
        let mut builder = DictionaryBuilder::new(IndexFormat::U8);
        let a = builder.intern(Arc::from("a")).unwrap();
        let b = builder.intern(Arc::from("b")).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(builder.intern(Arc::from("a")).unwrap(), 1);
        assert_eq!(builder.cardinality(), 2);

        let dictionary = builder.freeze();
        assert_eq!(dictionary.get(0), None);
        assert_eq!(dictionary.get(1).map(|v| v.as_ref()), Some("a"));
        assert_eq!(dictionary.get(99), None);
    }

    #[test]
    fn capacity_is_exact() {
        // U2 holds exactly 3 distinct values.
        let mut builder = DictionaryBuilder::new(IndexFormat::U2);
        for value in ["x", "y", "z"] {
            builder.intern(Arc::from(value)).unwrap();
        }
        // re-interning known values still works at capacity
        assert_eq!(builder.intern(Arc::from("y")).unwrap(), 2);
        assert_eq!(
            builder.intern(Arc::from("w")),
            Err(ColumnError::DictionaryFull { capacity: 3 })
        );
    }
}
