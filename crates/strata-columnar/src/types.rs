use chrono::{DateTime, NaiveTime, Utc};
use std::sync::Arc;

/// Sentinel stored in the seconds array of a date-time column for missing rows.
///
/// Distinct from every valid epoch-second encoding the engine accepts.
pub const MISSING_INSTANT: i64 = i64::MAX;

/// Sentinel stored in the nano-of-day array of a time column for missing rows.
pub const MISSING_TIME: i64 = i64::MAX;

/// Ratio of selected rows to column size above which `Column::map` prefers a
/// view over a materialized copy. Empirically chosen; tune per platform.
pub const MAPPING_THRESHOLD: f64 = 0.1;

/// Concrete type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeId {
    /// 64-bit floating point values rounded to integers; missing is NaN.
    Integer,
    /// 64-bit floating point values; missing is NaN.
    Real,
    /// Dictionary-encoded categorical strings; index 0 is reserved for missing.
    Nominal,
    /// Nanoseconds of the day.
    Time,
    /// Epoch seconds with optional sub-second precision.
    DateTime,
    /// Free-form text.
    Text,
}

/// Coarse grouping of column types by their primary storage layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Numeric,
    Categorical,
    Object,
}

/// What a column can do, beyond existing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Rows can be read as `f64` (missing = NaN).
    NumericReadable,
    /// Rows can be read as [`ObjectValue`]s.
    ObjectReadable,
    /// The column can produce a sort permutation.
    Sortable,
}

impl TypeId {
    pub fn category(self) -> Category {
        match self {
            TypeId::Integer | TypeId::Real => Category::Numeric,
            TypeId::Nominal => Category::Categorical,
            TypeId::Time | TypeId::DateTime | TypeId::Text => Category::Object,
        }
    }

    pub fn has_capability(self, capability: Capability) -> bool {
        match capability {
            Capability::NumericReadable => matches!(
                self,
                TypeId::Integer | TypeId::Real | TypeId::Nominal | TypeId::Time
            ),
            Capability::ObjectReadable => matches!(
                self,
                TypeId::Nominal | TypeId::Time | TypeId::DateTime | TypeId::Text
            ),
            Capability::Sortable => matches!(
                self,
                TypeId::Integer | TypeId::Real | TypeId::Nominal | TypeId::Time | TypeId::DateTime
            ),
        }
    }

    /// Element type of object reads, if the type is object-readable.
    pub fn element_type(self) -> Option<ElementType> {
        match self {
            TypeId::Nominal | TypeId::Text => Some(ElementType::Text),
            TypeId::Time => Some(ElementType::Time),
            TypeId::DateTime => Some(ElementType::Instant),
            TypeId::Integer | TypeId::Real => None,
        }
    }
}

/// Element type of an object-readable column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Text,
    Instant,
    Time,
}

/// A single object-read value. The common supertype of all element types.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectValue {
    Text(Arc<str>),
    Instant(DateTime<Utc>),
    Time(NaiveTime),
}

impl ObjectValue {
    /// Element type of this value.
    pub fn element_type(&self) -> ElementType {
        match self {
            ObjectValue::Text(_) => ElementType::Text,
            ObjectValue::Instant(_) => ElementType::Instant,
            ObjectValue::Time(_) => ElementType::Time,
        }
    }

    pub fn as_text(&self) -> Option<&Arc<str>> {
        match self {
            ObjectValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Rust-side stand-in for the element-class hierarchy of object reads.
///
/// A reader requesting `T` accepts a column whose element type is assignable
/// to `T`; [`ObjectValue`] itself accepts every element type.
pub trait ColumnObject: Clone + Send + Sync + Sized {
    /// Whether a column with the given element type can be read as `Self`.
    fn accepts(element_type: ElementType) -> bool;

    /// Converts a raw object value. Returns `None` only for values outside
    /// the accepted element types, which cannot occur after the construction
    /// check of an object reader.
    fn from_value(value: ObjectValue) -> Option<Self>;
}

impl ColumnObject for ObjectValue {
    fn accepts(_element_type: ElementType) -> bool {
        true
    }

    fn from_value(value: ObjectValue) -> Option<Self> {
        Some(value)
    }
}

impl ColumnObject for Arc<str> {
    fn accepts(element_type: ElementType) -> bool {
        element_type == ElementType::Text
    }

    fn from_value(value: ObjectValue) -> Option<Self> {
        match value {
            ObjectValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl ColumnObject for DateTime<Utc> {
    fn accepts(element_type: ElementType) -> bool {
        element_type == ElementType::Instant
    }

    fn from_value(value: ObjectValue) -> Option<Self> {
        match value {
            ObjectValue::Instant(t) => Some(t),
            _ => None,
        }
    }
}

impl ColumnObject for NaiveTime {
    fn accepts(element_type: ElementType) -> bool {
        element_type == ElementType::Time
    }

    fn from_value(value: ObjectValue) -> Option<Self> {
        match value {
            ObjectValue::Time(t) => Some(t),
            _ => None,
        }
    }
}

/// Sort direction for [`crate::Column::sort`].
///
/// Ascending places missing values last; descending is the exact reversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_by_type() {
        assert!(TypeId::Real.has_capability(Capability::NumericReadable));
        assert!(!TypeId::Real.has_capability(Capability::ObjectReadable));
        assert!(TypeId::Nominal.has_capability(Capability::NumericReadable));
        assert!(TypeId::Nominal.has_capability(Capability::ObjectReadable));
        assert!(TypeId::Nominal.has_capability(Capability::Sortable));
        assert!(!TypeId::DateTime.has_capability(Capability::NumericReadable));
        assert!(TypeId::DateTime.has_capability(Capability::Sortable));
        assert!(!TypeId::Text.has_capability(Capability::Sortable));
        assert!(TypeId::Time.has_capability(Capability::NumericReadable));
    }

    #[test]
    fn object_value_accepts_everything() {
        for et in [ElementType::Text, ElementType::Instant, ElementType::Time] {
            assert!(<ObjectValue as ColumnObject>::accepts(et));
        }
        assert!(<Arc<str> as ColumnObject>::accepts(ElementType::Text));
        assert!(!<Arc<str> as ColumnObject>::accepts(ElementType::Instant));
    }
}
