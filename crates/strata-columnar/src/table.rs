use crate::column::Column;
use crate::error::ColumnError;
use std::sync::Arc;

/// An immutable, labeled collection of columns of equal length.
///
/// Tables are cheap to clone and share; the column data behind them is
/// reference counted and never mutated.
#[derive(Clone, Debug)]
pub struct Table {
    columns: Vec<Arc<Column>>,
    labels: Vec<String>,
}

impl Table {
    pub fn new(columns: Vec<Arc<Column>>, labels: Vec<String>) -> Result<Table, ColumnError> {
        if columns.is_empty() {
            return Err(ColumnError::EmptyColumns);
        }
        if columns.len() != labels.len() {
            return Err(ColumnError::LabelCountMismatch {
                columns: columns.len(),
                labels: labels.len(),
            });
        }
        let height = columns[0].size();
        for column in &columns[1..] {
            if column.size() != height {
                return Err(ColumnError::MismatchedLengths {
                    expected: height,
                    actual: column.size(),
                });
            }
        }
        Ok(Table { columns, labels })
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.columns[0].size()
    }

    pub fn column(&self, index: usize) -> &Arc<Column> {
        &self.columns[index]
    }

    pub fn column_by_label(&self, label: &str) -> Option<&Arc<Column>> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| &self.columns[i])
    }

    pub fn label(&self, index: usize) -> &str {
        &self.labels[index]
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn columns(&self) -> &[Arc<Column>] {
        &self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::NumericBuffer;
    use pretty_assertions::assert_eq;

    fn real_column(values: &[f64]) -> Arc<Column> {
        let mut buffer = NumericBuffer::real(values.len(), false);
        for (i, v) in values.iter().enumerate() {
            buffer.set(i, *v);
        }
        Arc::new(buffer.to_column())
    }

    #[test]
    fn construction_validates_shape() {
        assert_eq!(
            Table::new(Vec::new(), Vec::new()).unwrap_err(),
            ColumnError::EmptyColumns
        );

        let a = real_column(&[1.0, 2.0]);
        let b = real_column(&[1.0, 2.0, 3.0]);
        assert_eq!(
            Table::new(vec![a.clone()], vec![]).unwrap_err(),
            ColumnError::LabelCountMismatch {
                columns: 1,
                labels: 0
            }
        );
        assert_eq!(
            Table::new(vec![a.clone(), b], vec!["a".into(), "b".into()]).unwrap_err(),
            ColumnError::MismatchedLengths {
                expected: 2,
                actual: 3
            }
        );

        let table = Table::new(vec![a], vec!["a".into()]).unwrap();
        assert_eq!(table.width(), 1);
        assert_eq!(table.height(), 2);
        assert_eq!(table.label(0), "a");
        assert!(table.column_by_label("a").is_some());
        assert!(table.column_by_label("missing").is_none());
    }
}
