use crate::applier::{CategoricalApplier, MixedApplier, NumericApplier, ObjectApplier};
use crate::context::Context;
use crate::error::TransformError;
use crate::executor::{ParallelExecutor, ProgressCallback};
use crate::reduce::{CategoricalReduce, NumericReduce};
use crate::workload::Workload;
use chrono::NaiveTime;
use std::sync::Arc;
use strata_columnar::{
    CategoricalBuffer, CategoricalRow, CategoricalRowReader, Column, ColumnObject, IndexFormat,
    MixedRow, NumericBuffer, NumericRow, NumericRowReader, ObjectRow, ObjectRowReader, TextBuffer,
    TimeBuffer, TypeId,
};

/// Row-wise map and reduce over a fixed list of equal-length columns.
///
/// A transformer is configured once and can run any number of operations.
/// Every operation validates the column capabilities up front, then runs one
/// executor pass; the produced column is identical whether the pass ran
/// sequentially or on a pool.
///
/// ```ignore
/// let sum = RowTransformer::new(columns)?
///     .workload(Workload::Small)
///     .apply_numeric_to_real(&PoolContext::new(), |row| row.get(0) + row.get(1))?;
/// ```
pub struct RowTransformer {
    columns: Vec<Arc<Column>>,
    workload: Workload,
    callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for RowTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowTransformer")
            .field("columns", &self.columns)
            .field("workload", &self.workload)
            .field("callback", &self.callback.as_ref().map(|_| ".."))
            .finish()
    }
}

impl RowTransformer {
    /// Creates a transformer over a non-empty list of equal-length columns.
    pub fn new(columns: Vec<Arc<Column>>) -> Result<RowTransformer, TransformError> {
        let first = columns.first().ok_or(TransformError::EmptyColumns)?;
        let expected = first.size();
        for column in &columns[1..] {
            if column.size() != expected {
                return Err(TransformError::MismatchedLengths {
                    expected,
                    actual: column.size(),
                });
            }
        }
        Ok(RowTransformer {
            columns,
            workload: Workload::Default,
            callback: None,
        })
    }

    /// Declares the expected per-row cost; defaults to [`Workload::Default`].
    pub fn workload(mut self, workload: Workload) -> RowTransformer {
        self.workload = workload;
        self
    }

    /// Installs a fractional-progress callback, invoked after every
    /// completed batch with a value in `[0, 1]`.
    pub fn callback(mut self, callback: ProgressCallback) -> RowTransformer {
        self.callback = Some(callback);
        self
    }

    fn executor<'a>(&'a self, context: &'a dyn Context) -> ParallelExecutor<'a> {
        ParallelExecutor::new(context, self.workload).with_callback(self.callback.clone())
    }

    /// Maps every row of numeric-readable columns to a real value.
    pub fn apply_numeric_to_real<F>(
        &self,
        context: &dyn Context,
        f: F,
    ) -> Result<Column, TransformError>
    where
        F: Fn(&dyn NumericRow) -> f64 + Sync,
    {
        NumericRowReader::new(&self.columns)?;
        let values = self
            .executor(context)
            .run(NumericApplier::new(&self.columns, f));
        Ok(NumericBuffer::from_values(TypeId::Real, values).to_column())
    }

    /// Maps every row of numeric-readable columns to an integer value;
    /// finite results are rounded.
    pub fn apply_numeric_to_integer<F>(
        &self,
        context: &dyn Context,
        f: F,
    ) -> Result<Column, TransformError>
    where
        F: Fn(&dyn NumericRow) -> f64 + Sync,
    {
        NumericRowReader::new(&self.columns)?;
        let values = self
            .executor(context)
            .run(NumericApplier::new(&self.columns, f));
        Ok(NumericBuffer::from_values(TypeId::Integer, values).to_column())
    }

    /// Maps every row of categorical columns to a real value.
    pub fn apply_categorical_to_real<F>(
        &self,
        context: &dyn Context,
        f: F,
    ) -> Result<Column, TransformError>
    where
        F: Fn(&dyn CategoricalRow) -> f64 + Sync,
    {
        CategoricalRowReader::new(&self.columns)?;
        let values = self
            .executor(context)
            .run(CategoricalApplier::new(&self.columns, f));
        Ok(NumericBuffer::from_values(TypeId::Real, values).to_column())
    }

    /// Maps every row of categorical columns to an integer value.
    pub fn apply_categorical_to_integer<F>(
        &self,
        context: &dyn Context,
        f: F,
    ) -> Result<Column, TransformError>
    where
        F: Fn(&dyn CategoricalRow) -> f64 + Sync,
    {
        CategoricalRowReader::new(&self.columns)?;
        let values = self
            .executor(context)
            .run(CategoricalApplier::new(&self.columns, f));
        Ok(NumericBuffer::from_values(TypeId::Integer, values).to_column())
    }

    /// Maps every row of numeric-readable columns to a nominal value;
    /// `None` marks missing. Interning into the result dictionary happens
    /// after the parallel pass, in row order.
    pub fn apply_numeric_to_nominal<F>(
        &self,
        context: &dyn Context,
        f: F,
    ) -> Result<Column, TransformError>
    where
        F: Fn(&dyn NumericRow) -> Option<Arc<str>> + Sync,
    {
        NumericRowReader::new(&self.columns)?;
        let values = self
            .executor(context)
            .run(NumericApplier::new(&self.columns, f));
        let mut buffer = CategoricalBuffer::new(values.len(), IndexFormat::U32);
        for (row, value) in values.into_iter().enumerate() {
            buffer.set(row, value)?;
        }
        Ok(buffer.to_column())
    }

    /// Maps every row of object-readable columns, read as `T`, to a
    /// time-of-day value.
    pub fn apply_object_to_time<T, F>(
        &self,
        context: &dyn Context,
        f: F,
    ) -> Result<Column, TransformError>
    where
        T: ColumnObject,
        F: Fn(&dyn ObjectRow<T>) -> Option<NaiveTime> + Sync,
    {
        ObjectRowReader::<T>::new(&self.columns)?;
        let values = self
            .executor(context)
            .run(ObjectApplier::<T, _, _>::new(&self.columns, f));
        let mut buffer = TimeBuffer::new(values.len(), false);
        for (row, value) in values.into_iter().enumerate() {
            buffer.set(row, value);
        }
        Ok(buffer.to_column())
    }

    /// Maps every row, via the mixed view, to a text value.
    pub fn apply_mixed_to_text<F>(
        &self,
        context: &dyn Context,
        f: F,
    ) -> Result<Column, TransformError>
    where
        F: Fn(&dyn MixedRow) -> Option<Arc<str>> + Sync,
    {
        let values = self
            .executor(context)
            .run(MixedApplier::new(&self.columns, f));
        Ok(TextBuffer::from_values(values).to_column())
    }

    /// Folds all rows of numeric-readable columns into one value.
    ///
    /// `supplier` creates a fresh accumulator per batch, `reducer` folds one
    /// row into it, and `combiner` merges two accumulators. The combiner
    /// must be associative; the result is then independent of batching and
    /// completion order.
    pub fn reduce_numeric<T, S, R, C>(
        &self,
        context: &dyn Context,
        supplier: S,
        reducer: R,
        combiner: C,
    ) -> Result<T, TransformError>
    where
        T: Send,
        S: Fn() -> T + Sync,
        R: Fn(&mut T, &dyn NumericRow) + Sync,
        C: Fn(T, T) -> T + Sync + Send,
    {
        NumericRowReader::new(&self.columns)?;
        Ok(self
            .executor(context)
            .run(NumericReduce::new(&self.columns, supplier, reducer, combiner)))
    }

    /// Folds all rows of categorical columns into one value. Same contract
    /// as [`RowTransformer::reduce_numeric`].
    pub fn reduce_categorical<T, S, R, C>(
        &self,
        context: &dyn Context,
        supplier: S,
        reducer: R,
        combiner: C,
    ) -> Result<T, TransformError>
    where
        T: Send,
        S: Fn() -> T + Sync,
        R: Fn(&mut T, &dyn CategoricalRow) + Sync,
        C: Fn(T, T) -> T + Sync + Send,
    {
        CategoricalRowReader::new(&self.columns)?;
        Ok(self.executor(context).run(CategoricalReduce::new(
            &self.columns,
            supplier,
            reducer,
            combiner,
        )))
    }
}
