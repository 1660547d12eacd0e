use crate::executor::Calculator;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};
use strata_columnar::{
    CategoricalRow, CategoricalRowReader, Column, ColumnObject, MixedRow, MixedRowReader,
    NumericRow, NumericRowReader, ObjectRow, ObjectRowReader,
};

/// Calculators mapping every row to one output value.
///
/// Each batch walks its `[from, to)` range with a private reader and stores
/// its outputs as one owned segment; `result` stitches the segments in batch
/// order. Since batch bounds are deterministic, the stitched vector is
/// identical for every schedule.

pub(crate) struct NumericApplier<'a, F, O> {
    columns: &'a [Arc<Column>],
    rows: usize,
    eval: F,
    segments: Vec<OnceLock<Vec<O>>>,
}

impl<'a, F, O> NumericApplier<'a, F, O> {
    pub(crate) fn new(columns: &'a [Arc<Column>], eval: F) -> NumericApplier<'a, F, O> {
        NumericApplier {
            columns,
            rows: columns[0].size(),
            eval,
            segments: Vec::new(),
        }
    }
}

impl<F, O> Calculator for NumericApplier<'_, F, O>
where
    F: Fn(&dyn NumericRow) -> O + Sync,
    O: Send + Sync,
{
    type Output = Vec<O>;

    fn init(&mut self, batches: usize) {
        self.segments = (0..batches).map(|_| OnceLock::new()).collect();
    }

    fn number_of_operations(&self) -> usize {
        self.rows
    }

    fn do_part(&self, from: usize, to: usize, batch: usize) {
        let mut reader =
            NumericRowReader::new(self.columns).expect("columns validated before dispatch");
        reader.set_position(from as isize - 1);
        let mut out = Vec::with_capacity(to - from);
        for _ in from..to {
            reader.move_next();
            out.push((self.eval)(&reader));
        }
        let stored = self.segments[batch].set(out);
        debug_assert!(stored.is_ok(), "batch delivered twice");
    }

    fn result(self) -> Vec<O> {
        let mut values = Vec::with_capacity(self.rows);
        for segment in self.segments {
            values.extend(segment.into_inner().expect("all batches completed"));
        }
        values
    }
}

pub(crate) struct CategoricalApplier<'a, F, O> {
    columns: &'a [Arc<Column>],
    rows: usize,
    eval: F,
    segments: Vec<OnceLock<Vec<O>>>,
}

impl<'a, F, O> CategoricalApplier<'a, F, O> {
    pub(crate) fn new(columns: &'a [Arc<Column>], eval: F) -> CategoricalApplier<'a, F, O> {
        CategoricalApplier {
            columns,
            rows: columns[0].size(),
            eval,
            segments: Vec::new(),
        }
    }
}

impl<F, O> Calculator for CategoricalApplier<'_, F, O>
where
    F: Fn(&dyn CategoricalRow) -> O + Sync,
    O: Send + Sync,
{
    type Output = Vec<O>;

    fn init(&mut self, batches: usize) {
        self.segments = (0..batches).map(|_| OnceLock::new()).collect();
    }

    fn number_of_operations(&self) -> usize {
        self.rows
    }

    fn do_part(&self, from: usize, to: usize, batch: usize) {
        let mut reader =
            CategoricalRowReader::new(self.columns).expect("columns validated before dispatch");
        reader.set_position(from as isize - 1);
        let mut out = Vec::with_capacity(to - from);
        for _ in from..to {
            reader.move_next();
            out.push((self.eval)(&reader));
        }
        let stored = self.segments[batch].set(out);
        debug_assert!(stored.is_ok(), "batch delivered twice");
    }

    fn result(self) -> Vec<O> {
        let mut values = Vec::with_capacity(self.rows);
        for segment in self.segments {
            values.extend(segment.into_inner().expect("all batches completed"));
        }
        values
    }
}

pub(crate) struct ObjectApplier<'a, T, F, O> {
    columns: &'a [Arc<Column>],
    rows: usize,
    eval: F,
    segments: Vec<OnceLock<Vec<O>>>,
    _marker: PhantomData<T>,
}

impl<'a, T, F, O> ObjectApplier<'a, T, F, O> {
    pub(crate) fn new(columns: &'a [Arc<Column>], eval: F) -> ObjectApplier<'a, T, F, O> {
        ObjectApplier {
            columns,
            rows: columns[0].size(),
            eval,
            segments: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<T, F, O> Calculator for ObjectApplier<'_, T, F, O>
where
    T: ColumnObject,
    F: Fn(&dyn ObjectRow<T>) -> O + Sync,
    O: Send + Sync,
{
    type Output = Vec<O>;

    fn init(&mut self, batches: usize) {
        self.segments = (0..batches).map(|_| OnceLock::new()).collect();
    }

    fn number_of_operations(&self) -> usize {
        self.rows
    }

    fn do_part(&self, from: usize, to: usize, batch: usize) {
        let mut reader =
            ObjectRowReader::<T>::new(self.columns).expect("columns validated before dispatch");
        reader.set_position(from as isize - 1);
        let mut out = Vec::with_capacity(to - from);
        for _ in from..to {
            reader.move_next();
            out.push((self.eval)(&reader));
        }
        let stored = self.segments[batch].set(out);
        debug_assert!(stored.is_ok(), "batch delivered twice");
    }

    fn result(self) -> Vec<O> {
        let mut values = Vec::with_capacity(self.rows);
        for segment in self.segments {
            values.extend(segment.into_inner().expect("all batches completed"));
        }
        values
    }
}

pub(crate) struct MixedApplier<'a, F, O> {
    columns: &'a [Arc<Column>],
    rows: usize,
    eval: F,
    segments: Vec<OnceLock<Vec<O>>>,
}

impl<'a, F, O> MixedApplier<'a, F, O> {
    pub(crate) fn new(columns: &'a [Arc<Column>], eval: F) -> MixedApplier<'a, F, O> {
        MixedApplier {
            columns,
            rows: columns[0].size(),
            eval,
            segments: Vec::new(),
        }
    }
}

impl<F, O> Calculator for MixedApplier<'_, F, O>
where
    F: Fn(&dyn MixedRow) -> O + Sync,
    O: Send + Sync,
{
    type Output = Vec<O>;

    fn init(&mut self, batches: usize) {
        self.segments = (0..batches).map(|_| OnceLock::new()).collect();
    }

    fn number_of_operations(&self) -> usize {
        self.rows
    }

    fn do_part(&self, from: usize, to: usize, batch: usize) {
        let mut reader = MixedRowReader::new(self.columns);
        reader.set_position(from as isize - 1);
        let mut out = Vec::with_capacity(to - from);
        for _ in from..to {
            reader.move_next();
            out.push((self.eval)(&reader));
        }
        let stored = self.segments[batch].set(out);
        debug_assert!(stored.is_ok(), "batch delivered twice");
    }

    fn result(self) -> Vec<O> {
        let mut values = Vec::with_capacity(self.rows);
        for segment in self.segments {
            values.extend(segment.into_inner().expect("all batches completed"));
        }
        values
    }
}
