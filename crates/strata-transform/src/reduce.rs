use crate::combine::CombineTree;
use crate::executor::Calculator;
use std::sync::{Arc, Mutex};
use strata_columnar::{CategoricalRow, CategoricalRowReader, Column, NumericRow, NumericRowReader};

/// Calculators folding every row into one value through a [`CombineTree`].
///
/// Each batch folds its range into a fresh accumulator from `supplier`, then
/// delivers it to the tree; whichever batch completes a node also performs
/// that node's combination, so the reduction finishes on the last batch
/// thread without a separate merge pass.

pub(crate) struct NumericReduce<'a, T, S, R, C>
where
    C: Fn(T, T) -> T,
{
    columns: &'a [Arc<Column>],
    rows: usize,
    supplier: S,
    reducer: R,
    combiner: Option<C>,
    tree: Option<CombineTree<T, C>>,
    root: Mutex<Option<T>>,
}

impl<'a, T, S, R, C> NumericReduce<'a, T, S, R, C>
where
    C: Fn(T, T) -> T,
{
    pub(crate) fn new(
        columns: &'a [Arc<Column>],
        supplier: S,
        reducer: R,
        combiner: C,
    ) -> NumericReduce<'a, T, S, R, C> {
        NumericReduce {
            columns,
            rows: columns[0].size(),
            supplier,
            reducer,
            combiner: Some(combiner),
            tree: None,
            root: Mutex::new(None),
        }
    }
}

impl<T, S, R, C> Calculator for NumericReduce<'_, T, S, R, C>
where
    T: Send,
    S: Fn() -> T + Sync,
    R: Fn(&mut T, &dyn NumericRow) + Sync,
    C: Fn(T, T) -> T + Sync + Send,
{
    type Output = T;

    fn init(&mut self, batches: usize) {
        let combiner = self.combiner.take().expect("init called once");
        self.tree = Some(CombineTree::new(batches, combiner));
    }

    fn number_of_operations(&self) -> usize {
        self.rows
    }

    fn do_part(&self, from: usize, to: usize, batch: usize) {
        let mut reader =
            NumericRowReader::new(self.columns).expect("columns validated before dispatch");
        reader.set_position(from as isize - 1);
        let mut accumulator = (self.supplier)();
        for _ in from..to {
            reader.move_next();
            (self.reducer)(&mut accumulator, &reader);
        }
        let tree = self.tree.as_ref().expect("initialized before dispatch");
        if let Some(value) = tree.accept(batch, accumulator) {
            *self.root.lock().expect("reduction root") = Some(value);
        }
    }

    fn result(self) -> T {
        self.root
            .into_inner()
            .expect("reduction root")
            .expect("all batches completed")
    }
}

pub(crate) struct CategoricalReduce<'a, T, S, R, C>
where
    C: Fn(T, T) -> T,
{
    columns: &'a [Arc<Column>],
    rows: usize,
    supplier: S,
    reducer: R,
    combiner: Option<C>,
    tree: Option<CombineTree<T, C>>,
    root: Mutex<Option<T>>,
}

impl<'a, T, S, R, C> CategoricalReduce<'a, T, S, R, C>
where
    C: Fn(T, T) -> T,
{
    pub(crate) fn new(
        columns: &'a [Arc<Column>],
        supplier: S,
        reducer: R,
        combiner: C,
    ) -> CategoricalReduce<'a, T, S, R, C> {
        CategoricalReduce {
            columns,
            rows: columns[0].size(),
            supplier,
            reducer,
            combiner: Some(combiner),
            tree: None,
            root: Mutex::new(None),
        }
    }
}

impl<T, S, R, C> Calculator for CategoricalReduce<'_, T, S, R, C>
where
    T: Send,
    S: Fn() -> T + Sync,
    R: Fn(&mut T, &dyn CategoricalRow) + Sync,
    C: Fn(T, T) -> T + Sync + Send,
{
    type Output = T;

    fn init(&mut self, batches: usize) {
        let combiner = self.combiner.take().expect("init called once");
        self.tree = Some(CombineTree::new(batches, combiner));
    }

    fn number_of_operations(&self) -> usize {
        self.rows
    }

    fn do_part(&self, from: usize, to: usize, batch: usize) {
        let mut reader =
            CategoricalRowReader::new(self.columns).expect("columns validated before dispatch");
        reader.set_position(from as isize - 1);
        let mut accumulator = (self.supplier)();
        for _ in from..to {
            reader.move_next();
            (self.reducer)(&mut accumulator, &reader);
        }
        let tree = self.tree.as_ref().expect("initialized before dispatch");
        if let Some(value) = tree.accept(batch, accumulator) {
            *self.root.lock().expect("reduction root") = Some(value);
        }
    }

    fn result(self) -> T {
        self.root
            .into_inner()
            .expect("reduction root")
            .expect("all batches completed")
    }
}
