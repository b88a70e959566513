//! Tables: arrays of groups, one group per row.
use crate::{
    template::{ArrayConfig, ControlTemplate},
    typed::{Array, Group},
    FormResult, FormTree, FormValue, StructureOptions,
};
use std::fmt;

/// Handle to a table, an array control whose items are groups holding a `T` each.
///
/// New rows are built with the table's row constructor, given the index where the row is inserted.
pub struct Table<T> {
    array: Array<T>,
}

impl<T> Table<T> {
    /// Creates a table with `size` initial rows as a new root control.
    pub fn insert(
        tree: &mut FormTree,
        size: usize,
        construct_row: impl Fn(usize, Option<&[FormValue]>) -> ControlTemplate + 'static,
    ) -> FormResult<Table<T>> {
        let template = ControlTemplate::array(ArrayConfig::new(size, construct_row));
        Ok(Table::from_array(Array::insert(tree, &template)?))
    }

    /// Wraps an existing array control.
    pub fn from_array(array: Array<T>) -> Table<T> {
        Table { array }
    }

    /// The underlying array control.
    pub fn as_array(self) -> Array<T> {
        self.array
    }

    /// All rows, in order.
    pub fn rows(self, tree: &FormTree) -> FormResult<Vec<Group<T>>> {
        tree.children(self.array.id())?
            .into_iter()
            .map(|row| Group::from_id(tree, row))
            .collect()
    }

    /// Row at `index`.
    pub fn row_at(self, tree: &FormTree, index: usize) -> FormResult<Option<Group<T>>> {
        tree.at(self.array.id(), index)
            .map(|row| Group::from_id(tree, row))
            .transpose()
    }

    /// Number of rows.
    pub fn size(self, tree: &FormTree) -> usize {
        self.array.len(tree)
    }

    /// Adds a row at the end.
    pub fn append_row(self, tree: &mut FormTree, opts: StructureOptions) -> FormResult<Group<T>> {
        let row = tree.push(self.array.id(), opts)?;
        Group::from_id(tree, row)
    }

    /// Adds a row at the beginning.
    pub fn prepend_row(self, tree: &mut FormTree, opts: StructureOptions) -> FormResult<Group<T>> {
        self.insert_row(tree, 0, opts)
    }

    /// Adds a row at `index`. Indices past the end append.
    pub fn insert_row(self, tree: &mut FormTree, index: usize, opts: StructureOptions) -> FormResult<Group<T>> {
        let row = tree.insert_at(self.array.id(), index, opts)?;
        Group::from_id(tree, row)
    }

    /// Removes the row at `index`.
    pub fn remove_row(self, tree: &mut FormTree, index: usize, opts: StructureOptions) -> FormResult<()> {
        tree.remove_at(self.array.id(), index, opts)
    }
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Table<T> {}

impl<T> PartialEq for Table<T> {
    fn eq(&self, other: &Self) -> bool {
        self.array == other.array
    }
}

impl<T> Eq for Table<T> {}

impl<T> fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Table").field(&self.array.id()).finish()
    }
}
