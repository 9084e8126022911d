//! Immutable, bounds-checked handler tables.
//!
//! A table is built once and never mutated. External ids (opcodes, menu ids)
//! map onto zero-based indices by subtracting the table's first id, and every
//! lookup checks the index against the table length before touching a record.

use std::fmt;

use serde::Serialize;

use crate::error::HookError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Instructions,
    Menus,
}

impl TableKind {
    pub fn label(self) -> &'static str {
        match self {
            TableKind::Instructions => "custom instruction",
            TableKind::Menus => "custom script menu",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub struct HandlerTable<T> {
    kind: TableKind,
    first_id: i32,
    records: Box<[T]>,
}

impl<T> HandlerTable<T> {
    pub fn new(kind: TableKind, first_id: i32, records: Vec<T>) -> Self {
        HandlerTable {
            kind,
            first_id,
            records: records.into_boxed_slice(),
        }
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn first_id(&self) -> i32 {
        self.first_id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index an external id would occupy. Saturates so ids far below the
    /// first id still land outside the table.
    pub fn index_of(&self, external_id: i32) -> i32 {
        external_id.saturating_sub(self.first_id)
    }

    pub fn external_id(&self, index: usize) -> i32 {
        self.first_id.saturating_add(index as i32)
    }

    pub fn contains(&self, index: i32) -> bool {
        usize::try_from(index).is_ok_and(|index| index < self.records.len())
    }

    pub fn get(&self, index: i32) -> Result<&T, HookError> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.records.get(index))
            .ok_or(HookError::OutOfRange {
                table: self.kind,
                index,
                len: self.records.len(),
            })
    }

    pub fn lookup(&self, external_id: i32) -> Result<&T, HookError> {
        self.get(self.index_of(external_id))
    }

    /// Records paired with their external ids, in table order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &T)> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| (self.external_id(index), record))
    }
}

impl<T> fmt::Debug for HandlerTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("kind", &self.kind)
            .field("first_id", &self.first_id)
            .field("len", &self.records.len())
            .finish()
    }
}
