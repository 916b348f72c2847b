//! Per-record column descriptors used by the renderer and the selection engine.

use serde::Serialize;

use crate::cell::Cell;

/// A named accessor over one record type.
pub struct Column<R> {
    /// Display and lookup name (usually the wire field name).
    pub name: &'static str,
    /// Wire fields the accessor needs fetched.
    pub fields: &'static [&'static str],
    /// Accessor producing the typed cell.
    pub get: fn(&R) -> Cell,
}

impl<R> Column<R> {
    /// Build a column descriptor.
    #[must_use]
    pub const fn new(name: &'static str, fields: &'static [&'static str], get: fn(&R) -> Cell) -> Self {
        Self { name, fields, get }
    }

    /// Evaluate the accessor.
    pub fn value(&self, record: &R) -> Cell {
        (self.get)(record)
    }
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Column<R> {}

impl<R> std::fmt::Debug for Column<R> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Column")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// A renderable record.
pub trait Record: Serialize + Sized {
    /// Singular kind used for flat section names (`torrent`, `file`, ...).
    const KIND: &'static str;
    /// Plural list name used when grouping sub-entity records.
    const GROUP: &'static str;

    /// Every column this record exposes, in display order.
    fn columns() -> Vec<Column<Self>>;

    /// Key used to associate records in JSON/YAML/flat output.
    fn index_key(&self) -> String;

    /// Position within the parent entity for per-sub-entity records.
    fn sub_index(&self) -> Option<String> {
        None
    }

    /// Look up a column by name.
    #[must_use]
    fn column(name: &str) -> Option<Column<Self>> {
        Self::columns().into_iter().find(|column| column.name == name)
    }

    /// Evaluate a named column, `Empty` when unknown.
    fn value_of(&self, name: &str) -> Cell {
        Self::column(name).map_or(Cell::Empty, |column| column.value(self))
    }
}
