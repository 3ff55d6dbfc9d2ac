//! CSV record: one row's ordered text fields plus column-name metadata.
//!
//! Records of one read or write session share a column layout and an
//! identifier. Name properties cache their resolved column per identifier,
//! so a record with a new identifier forces them to resolve again.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_IDENTIFIER: AtomicU64 = AtomicU64::new(1);

fn next_identifier() -> u64 {
    NEXT_IDENTIFIER.fetch_add(1, Ordering::Relaxed)
}

/// A record shared between a binding and all of its properties.
///
/// Not thread-safe: confine one record (and the binding it is attached to)
/// to one traversal.
pub type SharedRecord = Rc<RefCell<Record>>;

/// How column names are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameComparer {
    /// Exact, case-sensitive comparison.
    #[default]
    Ordinal,
    /// Case-insensitive comparison using Unicode lowercase mapping, the same
    /// folding wildcard aliases use.
    IgnoreCase,
}

impl NameComparer {
    pub fn matches(&self, a: &str, b: &str) -> bool {
        match self {
            Self::Ordinal => a == b,
            Self::IgnoreCase => a
                .chars()
                .flat_map(char::to_lowercase)
                .eq(b.chars().flat_map(char::to_lowercase)),
        }
    }

    pub fn is_case_sensitive(&self) -> bool {
        matches!(self, Self::Ordinal)
    }
}

#[derive(Debug)]
struct Layout {
    names: Vec<String>,
    comparer: NameComparer,
}

/// One row of text fields.
#[derive(Debug, Clone)]
pub struct Record {
    fields: Vec<String>,
    layout: Rc<Layout>,
    identifier: u64,
}

impl Record {
    /// Empty record (every field empty) with a fresh identifier.
    pub fn new<I, S>(column_names: I, comparer: NameComparer) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = column_names.into_iter().map(Into::into).collect();
        Self {
            fields: vec![String::new(); names.len()],
            layout: Rc::new(Layout { names, comparer }),
            identifier: next_identifier(),
        }
    }

    /// Record whose columns are named `Column1` .. `ColumnN`.
    pub fn without_header(column_count: usize, comparer: NameComparer) -> Self {
        Self::new((1..=column_count).map(|i| format!("Column{}", i)), comparer)
    }

    /// Convenience: record with names and initial values.
    ///
    /// Missing values are left empty, extra values are ignored.
    pub fn with_values<I, S, V, T>(column_names: I, values: V) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        V: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut record = Self::new(column_names, NameComparer::default());
        record.set_values(values);
        record
    }

    /// Empty record of the same session: same layout, same identifier.
    pub fn next_sibling(&self) -> Self {
        Self {
            fields: vec![String::new(); self.fields.len()],
            layout: Rc::clone(&self.layout),
            identifier: self.identifier,
        }
    }

    pub fn into_shared(self) -> SharedRecord {
        Rc::new(RefCell::new(self))
    }

    pub fn column_count(&self) -> usize {
        self.fields.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.layout.names
    }

    pub fn comparer(&self) -> NameComparer {
        self.layout.comparer
    }

    /// Changes whenever the column layout may have changed.
    pub fn identifier(&self) -> u64 {
        self.identifier
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Overwrite one field. `None` writes an empty field; out-of-range indexes are ignored.
    pub fn set_field(&mut self, index: usize, value: Option<String>) {
        if let Some(slot) = self.fields.get_mut(index) {
            *slot = value.unwrap_or_default();
        }
    }

    /// Overwrite fields left to right, clearing the ones not supplied.
    pub fn set_values<V, T>(&mut self, values: V)
    where
        V: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut values = values.into_iter();
        for slot in self.fields.iter_mut() {
            *slot = values.next().map(Into::into).unwrap_or_default();
        }
    }

    pub fn values(&self) -> &[String] {
        &self.fields
    }

    /// Column index of `name` under this record's comparer.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let comparer = self.comparer();
        self.column_names().iter().position(|c| comparer.matches(c, name))
    }
}
