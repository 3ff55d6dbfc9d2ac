//! Column resolution for single-column properties.

use std::cell::Cell;

use super::wildcard::{is_wildcard, WildcardPattern};
use crate::config::WildcardTimeout;
use crate::record::Record;

/// Where a single-column property looks for its field.
#[derive(Debug, Clone)]
pub enum ColumnTarget {
    Index(IndexTarget),
    Name(NameTarget),
}

impl ColumnTarget {
    pub fn resolve(&self, record: &Record) -> Option<usize> {
        match self {
            Self::Index(target) => target.resolve(record),
            Self::Name(target) => target.resolve(record),
        }
    }
}

// =============================================================================
// Index
// =============================================================================

/// Fixed column position. Inactive when the record is too short.
#[derive(Debug, Clone, Copy)]
pub struct IndexTarget {
    index: usize,
}

impl IndexTarget {
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn resolve(&self, record: &Record) -> Option<usize> {
        (self.index < record.column_count()).then_some(self.index)
    }
}

// =============================================================================
// Name
// =============================================================================

#[derive(Debug, Clone)]
enum Alias {
    Literal(String),
    Wildcard(WildcardPattern),
}

#[derive(Debug, Clone, Copy)]
struct Resolution {
    identifier: u64,
    index: Option<usize>,
}

/// Ordered column-name aliases, wildcards allowed.
///
/// The first alias (in declaration order) matching any column wins; among
/// columns matching the same alias, the lowest index wins. The result is
/// cached until a record with another identifier is seen.
#[derive(Debug, Clone)]
pub struct NameTarget {
    aliases: Vec<Alias>,
    timeout: WildcardTimeout,
    cache: Cell<Option<Resolution>>,
    scans: Cell<usize>,
}

impl NameTarget {
    /// Empty aliases are dropped.
    pub fn new<I, S>(aliases: I, timeout: WildcardTimeout) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let aliases = aliases
            .into_iter()
            .filter(|a| !a.as_ref().is_empty())
            .map(|a| {
                let a = a.as_ref();
                if is_wildcard(a) {
                    Alias::Wildcard(WildcardPattern::new(a))
                } else {
                    Alias::Literal(a.to_string())
                }
            })
            .collect();

        Self {
            aliases,
            timeout,
            cache: Cell::new(None),
            scans: Cell::new(0),
        }
    }

    pub fn timeout(&self) -> WildcardTimeout {
        self.timeout
    }

    /// How many times the aliases were scanned against column names.
    pub fn scan_count(&self) -> usize {
        self.scans.get()
    }

    pub fn resolve(&self, record: &Record) -> Option<usize> {
        if let Some(cached) = self.cache.get() {
            if cached.identifier == record.identifier() {
                return cached.index;
            }
        }

        let index = self.scan(record);
        self.cache.set(Some(Resolution {
            identifier: record.identifier(),
            index,
        }));
        index
    }

    fn scan(&self, record: &Record) -> Option<usize> {
        self.scans.set(self.scans.get() + 1);

        let names = record.column_names();
        let comparer = record.comparer();

        for alias in &self.aliases {
            let found = match alias {
                Alias::Literal(literal) => names.iter().position(|n| comparer.matches(n, literal)),
                Alias::Wildcard(pattern) => {
                    pattern.find(names, comparer.is_case_sensitive(), self.timeout)
                }
            };
            if let Some(index) = found {
                tracing::debug!(index, column = %names[index], "resolved column alias");
                return Some(index);
            }
        }

        tracing::debug!(aliases = self.aliases.len(), "no column matches any alias");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NameComparer;

    fn target(aliases: &[&str]) -> NameTarget {
        NameTarget::new(aliases.iter().copied(), WildcardTimeout::Infinite)
    }

    #[test]
    fn test_index_target() {
        let record = Record::with_values(["A", "B"], ["1", "2"]);
        assert_eq!(IndexTarget::new(1).resolve(&record), Some(1));
        assert_eq!(IndexTarget::new(5).resolve(&record), None);
    }

    #[test]
    fn test_resolution_is_cached_per_identifier() {
        let record = Record::new(["A", "B"], NameComparer::Ordinal);
        let t = target(&["B"]);
        assert_eq!(t.resolve(&record), Some(1));
        assert_eq!(t.resolve(&record), Some(1));
        assert_eq!(t.scan_count(), 1);

        let sibling = record.next_sibling();
        assert_eq!(t.resolve(&sibling), Some(1));
        assert_eq!(t.scan_count(), 1);
    }

    #[test]
    fn test_new_identifier_forces_rescan() {
        let first = Record::new(["A", "B"], NameComparer::Ordinal);
        let t = target(&["B"]);
        assert_eq!(t.resolve(&first), Some(1));

        let second = Record::new(["B", "A"], NameComparer::Ordinal);
        assert_eq!(t.resolve(&second), Some(0));
        assert_eq!(t.scan_count(), 2);
    }

    #[test]
    fn test_alias_order_beats_specificity() {
        let record = Record::new(["Blabla", "Bla"], NameComparer::Ordinal);
        assert_eq!(target(&["Bla*", "Bla"]).resolve(&record), Some(0));
        assert_eq!(target(&["Bla", "Bla*"]).resolve(&record), Some(1));
    }

    #[test]
    fn test_empty_aliases_skipped() {
        let record = Record::new(["A", "B"], NameComparer::Ordinal);
        assert_eq!(target(&["", "B"]).resolve(&record), Some(1));
        assert_eq!(target(&["", ""]).resolve(&record), None);
    }

    #[test]
    fn test_comparer_of_record_applies() {
        let record = Record::new(["name"], NameComparer::IgnoreCase);
        assert_eq!(target(&["NAME"]).resolve(&record), Some(0));
        assert_eq!(target(&["NA*"]).resolve(&record), Some(0));

        let record = Record::new(["name"], NameComparer::Ordinal);
        assert_eq!(target(&["NAME"]).resolve(&record), None);
        assert_eq!(target(&["NA*"]).resolve(&record), None);
    }
}
