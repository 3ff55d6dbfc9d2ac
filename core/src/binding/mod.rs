//! Ordered, uniquely named collections of properties sharing one record.
//!
//! # Example
//!
//! ```
//! use csvbind::binding::BindingBuilder;
//! use csvbind::convert::ParseConverter;
//! use csvbind::record::Record;
//!
//! let mut builder = BindingBuilder::new();
//! builder
//!     .add_name("a", ["A"], ParseConverter::<i32>::new())?
//!     .add_name("b", ["B"], ParseConverter::<i32>::new())?;
//! let mut binding = builder.build();
//!
//! binding.attach_record(Some(Record::with_values(["A", "B"], ["1", "2"]).into_shared()));
//! assert_eq!(binding.get::<i32>("a")?, 1);
//! assert_eq!(binding.get::<i32>(1_usize)?, 2);
//! # Ok::<(), csvbind::error::BindError>(())
//! ```
//!
//! A binding is not thread-safe: confine one binding to one traversal.

pub mod builder;
pub mod cursor;

pub use builder::BindingBuilder;
pub use cursor::RowCursor;

use std::any::{type_name, Any};
use std::fmt;
use std::rc::Rc;

use crate::config::DISPLAY_PLACEHOLDER;
use crate::error::{BindError, BindResult};
use crate::property::{Accessor, Property};
use crate::record::SharedRecord;

/// A property addressed by name or by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKey<'a> {
    Name(&'a str),
    Position(usize),
}

impl<'a> From<&'a str> for PropertyKey<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for PropertyKey<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for PropertyKey<'_> {
    fn from(position: usize) -> Self {
        Self::Position(position)
    }
}

/// Ordered, name-keyed set of properties bound to one record at a time.
///
/// Insertion order is each property's position; it is unrelated to the
/// columns the property targets. Cloning deep-copies every property,
/// including the nested bindings of composite properties, while the clone
/// keeps pointing at the same record until it is re-attached.
#[derive(Clone, Default)]
pub struct Binding {
    properties: Vec<Box<dyn Accessor>>,
    record: Option<SharedRecord>,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("properties", &self.properties)
            .field("bound", &self.record.is_some())
            .finish()
    }
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Append a property. Fails with [`BindError::DuplicateName`] without
    /// modifying the binding.
    pub fn add(&mut self, property: impl Accessor) -> BindResult<()> {
        self.add_boxed(Box::new(property))
    }

    pub fn add_boxed(&mut self, property: Box<dyn Accessor>) -> BindResult<()> {
        let len = self.len();
        self.insert_boxed(len, property)
    }

    /// Insert at `position` (`position == len()` appends).
    pub fn insert_at(&mut self, position: usize, property: impl Accessor) -> BindResult<()> {
        self.insert_boxed(position, Box::new(property))
    }

    pub fn insert_boxed(
        &mut self,
        position: usize,
        mut property: Box<dyn Accessor>,
    ) -> BindResult<()> {
        if position > self.len() {
            return Err(self.out_of_range(position));
        }
        self.ensure_unique(property.name(), None)?;
        property.attach(self.record.clone());
        self.properties.insert(position, property);
        Ok(())
    }

    /// Replace the property at `position`, returning the old one.
    pub fn replace_at(
        &mut self,
        position: usize,
        property: impl Accessor,
    ) -> BindResult<Box<dyn Accessor>> {
        self.replace_boxed(position, Box::new(property))
    }

    pub fn replace_boxed(
        &mut self,
        position: usize,
        mut property: Box<dyn Accessor>,
    ) -> BindResult<Box<dyn Accessor>> {
        if position >= self.len() {
            return Err(self.out_of_range(position));
        }
        self.ensure_unique(property.name(), Some(position))?;
        property.attach(self.record.clone());
        Ok(std::mem::replace(&mut self.properties[position], property))
    }

    /// Replace the property called `name`, returning the old one.
    pub fn replace_by_name(
        &mut self,
        name: &str,
        property: impl Accessor,
    ) -> BindResult<Box<dyn Accessor>> {
        let position = self
            .position(name)
            .ok_or_else(|| BindError::UnknownProperty(name.to_string()))?;
        self.replace_at(position, property)
    }

    pub fn remove_at(&mut self, position: usize) -> BindResult<Box<dyn Accessor>> {
        if position >= self.len() {
            return Err(self.out_of_range(position));
        }
        Ok(self.properties.remove(position))
    }

    /// Remove the property called `name`, if any.
    pub fn remove_by_name(&mut self, name: &str) -> Option<Box<dyn Accessor>> {
        let position = self.position(name)?;
        Some(self.properties.remove(position))
    }

    pub fn clear(&mut self) {
        self.properties.clear();
    }

    fn ensure_unique(&self, name: &str, skip: Option<usize>) -> BindResult<()> {
        match self.position(name) {
            Some(existing) if Some(existing) != skip => {
                Err(BindError::DuplicateName(name.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn out_of_range(&self, index: usize) -> BindError {
        BindError::IndexOutOfRange {
            index,
            len: self.len(),
        }
    }

    // -------------------------------------------------------------------------
    // Record
    // -------------------------------------------------------------------------

    /// Attach a record to every property, in insertion order.
    ///
    /// Attaching the record instance already attached does nothing.
    pub fn attach_record(&mut self, record: Option<SharedRecord>) {
        let unchanged = match (&self.record, &record) {
            (Some(current), Some(new)) => Rc::ptr_eq(current, new),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }
        for property in &mut self.properties {
            property.attach(record.clone());
        }
        self.record = record;
    }

    pub fn record(&self) -> Option<&SharedRecord> {
        self.record.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.record.is_some()
    }

    /// Attach each record in turn and hand the binding to `f`.
    ///
    /// The binding is reused: values read in one call are not tied to the
    /// next record, but the binding itself is. Use [`RowCursor`] with
    /// cloning to keep per-row bindings.
    pub fn for_each_record<I, F, E>(&mut self, records: I, mut f: F) -> Result<(), E>
    where
        I: IntoIterator<Item = SharedRecord>,
        F: FnMut(&mut Binding) -> Result<(), E>,
    {
        for record in records {
            self.attach_record(Some(record));
            f(self)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    pub fn position(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.properties.iter().map(|p| p.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Accessor> + '_ {
        self.properties.iter().map(|p| p.as_ref())
    }

    fn index_of<'k>(&self, key: impl Into<PropertyKey<'k>>) -> BindResult<usize> {
        match key.into() {
            PropertyKey::Name(name) => self
                .position(name)
                .ok_or_else(|| BindError::UnknownProperty(name.to_string())),
            PropertyKey::Position(position) if position < self.len() => Ok(position),
            PropertyKey::Position(position) => Err(self.out_of_range(position)),
        }
    }

    pub fn property<'k>(&self, key: impl Into<PropertyKey<'k>>) -> BindResult<&dyn Accessor> {
        let index = self.index_of(key)?;
        Ok(self.properties[index].as_ref())
    }

    pub fn property_mut<'k>(
        &mut self,
        key: impl Into<PropertyKey<'k>>,
    ) -> BindResult<&mut dyn Accessor> {
        let index = self.index_of(key)?;
        Ok(self.properties[index].as_mut())
    }

    /// The property as its concrete [`Property<T>`].
    pub fn typed<'k, T: 'static>(&self, key: impl Into<PropertyKey<'k>>) -> BindResult<&Property<T>> {
        let property = self.property(key)?;
        property
            .as_any()
            .downcast_ref::<Property<T>>()
            .ok_or_else(|| type_mismatch::<T>(property))
    }

    pub fn typed_mut<'k, T: 'static>(
        &mut self,
        key: impl Into<PropertyKey<'k>>,
    ) -> BindResult<&mut Property<T>> {
        let index = self.index_of(key)?;
        let property = &mut self.properties[index];
        if !property.as_any().is::<Property<T>>() {
            return Err(type_mismatch::<T>(property.as_ref()));
        }
        property
            .as_any_mut()
            .downcast_mut::<Property<T>>()
            .ok_or_else(|| BindError::InvalidCast(type_name::<T>().to_string()))
    }

    // -------------------------------------------------------------------------
    // Values
    // -------------------------------------------------------------------------

    /// Typed read. Fails with [`BindError::InvalidCast`] when `T` is not the
    /// property's value type.
    pub fn get<'k, T: 'static>(&self, key: impl Into<PropertyKey<'k>>) -> BindResult<T> {
        self.typed::<T>(key)?.get()
    }

    /// Typed write.
    pub fn set<'k, T: 'static>(&mut self, key: impl Into<PropertyKey<'k>>, value: T) -> BindResult<()> {
        self.typed_mut::<T>(key)?.set(value)
    }

    /// Boxed read.
    pub fn get_any<'k>(&self, key: impl Into<PropertyKey<'k>>) -> BindResult<Box<dyn Any>> {
        self.property(key)?.get_any()
    }

    /// Boxed write; `None` writes null.
    pub fn set_any<'k>(
        &mut self,
        key: impl Into<PropertyKey<'k>>,
        value: Option<Box<dyn Any>>,
    ) -> BindResult<()> {
        self.property_mut(key)?.set_any(value)
    }

    /// Union of the columns targeted by every property, ascending.
    pub fn column_indexes(&self) -> Vec<usize> {
        let mut indexes: Vec<usize> = self
            .properties
            .iter()
            .flat_map(|p| p.column_indexes())
            .collect();
        indexes.sort_unstable();
        indexes.dedup();
        indexes
    }

    /// Whether every targeted field is empty (or nothing resolves).
    pub(crate) fn is_blank(&self) -> bool {
        let Some(record) = &self.record else {
            return true;
        };
        let record = record.borrow();
        self.column_indexes()
            .into_iter()
            .all(|i| record.field(i).map_or(true, str::is_empty))
    }

    /// Targeted fields joined with `", "`, for error messages.
    pub(crate) fn column_text(&self) -> String {
        let Some(record) = &self.record else {
            return String::new();
        };
        let record = record.borrow();
        self.column_indexes()
            .into_iter()
            .filter_map(|i| record.field(i))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// One `name: value` line per property. Values that fail to convert are
    /// replaced by a placeholder instead of failing the whole dump.
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, property) in self.properties.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match property.display_value() {
                Ok(value) => write!(f, "{}: {}", property.name(), value)?,
                Err(e) => {
                    tracing::warn!(property = property.name(), error = %e, "value not displayable");
                    write!(f, "{}: {}", property.name(), DISPLAY_PLACEHOLDER)?;
                }
            }
        }
        Ok(())
    }
}

fn type_mismatch<T>(property: &dyn Accessor) -> BindError {
    BindError::InvalidCast(format!(
        "property '{}' holds {}, not {}",
        property.name(),
        property.value_type(),
        type_name::<T>()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{
        DatePartsConverter, ListConverter, NullableConverter, ParseConverter, StringConverter,
    };
    use crate::record::Record;
    use chrono::NaiveDate;

    fn int(name: &str, column: &str) -> Property<i32> {
        Property::by_name(name, [column], ParseConverter::<i32>::new()).unwrap()
    }

    fn ab_binding() -> Binding {
        let mut binding = Binding::new();
        binding.add(int("a", "A")).unwrap();
        binding.add(int("b", "B")).unwrap();
        binding
    }

    #[test]
    fn test_reused_binding_over_rows() {
        let mut binding = ab_binding();
        let first = Record::with_values(["A", "B"], ["1", "2"]);
        let second = {
            let mut r = first.next_sibling();
            r.set_values(["3", "4"]);
            r
        };

        let mut seen = Vec::new();
        binding
            .for_each_record([first.into_shared(), second.into_shared()], |b| {
                seen.push((b.get::<i32>("a")?, b.get::<i32>("b")?));
                Ok::<(), BindError>(())
            })
            .unwrap();
        assert_eq!(seen, vec![(1, 2), (3, 4)]);
    }

    #[test]
    fn test_duplicate_add_leaves_binding_unchanged() {
        let mut binding = ab_binding();
        let err = binding.add(int("a", "Other")).unwrap_err();
        assert!(matches!(err, BindError::DuplicateName(ref n) if n == "a"));
        assert_eq!(binding.len(), 2);
        assert_eq!(binding.property_names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_position_operations() {
        let mut binding = ab_binding();
        binding.insert_at(0, int("z", "Z")).unwrap();
        assert_eq!(binding.property_names().collect::<Vec<_>>(), vec!["z", "a", "b"]);

        assert!(matches!(
            binding.insert_at(9, int("y", "Y")),
            Err(BindError::IndexOutOfRange { index: 9, len: 3 })
        ));
        assert!(matches!(binding.remove_at(3), Err(BindError::IndexOutOfRange { .. })));
        assert!(matches!(
            binding.replace_at(3, int("y", "Y")),
            Err(BindError::IndexOutOfRange { .. })
        ));

        let removed = binding.remove_at(0).unwrap();
        assert_eq!(removed.name(), "z");
        assert!(binding.remove_by_name("missing").is_none());
        assert!(binding.remove_by_name("b").is_some());
        assert!(!binding.contains("b"));
    }

    #[test]
    fn test_replace_checks_names() {
        let mut binding = ab_binding();
        // Same name at the same position is fine.
        binding.replace_at(0, int("a", "B")).unwrap();
        // Taking another property's name is not.
        assert!(matches!(
            binding.replace_at(0, int("b", "B")),
            Err(BindError::DuplicateName(_))
        ));

        let old = binding.replace_by_name("b", int("c", "A")).unwrap();
        assert_eq!(old.name(), "b");
        assert_eq!(binding.property_names().collect::<Vec<_>>(), vec!["a", "c"]);
        assert!(matches!(
            binding.replace_by_name("nope", int("d", "A")),
            Err(BindError::UnknownProperty(_))
        ));
    }

    #[test]
    fn test_added_property_sees_current_record() {
        let mut binding = ab_binding();
        binding.attach_record(Some(Record::with_values(["A", "B", "C"], ["1", "2", "3"]).into_shared()));
        binding.add(int("c", "C")).unwrap();
        assert_eq!(binding.get::<i32>("c").unwrap(), 3);
    }

    #[test]
    fn test_lookup_errors() {
        let binding = ab_binding();
        assert!(matches!(binding.get::<i32>("a"), Err(BindError::NotBound(_))));
        assert!(matches!(binding.get::<i32>("x"), Err(BindError::UnknownProperty(_))));
        assert!(matches!(binding.get::<i32>(5_usize), Err(BindError::IndexOutOfRange { .. })));
        assert!(matches!(binding.get::<String>("a"), Err(BindError::InvalidCast(_))));
    }

    #[test]
    fn test_untyped_access() {
        let mut binding = ab_binding();
        let record = Record::with_values(["A", "B"], ["1", "2"]).into_shared();
        binding.attach_record(Some(record.clone()));

        let value = binding.get_any("b").unwrap();
        assert_eq!(value.downcast_ref::<i32>(), Some(&2));

        binding.set_any(0_usize, Some(Box::new(10_i32))).unwrap();
        assert_eq!(record.borrow().field(0), Some("10"));
        assert!(matches!(
            binding.set_any("a", Some(Box::new(1.5_f64))),
            Err(BindError::InvalidCast(_))
        ));
    }

    #[test]
    fn test_attach_same_record_is_noop() {
        let mut binding = Binding::new();
        binding
            .add(Property::by_name("a", ["A"], ParseConverter::<i32>::new()).unwrap())
            .unwrap();
        let record = Record::with_values(["A"], ["1"]).into_shared();
        binding.attach_record(Some(record.clone()));
        binding.attach_record(Some(record.clone()));
        assert!(Rc::ptr_eq(binding.record().unwrap(), &record));

        binding.attach_record(None);
        assert!(!binding.is_bound());
        assert!(matches!(binding.get::<i32>("a"), Err(BindError::NotBound(_))));
    }

    #[test]
    fn test_name_resolution_cached_across_reattach() {
        let mut binding = ab_binding();
        let first = Record::with_values(["A", "B"], ["1", "2"]);
        let sibling = first.next_sibling();
        binding.attach_record(Some(first.into_shared()));
        binding.get::<i32>("a").unwrap();
        binding.attach_record(Some(sibling.into_shared()));
        binding.get::<i32>("a").unwrap();

        let scans = |b: &Binding| match b.typed::<i32>("a").unwrap().target() {
            Some(crate::property::ColumnTarget::Name(t)) => t.scan_count(),
            _ => unreachable!(),
        };
        assert_eq!(scans(&binding), 1);

        binding.attach_record(Some(Record::with_values(["B", "A"], ["2", "1"]).into_shared()));
        assert_eq!(binding.get::<i32>("a").unwrap(), 1);
        assert_eq!(scans(&binding), 2);
    }

    #[test]
    fn test_display_uses_placeholder() {
        let mut binding = Binding::new();
        binding.add(int("a", "A")).unwrap();
        binding
            .add(
                Property::by_name(
                    "strict",
                    ["B"],
                    ParseConverter::<i32>::new().with_throwing(true),
                )
                .unwrap(),
            )
            .unwrap();
        binding.add(Property::by_name("s", ["C"], StringConverter::new()).unwrap()).unwrap();
        binding.attach_record(Some(
            Record::with_values(["A", "B", "C"], ["1", "oops", "x"]).into_shared(),
        ));

        let text = binding.to_display_string();
        assert_eq!(text, format!("a: 1\nstrict: {}\ns: \"x\"", DISPLAY_PLACEHOLDER));
    }

    #[test]
    fn test_column_indexes_union() {
        let mut binding = Binding::new();
        binding.add(Property::by_index("x", 2, StringConverter::new()).unwrap()).unwrap();
        binding.add(Property::by_index("y", 0, StringConverter::new()).unwrap()).unwrap();
        binding.add(Property::by_index("z", 2, StringConverter::new()).unwrap()).unwrap();
        binding.add(Property::by_index("far", 9, StringConverter::new()).unwrap()).unwrap();
        binding.attach_record(Some(Record::without_header(3, Default::default()).into_shared()));
        assert_eq!(binding.column_indexes(), vec![0, 2]);
    }

    fn dated_binding() -> Binding {
        let columns = DatePartsConverter::columns_by_index(1, 2, 3).unwrap();
        let mut builder = BindingBuilder::new();
        builder
            .add_index("id", 0, ParseConverter::<u32>::new())
            .unwrap()
            .add_composite("born", columns, DatePartsConverter::new())
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_composite_read_write() {
        let mut binding = dated_binding();
        let record = Record::with_values(["Id", "Y", "M", "D"], ["1", "1990", "5", "17"]).into_shared();
        binding.attach_record(Some(record.clone()));

        assert_eq!(
            binding.get::<NaiveDate>("born").unwrap(),
            NaiveDate::from_ymd_opt(1990, 5, 17).unwrap()
        );
        assert_eq!(binding.property("born").unwrap().column_indexes(), vec![1, 2, 3]);
        assert_eq!(binding.column_indexes(), vec![0, 1, 2, 3]);

        binding
            .set("born", NaiveDate::from_ymd_opt(2001, 1, 2).unwrap())
            .unwrap();
        assert_eq!(record.borrow().values()[1..], ["2001", "1", "2"]);
    }

    #[test]
    fn test_clone_keeps_composite_state_independent() {
        let mut original = dated_binding();
        let first = Record::with_values(["Id", "Y", "M", "D"], ["1", "1990", "5", "17"]).into_shared();
        original.attach_record(Some(first.clone()));

        let mut copy = original.clone();
        let second = Record::with_values(["Id", "Y", "M", "D"], ["2", "", "", ""]).into_shared();
        copy.attach_record(Some(second.clone()));
        copy.set("born", NaiveDate::from_ymd_opt(2020, 12, 24).unwrap())
            .unwrap();

        assert_eq!(second.borrow().values()[1..], ["2020", "12", "24"]);
        assert_eq!(first.borrow().values()[1..], ["1990", "5", "17"]);
        assert_eq!(
            original.get::<NaiveDate>("born").unwrap(),
            NaiveDate::from_ymd_opt(1990, 5, 17).unwrap()
        );
    }

    #[test]
    fn test_list_and_nullable_properties() {
        let mut binding = Binding::new();
        binding
            .add(
                Property::by_index(
                    "tags",
                    0,
                    ListConverter::new(ParseConverter::<i32>::new(), ';').unwrap(),
                )
                .unwrap(),
            )
            .unwrap();
        binding
            .add(
                Property::by_index("score", 1, NullableConverter::new(ParseConverter::<f64>::new()))
                    .unwrap(),
            )
            .unwrap();
        let record = Record::without_header(2, Default::default()).into_shared();
        binding.attach_record(Some(record.clone()));

        binding.set("tags", vec![1, 2, 3]).unwrap();
        binding.set("score", None::<f64>).unwrap();
        assert_eq!(record.borrow().values(), &["1;2;3".to_string(), String::new()]);
        assert_eq!(binding.get::<Vec<i32>>("tags").unwrap(), vec![1, 2, 3]);
        assert_eq!(binding.get::<Option<f64>>("score").unwrap(), None);
    }
}
