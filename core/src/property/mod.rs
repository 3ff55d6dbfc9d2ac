//! Named, typed properties bound to record columns.
//!
//! A [`Property<T>`] reads and writes one logical value of type `T`:
//!
//! - [`Property::by_index`] - fixed column position
//! - [`Property::by_name`] - ordered column-name aliases, wildcards allowed
//! - [`Property::composite`] - several columns through a nested [`Binding`]
//!
//! [`Accessor`] erases `T` so that a [`Binding`] can hold properties of
//! different types.

pub mod target;
pub mod wildcard;

pub use target::{ColumnTarget, IndexTarget, NameTarget};

use std::any::{type_name, Any};
use std::fmt;

use crate::binding::Binding;
use crate::config::{Settings, WildcardTimeout};
use crate::convert::{MultiColumnConverter, TypeConverter};
use crate::error::{BindError, BindResult};
use crate::record::SharedRecord;

/// Whether `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate_name(name: &str) -> BindResult<String> {
    if is_identifier(name) {
        Ok(name.to_string())
    } else {
        Err(BindError::BadIdentifier(name.to_string()))
    }
}

// =============================================================================
// Type-erased accessor
// =============================================================================

/// Type-erased view of a property, as stored in a [`Binding`].
pub trait Accessor: Any {
    fn name(&self) -> &str;

    /// Name of the value type.
    fn value_type(&self) -> &'static str;

    /// Attach (or detach, with `None`) the record this property reads and writes.
    fn attach(&mut self, record: Option<SharedRecord>);

    /// Column indexes currently targeted, ascending and deduplicated.
    fn column_indexes(&self) -> Vec<usize>;

    fn accepts_null(&self) -> bool;

    /// Current value, boxed.
    fn get_any(&self) -> BindResult<Box<dyn Any>>;

    /// Write a boxed value. `None` writes null and needs a null-accepting converter.
    fn set_any(&mut self, value: Option<Box<dyn Any>>) -> BindResult<()>;

    /// Current value rendered with `Debug`.
    fn display_value(&self) -> BindResult<String>;

    fn clone_accessor(&self) -> Box<dyn Accessor>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl Clone for Box<dyn Accessor> {
    fn clone(&self) -> Self {
        self.clone_accessor()
    }
}

impl fmt::Debug for dyn Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("name", &self.name())
            .field("type", &self.value_type())
            .finish()
    }
}

// =============================================================================
// Property
// =============================================================================

enum Source<T> {
    Column {
        target: ColumnTarget,
        converter: Box<dyn TypeConverter<T>>,
    },
    Composite {
        columns: Binding,
        converter: Box<dyn MultiColumnConverter<T>>,
    },
}

impl<T: 'static> Clone for Source<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Column { target, converter } => Self::Column {
                target: target.clone(),
                converter: converter.clone_box(),
            },
            // Deep copy: the clone gets its own nested properties.
            Self::Composite { columns, converter } => Self::Composite {
                columns: columns.clone(),
                converter: converter.clone_box(),
            },
        }
    }
}

/// A named, typed value living in one or more columns of a record.
///
/// Reads and writes go to the record currently attached; a property whose
/// column cannot be resolved is inactive: reads return the converter's
/// default value and writes are dropped.
///
/// # Example
/// ```
/// use csvbind::convert::ParseConverter;
/// use csvbind::property::Property;
/// use csvbind::record::Record;
///
/// let record = Record::with_values(["Id", "Name"], ["7", "Ada"]).into_shared();
/// let mut id = Property::by_name("id", ["ID", "Id"], ParseConverter::<u32>::new()).unwrap();
///
/// use csvbind::property::Accessor;
/// id.attach(Some(record));
/// assert_eq!(id.get().unwrap(), 7);
/// ```
pub struct Property<T> {
    name: String,
    source: Source<T>,
    record: Option<SharedRecord>,
}

impl<T: 'static> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            source: self.source.clone(),
            record: self.record.clone(),
        }
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.source {
            Source::Column { target, .. } => format!("{:?}", target),
            Source::Composite { columns, .. } => format!("Composite({:?})", columns),
        };
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("type", &type_name::<T>())
            .field("source", &kind)
            .field("bound", &self.record.is_some())
            .finish()
    }
}

impl<T: 'static> Property<T> {
    /// Property at a fixed column position.
    pub fn by_index(
        name: &str,
        index: usize,
        converter: impl TypeConverter<T> + 'static,
    ) -> BindResult<Self> {
        Self::column(name, ColumnTarget::Index(IndexTarget::new(index)), converter)
    }

    /// Property found by column-name aliases, using the process-wide
    /// default wildcard timeout.
    pub fn by_name<I, S>(
        name: &str,
        aliases: I,
        converter: impl TypeConverter<T> + 'static,
    ) -> BindResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let timeout = Settings::current().wildcard_timeout;
        Self::by_name_with_timeout(name, aliases, timeout, converter)
    }

    pub fn by_name_with_timeout<I, S>(
        name: &str,
        aliases: I,
        timeout: WildcardTimeout,
        converter: impl TypeConverter<T> + 'static,
    ) -> BindResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let target = ColumnTarget::Name(NameTarget::new(aliases, timeout));
        Self::column(name, target, converter)
    }

    /// Property spanning the columns of an already built nested binding.
    ///
    /// The nested binding is owned by the property and follows every record
    /// attached to it.
    pub fn composite(
        name: &str,
        columns: Binding,
        converter: impl MultiColumnConverter<T> + 'static,
    ) -> BindResult<Self> {
        Ok(Self {
            name: validate_name(name)?,
            source: Source::Composite {
                columns,
                converter: Box::new(converter),
            },
            record: None,
        })
    }

    fn column(
        name: &str,
        target: ColumnTarget,
        converter: impl TypeConverter<T> + 'static,
    ) -> BindResult<Self> {
        Ok(Self {
            name: validate_name(name)?,
            source: Source::Column {
                target,
                converter: Box::new(converter),
            },
            record: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_bound(&self) -> bool {
        self.record.is_some()
    }

    pub fn target(&self) -> Option<&ColumnTarget> {
        match &self.source {
            Source::Column { target, .. } => Some(target),
            Source::Composite { .. } => None,
        }
    }

    /// Nested binding of a composite property.
    pub fn columns(&self) -> Option<&Binding> {
        match &self.source {
            Source::Composite { columns, .. } => Some(columns),
            Source::Column { .. } => None,
        }
    }

    /// Column of a single-column property in the attached record.
    pub fn resolved_index(&self) -> Option<usize> {
        match (&self.source, &self.record) {
            (Source::Column { target, .. }, Some(record)) => target.resolve(&record.borrow()),
            _ => None,
        }
    }

    fn bound_record(&self) -> BindResult<&SharedRecord> {
        self.record
            .as_ref()
            .ok_or_else(|| BindError::NotBound(self.name.clone()))
    }

    pub fn get(&self) -> BindResult<T> {
        let record = self.bound_record()?;
        match &self.source {
            Source::Column { target, converter } => {
                let record = record.borrow();
                match target.resolve(&record) {
                    Some(index) => converter.parse(record.field(index).unwrap_or_default()),
                    None => Ok(converter.default_value()),
                }
            }
            Source::Composite { columns, converter } => converter.parse(columns),
        }
    }

    pub fn set(&mut self, value: T) -> BindResult<()> {
        let record = self.bound_record()?.clone();
        match &mut self.source {
            Source::Column { target, converter } => {
                let mut record = record.borrow_mut();
                let Some(index) = target.resolve(&record) else {
                    return Ok(());
                };
                let text = converter.format(&value)?;
                record.set_field(index, text);
                Ok(())
            }
            Source::Composite { columns, converter } => converter.format(&value, columns),
        }
    }

    fn default_value(&self) -> T {
        match &self.source {
            Source::Column { converter, .. } => converter.default_value(),
            Source::Composite { converter, .. } => converter.default_value(),
        }
    }
}

impl<T: Clone + fmt::Debug + 'static> Accessor for Property<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn attach(&mut self, record: Option<SharedRecord>) {
        if let Source::Composite { columns, .. } = &mut self.source {
            columns.attach_record(record.clone());
        }
        self.record = record;
    }

    fn column_indexes(&self) -> Vec<usize> {
        match &self.source {
            Source::Column { .. } => self.resolved_index().into_iter().collect(),
            Source::Composite { columns, .. } => columns.column_indexes(),
        }
    }

    fn accepts_null(&self) -> bool {
        match &self.source {
            Source::Column { converter, .. } => converter.accepts_null(),
            Source::Composite { converter, .. } => converter.accepts_null(),
        }
    }

    fn get_any(&self) -> BindResult<Box<dyn Any>> {
        Ok(Box::new(self.get()?))
    }

    fn set_any(&mut self, value: Option<Box<dyn Any>>) -> BindResult<()> {
        match value {
            None if self.accepts_null() => {
                let null = self.default_value();
                self.set(null)
            }
            None => Err(BindError::InvalidCast(format!(
                "property '{}' does not accept null",
                self.name
            ))),
            Some(boxed) => match boxed.downcast::<T>() {
                Ok(value) => self.set(*value),
                Err(_) => Err(BindError::InvalidCast(format!(
                    "property '{}' expects a value of type {}",
                    self.name,
                    type_name::<T>()
                ))),
            },
        }
    }

    fn display_value(&self) -> BindResult<String> {
        self.get().map(|v| format!("{:?}", v))
    }

    fn clone_accessor(&self) -> Box<dyn Accessor> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
