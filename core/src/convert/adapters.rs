//! Converter wrappers.
//!
//! - [`NullableConverter`] lifts a `T` converter to `Option<T>`
//! - [`SentinelConverter`] maps a null-defaulting converter onto [`DbValue`]
//! - [`ListConverter`] reads and writes a `Vec<T>` packed into one field

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use uuid::Uuid;

use super::TypeConverter;
use crate::error::{BindError, BindResult};

// =============================================================================
// Nullable
// =============================================================================

/// `Option<T>` on top of a `T` converter. Empty text is `None`.
pub struct NullableConverter<T> {
    inner: Box<dyn TypeConverter<T>>,
}

impl<T: 'static> Clone for NullableConverter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
        }
    }
}

impl<T: 'static> NullableConverter<T> {
    pub fn new(inner: impl TypeConverter<T> + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }
}

impl<T: 'static> TypeConverter<Option<T>> for NullableConverter<T> {
    fn try_parse(&self, text: &str) -> Option<Option<T>> {
        self.inner.try_parse(text).map(Some)
    }

    fn format(&self, value: &Option<T>) -> BindResult<Option<String>> {
        match value {
            Some(v) => self.inner.format(v),
            None => Ok(None),
        }
    }

    fn default_value(&self) -> Option<T> {
        None
    }

    fn accepts_null(&self) -> bool {
        true
    }

    fn throwing(&self) -> bool {
        self.inner.throwing()
    }

    fn clone_box(&self) -> Box<dyn TypeConverter<Option<T>>> {
        Box::new(self.clone())
    }
}

// =============================================================================
// Sentinel (DB-null style)
// =============================================================================

/// Values that have a null equivalent.
pub trait NullValue {
    fn is_null(&self) -> bool;
}

impl<T> NullValue for Option<T> {
    fn is_null(&self) -> bool {
        self.is_none()
    }
}

impl<T> NullValue for Vec<T> {
    fn is_null(&self) -> bool {
        self.is_empty()
    }
}

macro_rules! never_null {
    ($($ty:ty),* $(,)?) => {
        $(
            impl NullValue for $ty {
                fn is_null(&self) -> bool {
                    false
                }
            }
        )*
    };
}

never_null!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
    String, NaiveDate, NaiveDateTime, Uuid,
);

/// A value or the reserved null marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DbValue<T> {
    /// No value. Read from an empty field, written as no text.
    Null,
    Value(T),
}

impl<T> DbValue<T> {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Null => None,
        }
    }
}

/// [`DbValue`] on top of a converter whose default value is null.
///
/// Wrapping a converter whose default is a real value fails with
/// [`BindError::InvalidCast`]: the marker would be ambiguous.
pub struct SentinelConverter<T> {
    inner: Box<dyn TypeConverter<T>>,
}

impl<T: 'static> Clone for SentinelConverter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
        }
    }
}

impl<T: NullValue + 'static> SentinelConverter<T> {
    pub fn new(inner: impl TypeConverter<T> + 'static) -> BindResult<Self> {
        if !inner.default_value().is_null() {
            return Err(BindError::InvalidCast(format!(
                "a converter for {} must default to null to be wrapped",
                std::any::type_name::<T>()
            )));
        }
        Ok(Self {
            inner: Box::new(inner),
        })
    }
}

impl<T: NullValue + 'static> TypeConverter<DbValue<T>> for SentinelConverter<T> {
    fn try_parse(&self, text: &str) -> Option<DbValue<T>> {
        self.inner.try_parse(text).map(|v| {
            if v.is_null() {
                DbValue::Null
            } else {
                DbValue::Value(v)
            }
        })
    }

    fn format(&self, value: &DbValue<T>) -> BindResult<Option<String>> {
        match value {
            DbValue::Value(v) => self.inner.format(v),
            DbValue::Null => Ok(None),
        }
    }

    fn default_value(&self) -> DbValue<T> {
        DbValue::Null
    }

    fn accepts_null(&self) -> bool {
        true
    }

    fn throwing(&self) -> bool {
        self.inner.throwing()
    }

    fn clone_box(&self) -> Box<dyn TypeConverter<DbValue<T>>> {
        Box::new(self.clone())
    }
}

// =============================================================================
// List
// =============================================================================

/// `Vec<T>` stored in a single field.
///
/// Items are written as one CSV record using `separator` as delimiter, so
/// quoting follows the same rules as the surrounding file:
///
/// ```
/// use csvbind::convert::{ListConverter, ParseConverter, TypeConverter};
///
/// let conv = ListConverter::new(ParseConverter::<i32>::new(), ';').unwrap();
/// assert_eq!(conv.format(&vec![1, 2, 3]).unwrap().as_deref(), Some("1;2;3"));
/// assert_eq!(conv.parse("1;2;3").unwrap(), vec![1, 2, 3]);
/// ```
pub struct ListConverter<T> {
    item: Box<dyn TypeConverter<T>>,
    separator: u8,
}

impl<T: 'static> Clone for ListConverter<T> {
    fn clone(&self) -> Self {
        Self {
            item: self.item.clone_box(),
            separator: self.separator,
        }
    }
}

impl<T: 'static> ListConverter<T> {
    /// Fails with [`BindError::InvalidSeparator`] for non-ASCII characters,
    /// quotes and line breaks.
    pub fn new(item: impl TypeConverter<T> + 'static, separator: char) -> BindResult<Self> {
        if !separator.is_ascii() || matches!(separator, '"' | '\r' | '\n') {
            return Err(BindError::InvalidSeparator(separator));
        }
        Ok(Self {
            item: Box::new(item),
            separator: separator as u8,
        })
    }

    pub fn separator(&self) -> char {
        self.separator as char
    }

    fn parse_item(&self, field: &str) -> Option<T> {
        if field.is_empty() {
            return Some(self.item.default_value());
        }
        match self.item.try_parse(field) {
            Some(v) => Some(v),
            None if self.item.throwing() => None,
            None => Some(self.item.default_value()),
        }
    }
}

impl<T: 'static> TypeConverter<Vec<T>> for ListConverter<T> {
    fn try_parse(&self, text: &str) -> Option<Vec<T>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.separator)
            .from_reader(text.as_bytes());

        let mut record = csv::StringRecord::new();
        if !reader.read_record(&mut record).ok()? {
            return None;
        }
        // More than one record: the text held an unquoted line break.
        let mut rest = csv::StringRecord::new();
        if reader.read_record(&mut rest).ok()? {
            return None;
        }

        record.iter().map(|field| self.parse_item(field)).collect()
    }

    /// Empty lists have no textual value.
    fn format(&self, values: &Vec<T>) -> BindResult<Option<String>> {
        if values.is_empty() {
            return Ok(None);
        }

        let fields = values
            .iter()
            .map(|v| self.item.format(v).map(Option::unwrap_or_default))
            .collect::<BindResult<Vec<String>>>()?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .delimiter(self.separator)
            .from_writer(Vec::new());
        writer
            .write_record(&fields)
            .map_err(|e| BindError::Format(e.to_string()))?;
        let bytes = writer
            .into_inner()
            .map_err(|e| BindError::Format(e.to_string()))?;
        let line = String::from_utf8(bytes).map_err(|e| BindError::Format(e.to_string()))?;

        Ok(Some(line.trim_end_matches(|c| c == '\r' || c == '\n').to_string()))
    }

    fn default_value(&self) -> Vec<T> {
        Vec::new()
    }

    fn accepts_null(&self) -> bool {
        true
    }

    fn throwing(&self) -> bool {
        self.item.throwing()
    }

    fn clone_box(&self) -> Box<dyn TypeConverter<Vec<T>>> {
        Box::new(self.clone())
    }
}
