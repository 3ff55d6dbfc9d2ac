//! Text <-> value converters.
//!
//! A [`TypeConverter`] turns one CSV field into a typed value and back.
//! Every converter carries its own error policy: a non-throwing converter
//! resolves unparseable text to its default value, a throwing one fails
//! with [`BindError::Conversion`].
//!
//! - [`primitive`] - strings, booleans and anything `FromStr + Display`
//! - [`temporal`] - `chrono` dates and date-times with optional formats
//! - [`adapters`] - nullable, sentinel (DB-null style) and list wrappers
//! - [`multi`] - converters reading and writing several columns at once

pub mod adapters;
pub mod multi;
pub mod primitive;
pub mod temporal;

pub use adapters::{DbValue, ListConverter, NullValue, NullableConverter, SentinelConverter};
pub use multi::{DatePartsConverter, MultiColumnConverter};
pub use primitive::{BoolConverter, ParseConverter, StringConverter};
pub use temporal::{DateConverter, DateTimeConverter};

use crate::config::PREVIEW_MAX_CHARS;
use crate::error::{BindError, BindResult};

/// Converts one textual field to and from a value of type `T`.
pub trait TypeConverter<T> {
    /// Parse non-empty text. Must not fail loudly: `None` signals failure.
    fn try_parse(&self, text: &str) -> Option<T>;

    /// Textual form of `value`; `None` means "no textual value".
    fn format(&self, value: &T) -> BindResult<Option<String>>;

    /// Value returned for empty text, and for unparseable text when not throwing.
    fn default_value(&self) -> T;

    /// Whether a null may be written through this converter.
    fn accepts_null(&self) -> bool {
        false
    }

    /// Error policy for unparseable text.
    fn throwing(&self) -> bool;

    fn clone_box(&self) -> Box<dyn TypeConverter<T>>;

    /// Empty text yields the default value; otherwise defers to
    /// [`TypeConverter::try_parse`] and applies the error policy.
    fn parse(&self, text: &str) -> BindResult<T> {
        if text.is_empty() {
            return Ok(self.default_value());
        }
        match self.try_parse(text) {
            Some(value) => Ok(value),
            None if self.throwing() => Err(conversion_error::<T>(text)),
            None => Ok(self.default_value()),
        }
    }
}

impl<T: 'static> Clone for Box<dyn TypeConverter<T>> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl<T: 'static> TypeConverter<T> for Box<dyn TypeConverter<T>> {
    fn try_parse(&self, text: &str) -> Option<T> {
        self.as_ref().try_parse(text)
    }

    fn format(&self, value: &T) -> BindResult<Option<String>> {
        self.as_ref().format(value)
    }

    fn default_value(&self) -> T {
        self.as_ref().default_value()
    }

    fn accepts_null(&self) -> bool {
        self.as_ref().accepts_null()
    }

    fn throwing(&self) -> bool {
        self.as_ref().throwing()
    }

    fn clone_box(&self) -> Box<dyn TypeConverter<T>> {
        self.as_ref().clone_box()
    }

    fn parse(&self, text: &str) -> BindResult<T> {
        self.as_ref().parse(text)
    }
}

/// Quoted text when short enough, a length placeholder otherwise.
pub(crate) fn preview(text: &str) -> String {
    let len = text.chars().count();
    if len <= PREVIEW_MAX_CHARS {
        format!("\"{}\"", text)
    } else {
        format!("a text of {} characters", len)
    }
}

pub(crate) fn conversion_error<T>(text: &str) -> BindError {
    BindError::Conversion {
        target: std::any::type_name::<T>(),
        preview: preview(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_yields_default_even_when_throwing() {
        let conv = ParseConverter::<i32>::new().with_default(7).with_throwing(true);
        assert_eq!(conv.parse("").unwrap(), 7);
    }

    #[test]
    fn test_non_throwing_falls_back_to_default() {
        let conv = ParseConverter::<i32>::new().with_default(-1);
        assert_eq!(conv.parse("abc").unwrap(), -1);
        assert_eq!(conv.parse("42").unwrap(), 42);
    }

    #[test]
    fn test_throwing_names_type_and_text() {
        let conv = ParseConverter::<i32>::new().with_throwing(true);
        let err = conv.parse("abc").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("i32"));
        assert!(msg.contains("\"abc\""));
    }

    #[test]
    fn test_long_text_is_not_quoted() {
        let long = "x".repeat(PREVIEW_MAX_CHARS + 1);
        let conv = ParseConverter::<u8>::new().with_throwing(true);
        let msg = conv.parse(&long).unwrap_err().to_string();
        assert!(!msg.contains(&long));
        assert!(msg.contains("41 characters"));

        let exact = "y".repeat(PREVIEW_MAX_CHARS);
        assert_eq!(preview(&exact), format!("\"{}\"", exact));
    }

    #[test]
    fn test_boxed_converter_delegates() {
        let boxed: Box<dyn TypeConverter<i64>> = Box::new(ParseConverter::<i64>::new());
        let cloned = boxed.clone();
        assert_eq!(cloned.parse("12").unwrap(), 12);
        assert_eq!(boxed.format(&5).unwrap().as_deref(), Some("5"));
    }
}
