//! Converters for strings, booleans and `FromStr + Display` types.

use std::fmt::Display;
use std::str::FromStr;

use super::TypeConverter;
use crate::error::BindResult;

// =============================================================================
// String
// =============================================================================

/// Identity converter. Never fails.
#[derive(Debug, Clone, Default)]
pub struct StringConverter {
    default: String,
}

impl StringConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }
}

impl TypeConverter<String> for StringConverter {
    fn try_parse(&self, text: &str) -> Option<String> {
        Some(text.to_string())
    }

    fn format(&self, value: &String) -> BindResult<Option<String>> {
        Ok(Some(value.clone()))
    }

    fn default_value(&self) -> String {
        self.default.clone()
    }

    fn throwing(&self) -> bool {
        false
    }

    fn clone_box(&self) -> Box<dyn TypeConverter<String>> {
        Box::new(self.clone())
    }
}

// =============================================================================
// FromStr + Display
// =============================================================================

/// Converter for any type with `FromStr` and `Display`: integers, floats,
/// `char`, `Uuid`, ...
///
/// Surrounding whitespace is ignored when parsing.
///
/// # Example
/// ```
/// use csvbind::convert::{ParseConverter, TypeConverter};
///
/// let conv = ParseConverter::<i32>::new();
/// assert_eq!(conv.parse(" 42 ").unwrap(), 42);
/// assert_eq!(conv.parse("oops").unwrap(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ParseConverter<T> {
    default: T,
    throwing: bool,
}

impl<T: Default> ParseConverter<T> {
    /// Non-throwing converter defaulting to `T::default()`.
    pub fn new() -> Self {
        Self {
            default: T::default(),
            throwing: false,
        }
    }
}

impl<T: Default> Default for ParseConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ParseConverter<T> {
    pub fn with_default(mut self, default: T) -> Self {
        self.default = default;
        self
    }

    pub fn with_throwing(mut self, throwing: bool) -> Self {
        self.throwing = throwing;
        self
    }
}

impl<T> TypeConverter<T> for ParseConverter<T>
where
    T: FromStr + Display + Clone + 'static,
{
    fn try_parse(&self, text: &str) -> Option<T> {
        text.trim().parse().ok()
    }

    fn format(&self, value: &T) -> BindResult<Option<String>> {
        Ok(Some(value.to_string()))
    }

    fn default_value(&self) -> T {
        self.default.clone()
    }

    fn throwing(&self) -> bool {
        self.throwing
    }

    fn clone_box(&self) -> Box<dyn TypeConverter<T>> {
        Box::new(self.clone())
    }
}

// =============================================================================
// Boolean
// =============================================================================

const TRUE_VALUES: &[&str] = &["true", "1", "yes", "y", "on"];
const FALSE_VALUES: &[&str] = &["false", "0", "no", "n", "off"];

/// Boolean converter accepting `true/false`, `1/0`, `yes/no`, `y/n`, `on/off`
/// in any case. Formats as `true` / `false`.
#[derive(Debug, Clone, Default)]
pub struct BoolConverter {
    default: bool,
    throwing: bool,
}

impl BoolConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    pub fn with_throwing(mut self, throwing: bool) -> Self {
        self.throwing = throwing;
        self
    }
}

impl TypeConverter<bool> for BoolConverter {
    fn try_parse(&self, text: &str) -> Option<bool> {
        let text = text.trim();
        if TRUE_VALUES.iter().any(|v| v.eq_ignore_ascii_case(text)) {
            Some(true)
        } else if FALSE_VALUES.iter().any(|v| v.eq_ignore_ascii_case(text)) {
            Some(false)
        } else {
            None
        }
    }

    fn format(&self, value: &bool) -> BindResult<Option<String>> {
        Ok(Some(value.to_string()))
    }

    fn default_value(&self) -> bool {
        self.default
    }

    fn throwing(&self) -> bool {
        self.throwing
    }

    fn clone_box(&self) -> Box<dyn TypeConverter<bool>> {
        Box::new(self.clone())
    }
}
