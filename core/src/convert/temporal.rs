//! Date and date-time converters backed by `chrono`.
//!
//! Formats are `strftime`-style strings. An invalid format cannot be
//! detected until it is used: parsing then fails (default value or
//! conversion error, per policy) and formatting returns [`BindError::Format`].

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt::Write;

use super::TypeConverter;
use crate::error::{BindError, BindResult};

const ISO_DATE: &str = "%Y-%m-%d";
const ISO_DATE_TIME: &str = "%Y-%m-%dT%H:%M:%S%.f";
const SPACED_DATE_TIME: &str = "%Y-%m-%d %H:%M:%S%.f";

fn write_formatted(display: impl std::fmt::Display, format: &str) -> BindResult<Option<String>> {
    let mut out = String::new();
    write!(out, "{}", display)
        .map_err(|_| BindError::Format(format!("invalid format string '{}'", format)))?;
    Ok(Some(out))
}

// =============================================================================
// Date
// =============================================================================

/// `NaiveDate` converter. ISO 8601 (`2024-03-15`) unless a format is given.
#[derive(Debug, Clone, Default)]
pub struct DateConverter {
    format: Option<String>,
    default: NaiveDate,
    throwing: bool,
}

impl DateConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_default(mut self, default: NaiveDate) -> Self {
        self.default = default;
        self
    }

    pub fn with_throwing(mut self, throwing: bool) -> Self {
        self.throwing = throwing;
        self
    }

    fn pattern(&self) -> &str {
        self.format.as_deref().unwrap_or(ISO_DATE)
    }
}

impl TypeConverter<NaiveDate> for DateConverter {
    fn try_parse(&self, text: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(text.trim(), self.pattern()).ok()
    }

    fn format(&self, value: &NaiveDate) -> BindResult<Option<String>> {
        let pattern = self.pattern();
        write_formatted(value.format(pattern), pattern)
    }

    fn default_value(&self) -> NaiveDate {
        self.default
    }

    fn throwing(&self) -> bool {
        self.throwing
    }

    fn clone_box(&self) -> Box<dyn TypeConverter<NaiveDate>> {
        Box::new(self.clone())
    }
}

// =============================================================================
// Date-time
// =============================================================================

/// `NaiveDateTime` converter.
///
/// Without a format it reads `2024-03-15T10:30:00` or `2024-03-15 10:30:00`
/// (optional fractional seconds) and writes the `T`-separated form.
#[derive(Debug, Clone, Default)]
pub struct DateTimeConverter {
    format: Option<String>,
    default: NaiveDateTime,
    throwing: bool,
}

impl DateTimeConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_default(mut self, default: NaiveDateTime) -> Self {
        self.default = default;
        self
    }

    pub fn with_throwing(mut self, throwing: bool) -> Self {
        self.throwing = throwing;
        self
    }
}

impl TypeConverter<NaiveDateTime> for DateTimeConverter {
    fn try_parse(&self, text: &str) -> Option<NaiveDateTime> {
        let text = text.trim();
        match &self.format {
            Some(format) => NaiveDateTime::parse_from_str(text, format).ok(),
            None => NaiveDateTime::parse_from_str(text, ISO_DATE_TIME)
                .or_else(|_| NaiveDateTime::parse_from_str(text, SPACED_DATE_TIME))
                .ok(),
        }
    }

    fn format(&self, value: &NaiveDateTime) -> BindResult<Option<String>> {
        let pattern = self.format.as_deref().unwrap_or(ISO_DATE_TIME);
        write_formatted(value.format(pattern), pattern)
    }

    fn default_value(&self) -> NaiveDateTime {
        self.default
    }

    fn throwing(&self) -> bool {
        self.throwing
    }

    fn clone_box(&self) -> Box<dyn TypeConverter<NaiveDateTime>> {
        Box::new(self.clone())
    }
}
