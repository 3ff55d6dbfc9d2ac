//! Converters spanning several columns.
//!
//! A [`MultiColumnConverter`] works on a nested [`Binding`] owned by a
//! composite property: it reads the nested properties to build one value
//! and writes them back to decompose it.

use chrono::{Datelike, NaiveDate};

use super::{conversion_error, NullableConverter, ParseConverter};
use crate::binding::{Binding, BindingBuilder};
use crate::error::BindResult;

/// Builds and decomposes a `T` through the properties of a nested binding.
pub trait MultiColumnConverter<T> {
    /// Build a value from the nested properties. `None` signals failure.
    fn try_parse(&self, columns: &Binding) -> Option<T>;

    /// Write `value` through the nested properties.
    fn format(&self, value: &T, columns: &mut Binding) -> BindResult<()>;

    fn default_value(&self) -> T;

    fn accepts_null(&self) -> bool {
        false
    }

    fn throwing(&self) -> bool;

    fn clone_box(&self) -> Box<dyn MultiColumnConverter<T>>;

    /// Same policy as [`super::TypeConverter::parse`]: blank columns yield the
    /// default value, failures yield it too unless throwing.
    fn parse(&self, columns: &Binding) -> BindResult<T> {
        if columns.is_blank() {
            return Ok(self.default_value());
        }
        match self.try_parse(columns) {
            Some(value) => Ok(value),
            None if self.throwing() => Err(conversion_error::<T>(&columns.column_text())),
            None => Ok(self.default_value()),
        }
    }
}

impl<T: 'static> Clone for Box<dyn MultiColumnConverter<T>> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

// =============================================================================
// Date from year / month / day columns
// =============================================================================

/// `NaiveDate` spread over three columns.
///
/// The nested binding must hold `year: Option<i32>`, `month: Option<u32>`
/// and `day: Option<u32>` properties. A missing or malformed part fails the
/// whole date; [`DatePartsConverter::columns_by_name`] and
/// [`DatePartsConverter::columns_by_index`] build one.
#[derive(Debug, Clone, Default)]
pub struct DatePartsConverter {
    default: NaiveDate,
    throwing: bool,
}

impl DatePartsConverter {
    pub const YEAR: &'static str = "year";
    pub const MONTH: &'static str = "month";
    pub const DAY: &'static str = "day";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, default: NaiveDate) -> Self {
        self.default = default;
        self
    }

    pub fn with_throwing(mut self, throwing: bool) -> Self {
        self.throwing = throwing;
        self
    }

    /// Nested binding reading the parts from named columns.
    pub fn columns_by_name(year: &str, month: &str, day: &str) -> BindResult<Binding> {
        let mut builder = BindingBuilder::new();
        builder
            .add_name(Self::YEAR, [year], part::<i32>())?
            .add_name(Self::MONTH, [month], part::<u32>())?
            .add_name(Self::DAY, [day], part::<u32>())?;
        Ok(builder.build())
    }

    /// Nested binding reading the parts from fixed positions.
    pub fn columns_by_index(year: usize, month: usize, day: usize) -> BindResult<Binding> {
        let mut builder = BindingBuilder::new();
        builder
            .add_index(Self::YEAR, year, part::<i32>())?
            .add_index(Self::MONTH, month, part::<u32>())?
            .add_index(Self::DAY, day, part::<u32>())?;
        Ok(builder.build())
    }
}

// Blank and malformed parts both read as `None`.
fn part<T>() -> NullableConverter<T>
where
    T: std::str::FromStr + std::fmt::Display + Clone + Default + 'static,
{
    NullableConverter::new(ParseConverter::<T>::new())
}

impl MultiColumnConverter<NaiveDate> for DatePartsConverter {
    fn try_parse(&self, columns: &Binding) -> Option<NaiveDate> {
        let year = columns.get::<Option<i32>>(Self::YEAR).ok()??;
        let month = columns.get::<Option<u32>>(Self::MONTH).ok()??;
        let day = columns.get::<Option<u32>>(Self::DAY).ok()??;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    fn format(&self, value: &NaiveDate, columns: &mut Binding) -> BindResult<()> {
        columns.set(Self::YEAR, Some(value.year()))?;
        columns.set(Self::MONTH, Some(value.month()))?;
        columns.set(Self::DAY, Some(value.day()))
    }

    fn default_value(&self) -> NaiveDate {
        self.default
    }

    fn throwing(&self) -> bool {
        self.throwing
    }

    fn clone_box(&self) -> Box<dyn MultiColumnConverter<NaiveDate>> {
        Box::new(self.clone())
    }
}
