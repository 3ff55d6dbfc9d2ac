//! JSON binding schemas.
//!
//! A schema declares the properties of a binding in data so the CLI can
//! bind arbitrary files:
//!
//! ```json
//! {
//!   "wildcard_timeout_ms": 20,
//!   "properties": [
//!     { "name": "id", "index": 0, "type": "int", "throwing": true },
//!     { "name": "title", "aliases": ["Title", "Titre*"], "type": "string" },
//!     { "name": "tags", "aliases": ["Tags"], "type": "string", "separator": "|" },
//!     { "name": "released", "type": "date",
//!       "parts": { "year": "Year", "month": "Month", "day": "Day" } }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::path::Path;
use uuid::Uuid;

use crate::binding::Binding;
use crate::config::{Settings, WildcardTimeout};
use crate::convert::{
    BoolConverter, DateConverter, DatePartsConverter, DateTimeConverter, ListConverter,
    NullableConverter, ParseConverter, StringConverter, TypeConverter,
};
use crate::error::{BindError, BindResult, SchemaError, SchemaResult};
use crate::property::{Accessor, Property};

/// A complete binding declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingSchema {
    /// Version of the schema format
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub description: String,

    /// Wildcard budget for the name properties of this schema; the
    /// process-wide setting applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wildcard_timeout_ms: Option<u64>,

    pub properties: Vec<PropertySpec>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Value type of a declared property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Int,
    Float,
    Bool,
    Date,
    DateTime,
    Guid,
}

/// Column names of a date split over three columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateParts {
    pub year: String,
    pub month: String,
    pub day: String,
}

/// One declared property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,

    /// Fixed column position; takes precedence over aliases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    #[serde(rename = "type")]
    pub value_type: ValueType,

    /// Empty fields read as `null` instead of the type's default.
    #[serde(default)]
    pub nullable: bool,

    /// Unparsable fields fail instead of reading as the default.
    #[serde(default)]
    pub throwing: bool,

    /// strftime format for `date` / `datetime`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Turns the property into a list packed in one field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<char>,

    /// Date spread over three columns (`date` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<DateParts>,
}

impl PropertySpec {
    pub fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            name: name.to_string(),
            index: None,
            aliases: Vec::new(),
            value_type,
            nullable: false,
            throwing: false,
            format: None,
            separator: None,
            parts: None,
        }
    }

    pub fn at_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn throwing(mut self) -> Self {
        self.throwing = true;
        self
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = Some(separator);
        self
    }

    fn unsupported(&self, reason: &str) -> SchemaError {
        SchemaError::Unsupported {
            property: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

impl BindingSchema {
    pub fn new(properties: Vec<PropertySpec>) -> Self {
        Self {
            version: default_version(),
            description: String::new(),
            wildcard_timeout_ms: None,
            properties,
        }
    }

    pub fn from_json(json: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> SchemaResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn timeout(&self) -> WildcardTimeout {
        self.wildcard_timeout_ms
            .map(WildcardTimeout::from_millis)
            .unwrap_or_else(|| Settings::current().wildcard_timeout)
    }

    /// Build an unattached binding with one property per spec, in order.
    pub fn build(&self) -> SchemaResult<Binding> {
        let timeout = self.timeout();
        let mut binding = Binding::new();
        for spec in &self.properties {
            binding.add_boxed(build_property(spec, timeout)?)?;
        }
        tracing::debug!(properties = binding.len(), "built binding from schema");
        Ok(binding)
    }

    /// The current row of `binding` as a JSON object keyed by property name.
    pub fn row_to_json(&self, binding: &Binding) -> BindResult<Value> {
        let mut row = Map::new();
        for spec in &self.properties {
            let value = match spec.value_type {
                ValueType::String => read::<String>(binding, spec),
                ValueType::Int => read::<i64>(binding, spec),
                ValueType::Float => read::<f64>(binding, spec),
                ValueType::Bool => read::<bool>(binding, spec),
                ValueType::Date => read::<chrono::NaiveDate>(binding, spec),
                ValueType::DateTime => read::<chrono::NaiveDateTime>(binding, spec),
                ValueType::Guid => read::<Uuid>(binding, spec),
            }?;
            row.insert(spec.name.clone(), value);
        }
        Ok(Value::Object(row))
    }
}

/// Example schema for documentation and the CLI.
pub fn example_schema() -> BindingSchema {
    let mut released = PropertySpec::new("released", ValueType::Date);
    released.parts = Some(DateParts {
        year: "Year".to_string(),
        month: "Month".to_string(),
        day: "Day".to_string(),
    });

    BindingSchema {
        version: default_version(),
        description: "Example binding for a film catalogue".to_string(),
        wildcard_timeout_ms: Some(20),
        properties: vec![
            PropertySpec::new("id", ValueType::Int).at_index(0).throwing(),
            PropertySpec::new("title", ValueType::String)
                .with_alias("Title")
                .with_alias("Titre*"),
            PropertySpec::new("rating", ValueType::Float)
                .with_alias("Rating")
                .with_alias("Note")
                .nullable(),
            PropertySpec::new("tags", ValueType::String)
                .with_alias("Tags")
                .with_separator('|'),
            released,
        ],
    }
}

fn build_property(spec: &PropertySpec, timeout: WildcardTimeout) -> SchemaResult<Box<dyn Accessor>> {
    if spec.format.is_some() && !matches!(spec.value_type, ValueType::Date | ValueType::DateTime) {
        return Err(spec.unsupported("a format only applies to date and datetime"));
    }
    if let Some(parts) = &spec.parts {
        if spec.value_type != ValueType::Date {
            return Err(spec.unsupported("parts only apply to dates"));
        }
        if spec.nullable || spec.separator.is_some() {
            return Err(spec.unsupported("a date from parts cannot be nullable or a list"));
        }
        let columns = DatePartsConverter::columns_by_name(&parts.year, &parts.month, &parts.day)?;
        let converter = DatePartsConverter::new().with_throwing(spec.throwing);
        return Ok(Box::new(Property::composite(&spec.name, columns, converter)?));
    }

    match spec.value_type {
        ValueType::String => wrap(spec, timeout, StringConverter::new()),
        ValueType::Int => wrap(spec, timeout, ParseConverter::<i64>::new().with_throwing(spec.throwing)),
        ValueType::Float => wrap(spec, timeout, ParseConverter::<f64>::new().with_throwing(spec.throwing)),
        ValueType::Bool => wrap(spec, timeout, BoolConverter::new().with_throwing(spec.throwing)),
        ValueType::Date => {
            let mut converter = DateConverter::new().with_throwing(spec.throwing);
            if let Some(format) = &spec.format {
                converter = converter.with_format(format.as_str());
            }
            wrap(spec, timeout, converter)
        }
        ValueType::DateTime => {
            let mut converter = DateTimeConverter::new().with_throwing(spec.throwing);
            if let Some(format) = &spec.format {
                converter = converter.with_format(format.as_str());
            }
            wrap(spec, timeout, converter)
        }
        ValueType::Guid => wrap(spec, timeout, ParseConverter::<Uuid>::new().with_throwing(spec.throwing)),
    }
}

/// Apply the list and nullable options around an item converter.
fn wrap<T: Clone + Debug + 'static>(
    spec: &PropertySpec,
    timeout: WildcardTimeout,
    item: impl TypeConverter<T> + 'static,
) -> SchemaResult<Box<dyn Accessor>> {
    match (spec.separator, spec.nullable) {
        (None, false) => place(spec, timeout, item),
        (None, true) => place(spec, timeout, NullableConverter::new(item)),
        (Some(separator), false) => place(spec, timeout, ListConverter::new(item, separator)?),
        (Some(separator), true) => place(
            spec,
            timeout,
            NullableConverter::new(ListConverter::new(item, separator)?),
        ),
    }
}

/// Target the property at its index, or else at its aliases.
fn place<T: Clone + Debug + 'static>(
    spec: &PropertySpec,
    timeout: WildcardTimeout,
    converter: impl TypeConverter<T> + 'static,
) -> SchemaResult<Box<dyn Accessor>> {
    let property = match spec.index {
        Some(index) => Property::by_index(&spec.name, index, converter)?,
        None if !spec.aliases.is_empty() => {
            Property::by_name_with_timeout(&spec.name, &spec.aliases, timeout, converter)?
        }
        None => return Err(SchemaError::MissingTarget(spec.name.clone())),
    };
    Ok(Box::new(property))
}

/// Read a property with the shape its spec gives it and serialize it.
fn read<T: Serialize + 'static>(binding: &Binding, spec: &PropertySpec) -> BindResult<Value> {
    let name = spec.name.as_str();
    let value = match (spec.separator, spec.nullable) {
        (None, false) => serde_json::to_value(binding.get::<T>(name)?),
        (None, true) => serde_json::to_value(binding.get::<Option<T>>(name)?),
        (Some(_), false) => serde_json::to_value(binding.get::<Vec<T>>(name)?),
        (Some(_), true) => serde_json::to_value(binding.get::<Option<Vec<T>>>(name)?),
    };
    value.map_err(|e| BindError::Format(e.to_string()))
}
