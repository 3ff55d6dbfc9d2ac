//! # csvbind - typed properties over CSV records
//!
//! csvbind maps the text fields of CSV records onto named, typed properties
//! and converts values in both directions.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Source    │────▶│   Binding   │────▶│ Typed values│
//! │  (ISO/UTF8) │     │  (records)  │     │ (properties)│     │  (get/set)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use csvbind::{BindingBuilder, CsvSource, ParseConverter, SourceOptions, StringConverter};
//!
//! let source = CsvSource::from_text("Id;Name\n1;Ada\n2;Grace\n", &SourceOptions::default())?;
//!
//! let mut builder = BindingBuilder::new();
//! builder
//!     .add_name("id", ["ID"], ParseConverter::<u32>::new())?
//!     .add_name("name", ["Name", "Full*"], StringConverter::new())?;
//! let mut binding = builder.build();
//!
//! let mut names = Vec::new();
//! binding.for_each_record(source.records(), |row| {
//!     names.push(format!("{}={}", row.get::<u32>("id")?, row.get::<String>("name")?));
//!     Ok::<(), csvbind::BindError>(())
//! })?;
//! assert_eq!(names, ["1=Ada", "2=Grace"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Constants and process-wide settings
//! - [`record`] - CSV records and column-name comparison
//! - [`convert`] - Text <-> value converters and adapters
//! - [`property`] - Index, name and composite properties
//! - [`binding`] - Property collections, builder and row cursor
//! - [`source`] - CSV input with auto-detection
//! - [`schema`] - JSON binding schemas

// Core modules
pub mod config;
pub mod error;
pub mod record;

// Conversion
pub mod convert;

// Properties and bindings
pub mod binding;
pub mod property;

// Input
pub mod schema;
pub mod source;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{BindError, BindResult, Error, Result, SchemaError, SourceError};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{Settings, WildcardTimeout};

// =============================================================================
// Re-exports - Records
// =============================================================================

pub use record::{NameComparer, Record, SharedRecord};

// =============================================================================
// Re-exports - Converters
// =============================================================================

pub use convert::{
    BoolConverter, DateConverter, DatePartsConverter, DateTimeConverter, DbValue, ListConverter,
    MultiColumnConverter, NullValue, NullableConverter, ParseConverter, SentinelConverter,
    StringConverter, TypeConverter,
};

// =============================================================================
// Re-exports - Properties and bindings
// =============================================================================

pub use binding::{Binding, BindingBuilder, PropertyKey, RowCursor};
pub use property::{Accessor, Property};

// =============================================================================
// Re-exports - Source and schema
// =============================================================================

pub use schema::{BindingSchema, PropertySpec, ValueType};
pub use source::{detect_delimiter, detect_encoding, decode_content, CsvSource, SourceOptions};
