//! csvbind CLI - bind CSV columns to typed properties
//!
//! ```bash
//! csvbind inspect input.csv                       # Encoding, delimiter, headers
//! csvbind dump input.csv --schema schema.json     # One JSON object per row
//! csvbind dump input.csv -s schema.json --display # name: value blocks
//! csvbind columns input.csv --schema schema.json  # Columns each property resolves to
//! csvbind example-schema                          # Print an example schema
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use clap::{Args, Parser, Subcommand};
use csvbind::config::Settings;
use csvbind::schema::{example_schema, BindingSchema};
use csvbind::source::{CsvSource, SourceOptions};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "csvbind")]
#[command(about = "Bind CSV columns to named, typed properties", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// CSV delimiter (auto-detect if not specified)
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Input encoding (auto-detect if not specified)
    #[arg(long)]
    encoding: Option<String>,

    /// The first row is data, columns are named Column1..ColumnN
    #[arg(long)]
    no_header: bool,

    /// Compare column names case-sensitively
    #[arg(long)]
    case_sensitive: bool,
}

impl SourceArgs {
    fn options(&self) -> SourceOptions {
        SourceOptions {
            delimiter: self.delimiter,
            encoding: self.encoding.clone(),
            has_headers: !self.no_header,
            case_sensitive: self.case_sensitive,
            reuse_record: false,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show encoding, delimiter and headers of a CSV file
    Inspect {
        /// Input CSV file
        input: PathBuf,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Read every row through a schema-built binding
    Dump {
        /// Input CSV file
        input: PathBuf,

        /// Binding schema (JSON)
        #[arg(short, long)]
        schema: PathBuf,

        /// Print `name: value` blocks instead of JSON
        #[arg(long)]
        display: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show the column indexes each schema property resolves to
    Columns {
        /// Input CSV file
        input: PathBuf,

        /// Binding schema (JSON)
        #[arg(short, long)]
        schema: PathBuf,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show an example binding schema
    ExampleSchema,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    Settings::from_env().install();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Inspect { input, source } => cmd_inspect(&input, &source.options()),

        Commands::Dump {
            input,
            schema,
            display,
            output,
            source,
        } => cmd_dump(&input, &schema, display, output.as_deref(), &source.options()),

        Commands::Columns {
            input,
            schema,
            source,
        } => cmd_columns(&input, &schema, &source.options()),

        Commands::ExampleSchema => cmd_example_schema(),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_inspect(input: &Path, options: &SourceOptions) -> Result<(), Box<dyn std::error::Error>> {
    let source = CsvSource::from_path(input, options)?;

    println!("📄 {}", input.display());
    println!("   Encoding: {}", source.encoding());
    println!(
        "   Delimiter: '{}'{}",
        format_delimiter(source.delimiter()),
        if options.delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    println!("   Rows: {}", source.len());
    println!("   Columns:");
    for (i, header) in source.headers().iter().enumerate() {
        println!("     [{}] {}", i, header);
    }
    Ok(())
}

fn cmd_dump(
    input: &Path,
    schema_path: &Path,
    display: bool,
    output: Option<&Path>,
    options: &SourceOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = BindingSchema::from_path(schema_path)?;
    let source = CsvSource::from_path(input, options)?;
    let mut binding = schema.build()?;
    eprintln!(
        "📄 {} rows, {} properties",
        source.len(),
        binding.len()
    );

    let mut rows: Vec<Value> = Vec::new();
    let mut blocks: Vec<String> = Vec::new();
    let mut row_number = 0;

    binding.for_each_record(source.records(), |row| {
        row_number += 1;
        if display {
            blocks.push(row.to_display_string());
        } else {
            let value = schema
                .row_to_json(row)
                .map_err(|e| format!("row {}: {}", row_number, e))?;
            rows.push(value);
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    let content = if display {
        blocks.join("\n\n")
    } else {
        serde_json::to_string_pretty(&rows)?
    };
    write_output(&content, output)?;

    eprintln!("✅ Bound {} rows", row_number);
    Ok(())
}

fn cmd_columns(
    input: &Path,
    schema_path: &Path,
    options: &SourceOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = BindingSchema::from_path(schema_path)?;
    let source = CsvSource::from_path(input, options)?;
    let mut binding = schema.build()?;
    binding.attach_record(Some(source.empty_record().into_shared()));

    let headers = source.headers();
    for property in binding.iter() {
        let indexes = property.column_indexes();
        if indexes.is_empty() {
            println!("  ⚠️  {} ({}): no column", property.name(), property.value_type());
            continue;
        }
        let columns: Vec<String> = indexes
            .iter()
            .map(|&i| format!("[{}] {}", i, headers.get(i).map(String::as_str).unwrap_or("?")))
            .collect();
        println!("  {} ({}): {}", property.name(), property.value_type(), columns.join(", "));
    }
    Ok(())
}

fn cmd_example_schema() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", example_schema().to_json()?);
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
