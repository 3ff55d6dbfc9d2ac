//! CSV input with encoding and delimiter auto-detection.
//!
//! A [`CsvSource`] tokenizes the whole input up front and hands out
//! [`Record`]s that share one column layout and identifier, so name
//! properties resolve their columns once per source.

use std::path::Path;
use std::rc::Rc;

use crate::error::{SourceError, SourceResult};
use crate::record::{NameComparer, Record, SharedRecord};

/// Candidates tried by [`detect_delimiter`], in tie-break order.
pub const DELIMITER_CANDIDATES: [char; 4] = [';', ',', '\t', '|'];

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let (charset, confidence, _) = chardet::detect(bytes);
    tracing::debug!(%charset, confidence, "detected encoding");

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes with the given encoding label.
///
/// UTF-8 input is decoded lossily; other labels go through encoding_rs.
/// The latin1 labels decode as windows-1252, which agrees with ISO-8859-1
/// on every printable code point.
pub fn decode_content(bytes: &[u8], encoding: &str) -> SourceResult<String> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => Ok(String::from_utf8_lossy(bytes).into_owned()),
        "iso-8859-1" | "latin-1" | "latin1" => {
            Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned())
        }
        label => {
            let encoding = encoding_rs::Encoding::for_label(label.as_bytes())
                .ok_or_else(|| SourceError::Encoding(format!("unsupported encoding '{}'", label)))?;
            let (text, _, had_errors) = encoding.decode(bytes);
            if had_errors {
                tracing::warn!(encoding = label, "input contains undecodable bytes");
            }
            Ok(text.into_owned())
        }
    }
}

/// Detect the delimiter by counting candidates in the first line.
///
/// Falls back to `;` when no candidate appears.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best = DELIMITER_CANDIDATES[0];
    let mut best_count = 0;
    for &candidate in &DELIMITER_CANDIDATES {
        let count = first_line.matches(candidate).count();
        if count > best_count {
            best_count = count;
            best = candidate;
        }
    }
    best
}

// =============================================================================
// Source
// =============================================================================

/// How a CSV input is read.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Field delimiter; detected from the first line when `None`.
    pub delimiter: Option<char>,
    /// Encoding label; detected when `None`.
    pub encoding: Option<String>,
    /// Whether the first row names the columns. Without a header, columns
    /// are named `Column1` .. `ColumnN`.
    pub has_headers: bool,
    /// Compare column names case-sensitively.
    pub case_sensitive: bool,
    /// Hand out one record instance for every row instead of one per row.
    pub reuse_record: bool,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: None,
            has_headers: true,
            case_sensitive: false,
            reuse_record: false,
        }
    }
}

/// A fully tokenized CSV input.
#[derive(Debug)]
pub struct CsvSource {
    encoding: String,
    delimiter: char,
    template: Record,
    rows: Vec<Vec<String>>,
    reuse_record: bool,
}

impl CsvSource {
    pub fn from_path(path: impl AsRef<Path>, options: &SourceOptions) -> SourceResult<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes, options)
    }

    pub fn from_bytes(bytes: &[u8], options: &SourceOptions) -> SourceResult<Self> {
        let encoding = match &options.encoding {
            Some(label) => label.clone(),
            None => detect_encoding(bytes),
        };
        let content = decode_content(bytes, &encoding)?;
        Self::parse(&content, encoding, options)
    }

    /// Tokenize text that is already decoded.
    pub fn from_text(content: &str, options: &SourceOptions) -> SourceResult<Self> {
        Self::parse(content, "utf-8".to_string(), options)
    }

    fn parse(content: &str, encoding: String, options: &SourceOptions) -> SourceResult<Self> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let delimiter = options
            .delimiter
            .unwrap_or_else(|| detect_delimiter(content));
        if !delimiter.is_ascii() {
            return Err(SourceError::InvalidDelimiter(delimiter));
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter as u8)
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for result in reader.records() {
            let row = result?;
            rows.push(row.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let comparer = if options.case_sensitive {
            NameComparer::Ordinal
        } else {
            NameComparer::IgnoreCase
        };

        let template = if options.has_headers {
            if rows.is_empty() {
                return Err(SourceError::EmptyInput);
            }
            let headers = rows.remove(0);
            Record::new(headers.iter().map(|h| h.trim().to_string()), comparer)
        } else {
            let width = rows.iter().map(Vec::len).max().ok_or(SourceError::EmptyInput)?;
            Record::without_header(width, comparer)
        };

        tracing::info!(
            encoding = %encoding,
            delimiter = ?delimiter,
            columns = template.column_count(),
            rows = rows.len(),
            "loaded CSV source"
        );

        Ok(Self {
            encoding,
            delimiter,
            template,
            rows,
            reuse_record: options.reuse_record,
        })
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn headers(&self) -> &[String] {
        self.template.column_names()
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Empty record with this source's layout and identifier.
    pub fn empty_record(&self) -> Record {
        self.template.next_sibling()
    }

    /// Every data row as a record. Short rows are padded with empty fields,
    /// extra fields are dropped.
    pub fn records(&self) -> impl Iterator<Item = SharedRecord> + '_ {
        let reused = self
            .reuse_record
            .then(|| self.template.next_sibling().into_shared());

        self.rows.iter().map(move |row| match &reused {
            Some(record) => {
                record.borrow_mut().set_values(row.iter().cloned());
                Rc::clone(record)
            }
            None => {
                let mut record = self.template.next_sibling();
                record.set_values(row.iter().cloned());
                record.into_shared()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Binding;
    use crate::convert::{ParseConverter, StringConverter};
    use crate::error::BindError;
    use crate::property::Property;
    use std::io::Write;

    fn source(content: &str, options: SourceOptions) -> CsvSource {
        CsvSource::from_text(content, &options).unwrap()
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ';');
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        assert_eq!(decode_content(bytes, "iso-8859-1").unwrap(), "Société");
        assert_eq!(decode_content(bytes, "windows-1252").unwrap(), "Société");
    }

    #[test]
    fn test_latin1_keeps_currency_sign() {
        let bytes: &[u8] = &[0xA4, 0xBD, 0xBE];
        assert_eq!(decode_content(bytes, "latin1").unwrap(), "¤½¾");
        assert_eq!(decode_content(bytes, "iso-8859-15").unwrap(), "€œŸ");
    }

    #[test]
    fn test_unknown_encoding_rejected() {
        let err = decode_content(b"abc", "klingon").unwrap_err();
        assert!(matches!(err, SourceError::Encoding(_)));
    }

    #[test]
    fn test_headers_and_rows() {
        let src = source("name ; age\nAlice;30\nBob;25\n", SourceOptions::default());
        assert_eq!(src.delimiter(), ';');
        assert_eq!(src.headers(), &["name".to_string(), "age".to_string()]);
        assert_eq!(src.len(), 2);

        let values: Vec<Vec<String>> = src.records().map(|r| r.borrow().values().to_vec()).collect();
        assert_eq!(values[1], vec!["Bob", "25"]);
    }

    #[test]
    fn test_quoted_fields_and_ragged_rows() {
        let src = source(
            "a,b,c\n\"x, y\",2\n1,2,3,4\n",
            SourceOptions::default(),
        );
        let rows: Vec<Vec<String>> = src.records().map(|r| r.borrow().values().to_vec()).collect();
        assert_eq!(rows[0], vec!["x, y", "2", ""]);
        assert_eq!(rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_without_header() {
        let options = SourceOptions {
            has_headers: false,
            delimiter: Some(','),
            ..Default::default()
        };
        let src = source("1,2\n3,4,5\n", options);
        assert_eq!(src.headers(), &["Column1", "Column2", "Column3"]);
        assert_eq!(src.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let err = CsvSource::from_text("", &SourceOptions::default()).unwrap_err();
        assert!(matches!(err, SourceError::EmptyInput));

        let options = SourceOptions {
            has_headers: false,
            ..Default::default()
        };
        let err = CsvSource::from_text("", &options).unwrap_err();
        assert!(matches!(err, SourceError::EmptyInput));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let options = SourceOptions {
            delimiter: Some('§'),
            ..Default::default()
        };
        let err = CsvSource::from_text("a§b", &options).unwrap_err();
        assert!(matches!(err, SourceError::InvalidDelimiter('§')));
    }

    #[test]
    fn test_records_share_identifier() {
        let src = source("A;B\n1;2\n3;4\n", SourceOptions::default());
        let records: Vec<SharedRecord> = src.records().collect();
        assert!(!Rc::ptr_eq(&records[0], &records[1]));
        assert_eq!(records[0].borrow().identifier(), records[1].borrow().identifier());
        assert_eq!(records[0].borrow().field(0), Some("1"));
    }

    #[test]
    fn test_case_insensitive_names_by_default() {
        let src = source("Name;Age\nAda;36\n", SourceOptions::default());
        let mut binding = Binding::new();
        binding
            .add(Property::by_name("age", ["AGE"], ParseConverter::<u8>::new()).unwrap())
            .unwrap();
        binding.attach_record(src.records().next());
        assert_eq!(binding.get::<u8>("age").unwrap(), 36);

        let strict = source(
            "Name;Age\nAda;36\n",
            SourceOptions {
                case_sensitive: true,
                ..Default::default()
            },
        );
        binding.attach_record(strict.records().next());
        assert_eq!(binding.get::<u8>("age").unwrap(), 0);
    }

    #[test]
    fn test_reused_record_keeps_identity() {
        let options = SourceOptions {
            reuse_record: true,
            ..Default::default()
        };
        let src = source("A;B\n1;2\n3;4\n", options);

        let mut binding = Binding::new();
        binding
            .add(Property::by_name("b", ["B"], StringConverter::new()).unwrap())
            .unwrap();

        let mut first = None;
        let mut seen = Vec::new();
        binding
            .for_each_record(src.records(), |b| {
                let current = b.record().map(Rc::clone);
                if let (Some(first), Some(current)) = (&first, &current) {
                    assert!(Rc::ptr_eq(first, current));
                }
                first = first.take().or(current);
                seen.push(b.get::<String>("b")?);
                Ok::<(), BindError>(())
            })
            .unwrap();
        assert_eq!(seen, vec!["2", "4"]);
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"title,year\nCaf\xE9 Society,1999\n").unwrap();

        let options = SourceOptions {
            encoding: Some("iso-8859-1".to_string()),
            ..Default::default()
        };
        let src = CsvSource::from_path(file.path(), &options).unwrap();
        assert_eq!(src.delimiter(), ',');
        assert_eq!(src.encoding(), "iso-8859-1");
        let record = src.records().next().unwrap();
        assert_eq!(record.borrow().field(0), Some("Café Society"));
    }

    #[test]
    fn test_missing_file() {
        let err = CsvSource::from_path("/nonexistent/input.csv", &SourceOptions::default())
            .unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
