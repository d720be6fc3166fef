// 📤 Interchange - candidate batches in, sorted records out
// CSV (Category,Address,Name,Status,Comment) or a bare JSON record array.

use crate::config::Config;
use crate::error::InterchangeError;
use crate::record::Record;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;

pub type Result<T> = std::result::Result<T, InterchangeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
}

impl Format {
    /// Guess from the file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Format::Csv,
            _ => Format::Json,
        }
    }
}

impl FromStr for Format {
    type Err = InterchangeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            other => Err(InterchangeError::UnknownFormat(other.to_string())),
        }
    }
}

// ============================================================================
// IMPORT
// ============================================================================

/// CSV row before the status column is interpreted
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CsvRow {
    #[serde(default)]
    category: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    comment: String,
}

/// Read records from CSV. Status may be a code or a catalog label;
/// anything else fails the whole read.
pub fn read_csv<R: std::io::Read>(reader: R, config: &Config) -> Result<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);

    let headers = rdr.headers()?.clone();

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let raw: CsvRow = row.deserialize(Some(&headers))?;

        let status = if raw.status.trim().is_empty() {
            0
        } else {
            config
                .parse_status(&raw.status)
                .ok_or_else(|| InterchangeError::Status {
                    line,
                    value: raw.status.clone(),
                })?
        };

        records.push(Record::new(raw.category, raw.address, raw.name, status, raw.comment));
    }

    Ok(records)
}

pub fn read_json(text: &str) -> Result<Vec<Record>> {
    Ok(serde_json::from_str(text)?)
}

/// Load a candidate batch from a file
pub fn import_file(path: &Path, format: Format, config: &Config) -> Result<Vec<Record>> {
    match format {
        Format::Csv => read_csv(File::open(path)?, config),
        Format::Json => read_json(&fs::read_to_string(path)?),
    }
}

// ============================================================================
// EXPORT
// ============================================================================

pub fn write_csv<W: std::io::Write>(writer: W, records: &[Record]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_file(path: &Path, format: Format, records: &[Record]) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    match format {
        Format::Csv => write_csv(writer, records),
        Format::Json => Ok(serde_json::to_writer_pretty(writer, records)?),
    }
}

// ============================================================================
// TESTS
// ============================================================================
