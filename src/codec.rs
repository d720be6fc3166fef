// 💾 Codec - versioned text format for the name database
//
// Layout:
//   // Version #1
//   // Firefall DISASM Name Manager Database
//   // FirefallClient.exe V<client version>
//   [ { "Category": ..., "Address": ..., "Name": ..., "Status": ..., "Comment": ... }, ... ]
//
// The three header lines are strict; the JSON body is not.

use crate::config::Config;
use crate::error::FormatError;
use crate::record::Record;
use crate::sort::sort_records;

/// Only schema version this build reads and writes
pub const DATABASE_VERSION: u32 = 1;

const VERSION_MARKER: &str = "// Version #";

// ============================================================================
// HEADER
// ============================================================================

/// Product strings written on lines 2 and 3
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInfo {
    pub banner: String,
    pub executable: String,
}

impl ProductInfo {
    pub fn from_config(config: &Config) -> Self {
        ProductInfo {
            banner: config.product_banner.clone(),
            executable: config.client_executable.clone(),
        }
    }
}

impl Default for ProductInfo {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseHeader {
    pub schema_version: u32,
    pub client_version: String,
}

impl DatabaseHeader {
    pub fn new(client_version: impl Into<String>) -> Self {
        DatabaseHeader {
            schema_version: DATABASE_VERSION,
            client_version: client_version.into(),
        }
    }
}

/// Result of reading a database file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedDatabase {
    pub header: DatabaseHeader,
    pub records: Vec<Record>,
}

// ============================================================================
// ENCODE
// ============================================================================

pub fn encode(
    records: &[Record],
    header: &DatabaseHeader,
    product: &ProductInfo,
) -> Result<String, serde_json::Error> {
    let body = serde_json::to_string_pretty(records)?;

    let mut text = String::with_capacity(body.len() + 128);
    text.push_str(&format!("{}{}\n", VERSION_MARKER, header.schema_version));
    text.push_str(&format!("// {}\n", product.banner));
    text.push_str(&format!("// {} V{}\n", product.executable, header.client_version));
    text.push_str(&body);
    text.push('\n');

    Ok(text)
}

// ============================================================================
// DECODE
// ============================================================================

fn parse_version(line: &str) -> Result<u32, FormatError> {
    line.strip_prefix(VERSION_MARKER)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .ok_or(FormatError::MissingVersion)
}

/// `// <executable> V<client version>` → client version
fn parse_client_version(line: Option<&str>) -> Result<String, FormatError> {
    line.and_then(|l| l.strip_prefix("// "))
        .and_then(|l| l.split_once(" V"))
        .filter(|(executable, _)| !executable.trim().is_empty())
        .map(|(_, version)| version.trim().to_string())
        .filter(|version| !version.is_empty())
        .ok_or(FormatError::MissingClientVersion)
}

/// Parse a database file. Records come back in canonical order.
pub fn decode(text: &str) -> Result<DecodedDatabase, FormatError> {
    // Handles both \n and \r\n
    let lines: Vec<&str> = text.lines().collect();

    let first = lines.first().ok_or(FormatError::Empty)?;
    let schema_version = parse_version(first)?;

    let client_version = match schema_version {
        1 => parse_client_version(lines.get(2).copied())?,
        other => return Err(FormatError::UnsupportedVersion(other)),
    };

    let body = lines.get(3..).map(|rest| rest.join("\n")).unwrap_or_default();
    let mut records: Vec<Record> = if body.trim().is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&body)?
    };
    sort_records(&mut records);

    Ok(DecodedDatabase {
        header: DatabaseHeader {
            schema_version,
            client_version,
        },
        records,
    })
}

// ============================================================================
// TESTS
// ============================================================================
