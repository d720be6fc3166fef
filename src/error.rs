// ❗ Error taxonomy
// Every failure the core can produce is surfaced as a typed value; nothing is logged here.

use thiserror::Error;

// ============================================================================
// ADDRESS ERRORS
// ============================================================================

/// Which user-supplied address failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    Address,
    BaseAddress,
}

impl AddressField {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressField::Address => "Address",
            AddressField::BaseAddress => "Base Address",
        }
    }
}

impl std::fmt::Display for AddressField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Malformed address string; the caller re-prompts
    #[error("{field} is invalid: {value:?}. Please enter a valid address offset in the format 0x########")]
    Invalid { field: AddressField, value: String },

    /// Rebasing requested without a base address
    #[error("No base address specified")]
    NoBaseAddress,
}

// ============================================================================
// FORMAT ERRORS
// ============================================================================

/// Unrecognized or corrupt database file; fatal to the load
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Invalid database format: file is empty")]
    Empty,

    #[error("Invalid database format: missing version marker on line 1")]
    MissingVersion,

    #[error("Unsupported database version #{0}")]
    UnsupportedVersion(u32),

    #[error("Invalid database format: missing client version marker on line 3")]
    MissingClientVersion,

    #[error("Invalid database body: {0}")]
    Body(#[from] serde_json::Error),
}

// ============================================================================
// MERGE ERRORS
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// Duplicate resolution was cancelled. Metadata updates applied before
    /// the resolver ran are NOT rolled back.
    #[error("Deduplication was cancelled; no records were added or removed ({metadata_updates} metadata updates were already applied)")]
    Cancelled { metadata_updates: usize },
}

// ============================================================================
// DATABASE ERRORS
// ============================================================================

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode database: {0}")]
    Encode(#[source] serde_json::Error),

    /// Record is neither a normal entry nor a category header
    #[error("Invalid record at position {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("Unknown status code {0}")]
    UnknownStatus(i32),

    #[error("No record at index {index} (database has {len} records)")]
    IndexOutOfRange { index: usize, len: usize },
}

// ============================================================================
// INTERCHANGE ERRORS
// ============================================================================

#[derive(Error, Debug)]
pub enum InterchangeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid status {value:?} on line {line}")]
    Status { line: u64, value: String },

    #[error("Unknown interchange format {0:?} (expected csv or json)")]
    UnknownFormat(String),
}
