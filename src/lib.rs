// Disassembly Name Database - Core Library
// Merge engine, address rebasing, ordering and the versioned file format

pub mod error;
pub mod record;
pub mod address;
pub mod sort;
pub mod deduplication;
pub mod merge;
pub mod codec;
pub mod config;
pub mod database;
pub mod interchange;

// Re-export commonly used types
pub use error::{
    AddressError, AddressField, DatabaseError, FormatError, InterchangeError, MergeError,
};
pub use record::{Record, RecordKind};
pub use address::{
    format_address, parse_address, rebase, Rebaser, DEFAULT_REFERENCE_BASE,
};
pub use sort::sort_records;
pub use deduplication::{
    resolver_fn, DuplicateGroups, DuplicateKind, DuplicatePair,
    FnResolver, Resolution, ResolutionPolicy, Resolver,
};
pub use merge::{Classification, MergeEngine, MergeOutcome};
pub use codec::{
    decode, encode, DatabaseHeader, DecodedDatabase, ProductInfo, DATABASE_VERSION,
};
pub use config::{Config, StatusDefinition};
pub use database::{NameDatabase, NewEntry, RecordEdit};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
