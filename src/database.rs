// 🗄️ Name Database - the record set plus its file lifecycle
//
// Owns the records and the client version they were annotated against.
// Every structural mutation leaves the records in canonical order, so
// what is displayed and what is saved always agree.

use crate::address::Rebaser;
use crate::codec::{self, DatabaseHeader, ProductInfo};
use crate::config::Config;
use crate::deduplication::Resolver;
use crate::error::DatabaseError;
use crate::merge::{MergeEngine, MergeOutcome};
use crate::record::Record;
use crate::sort::sort_records;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

pub type Result<T> = std::result::Result<T, DatabaseError>;

// ============================================================================
// INPUTS
// ============================================================================

/// A record as the user types it: address is absolute, not yet rebased
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEntry {
    pub category: String,
    pub address: String,
    pub name: String,
    pub status: i32,
    pub comment: String,
}

/// Field edits for an existing record; `None` leaves the field alone.
/// Addresses are edited through `NameDatabase::set_address` because they need rebasing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordEdit {
    pub category: Option<String>,
    pub name: Option<String>,
    pub status: Option<i32>,
    pub comment: Option<String>,
}

// ============================================================================
// NAME DATABASE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameDatabase {
    records: Vec<Record>,
    client_version: String,
}

impl NameDatabase {
    /// Empty database for a client version
    pub fn new(client_version: impl Into<String>) -> Self {
        NameDatabase {
            records: Vec::new(),
            client_version: client_version.into(),
        }
    }

    /// Parse database text. On error nothing is constructed, so a caller's
    /// previously loaded database stays as it was.
    pub fn from_text(text: &str) -> Result<Self> {
        let decoded = codec::decode(text)?;
        Ok(NameDatabase {
            records: decoded.records,
            client_version: decoded.header.client_version,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;

        let db = Self::from_text(&text).map_err(|e| {
            warn!("Refusing to load {}: {}", path.display(), e);
            e
        })?;

        info!(
            "Loaded {} records from {} (client version {})",
            db.len(),
            path.display(),
            db.client_version
        );
        Ok(db)
    }

    /// Create a new, empty database file and load it back
    pub fn create<P: AsRef<Path>>(path: P, client_version: &str, product: &ProductInfo) -> Result<Self> {
        let path = path.as_ref();
        NameDatabase::new(client_version).save(path, product)?;
        Self::load(path)
    }

    pub fn to_text(&self, product: &ProductInfo) -> Result<String> {
        let header = DatabaseHeader::new(self.client_version.clone());
        codec::encode(&self.records, &header, product).map_err(DatabaseError::Encode)
    }

    /// Write the whole database, replacing the file
    pub fn save<P: AsRef<Path>>(&self, path: P, product: &ProductInfo) -> Result<()> {
        let path = path.as_ref();
        let text = self.to_text(product)?;
        fs::write(path, text)?;

        info!("Database saved to [{}] ({} records)", path.display(), self.len());
        Ok(())
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn client_version(&self) -> &str {
        &self.client_version
    }

    /// Distinct categories in display order, for auto-completion
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for record in &self.records {
            if !categories.contains(&record.category) {
                categories.push(record.category.clone());
            }
        }
        categories
    }

    /// Records in one category, with their indices
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = (usize, &'a Record)> + 'a {
        self.records
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.category == category)
    }

    // ========================================================================
    // MERGING
    // ========================================================================

    /// Reject malformed records and unknown status codes before merging
    pub fn validate_batch(batch: &[Record], config: &Config) -> Result<()> {
        for (index, record) in batch.iter().enumerate() {
            record
                .validate()
                .map_err(|reason| DatabaseError::InvalidRecord { index, reason })?;

            if !config.is_known_status(record.status) {
                return Err(DatabaseError::UnknownStatus(record.status));
            }
        }
        Ok(())
    }

    /// Merge an imported batch
    pub fn import(
        &mut self,
        batch: Vec<Record>,
        allow_metadata_update: bool,
        config: &Config,
        resolver: &mut dyn Resolver,
    ) -> Result<MergeOutcome> {
        Self::validate_batch(&batch, config)?;

        let engine = MergeEngine {
            allow_metadata_update,
        };
        let submitted = batch.len();
        let outcome = engine.merge(&mut self.records, batch, resolver)?;

        info!(
            "Merged {} records: {} added, {} updated, {} address duplicates, {} name duplicates",
            submitted,
            outcome.added,
            outcome.updated,
            outcome.address_duplicates(),
            outcome.name_duplicates()
        );
        Ok(outcome)
    }

    /// Add one entry typed by the user against a binary loaded at `base`
    pub fn submit(
        &mut self,
        entry: NewEntry,
        base: &str,
        config: &Config,
        resolver: &mut dyn Resolver,
    ) -> Result<MergeOutcome> {
        let address = config.rebaser()?.rebase_str(Some(base), &entry.address)?;
        debug!("Rebased {} against base {} → {}", entry.address, base, address);

        let record = Record::new(entry.category, address, entry.name, entry.status, entry.comment);
        self.import(vec![record], true, config, resolver)
    }

    /// Add (or update the comment of) a category header
    pub fn add_header(
        &mut self,
        category: &str,
        comment: &str,
        config: &Config,
        resolver: &mut dyn Resolver,
    ) -> Result<MergeOutcome> {
        self.import(vec![Record::header(category, comment)], true, config, resolver)
    }

    // ========================================================================
    // EDITING
    // ========================================================================

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.records.len() {
            Ok(())
        } else {
            Err(DatabaseError::IndexOutOfRange {
                index,
                len: self.records.len(),
            })
        }
    }

    /// Edit fields of the record at `index` in place, then re-sort.
    /// Edits bypass duplicate detection.
    pub fn edit(&mut self, index: usize, edit: RecordEdit, config: &Config) -> Result<&Record> {
        self.check_index(index)?;
        if let Some(status) = edit.status {
            if !config.is_known_status(status) {
                return Err(DatabaseError::UnknownStatus(status));
            }
        }

        let mut updated = self.records[index].clone();
        if let Some(category) = edit.category {
            updated.category = category;
        }
        if let Some(name) = edit.name {
            updated.name = name;
        }
        if let Some(status) = edit.status {
            updated.status = status;
        }
        if let Some(comment) = edit.comment {
            updated.comment = comment;
        }
        updated
            .validate()
            .map_err(|reason| DatabaseError::InvalidRecord { index, reason })?;

        self.records[index] = updated;
        Ok(self.resort_tracking(index))
    }

    /// Re-enter the address of the record at `index`, relative to `base`
    pub fn set_address(&mut self, index: usize, base: &str, address: &str, rebaser: &Rebaser) -> Result<&Record> {
        self.check_index(index)?;
        if self.records[index].is_header() {
            return Err(DatabaseError::InvalidRecord {
                index,
                reason: "category headers have no address".to_string(),
            });
        }

        // Validation failure leaves the record untouched
        let rebased = rebaser.rebase_str(Some(base), address)?;
        self.records[index].address = rebased;
        Ok(self.resort_tracking(index))
    }

    pub fn delete(&mut self, index: usize) -> Result<Record> {
        self.check_index(index)?;
        let removed = self.records.remove(index);
        debug!("Deleted {} {}", removed.address, removed.name);
        Ok(removed)
    }

    /// Sort and return the record that was at `index` before sorting
    fn resort_tracking(&mut self, index: usize) -> &Record {
        let target = self.records[index].clone();
        sort_records(&mut self.records);

        // Equal records are interchangeable, so any position holding one will do
        let position = self
            .records
            .iter()
            .position(|r| *r == target)
            .unwrap_or(index);
        &self.records[position]
    }
}

// ============================================================================
// TESTS
// ============================================================================
