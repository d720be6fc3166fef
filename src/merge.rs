// 🔀 Merge Engine - combine an incoming batch with the current record set
//
// Each incoming record is classified against the current records, first
// match in current order wins:
//
//   1. Same address AND name (updates allowed) → metadata update in place
//      (category headers only match a header of the same category, and
//      only their comment is overwritten)
//   2. Same address                            → address duplicate
//   3. Same name                               → name duplicate
//   4. Nothing                                 → new record
//
// Duplicates replace the existing record they collided with, pending a
// Resolver decision. Cancelling the resolver aborts every addition and
// removal, but metadata updates from step 1 stay applied.

use crate::deduplication::{DuplicateGroups, DuplicateKind, Resolution, Resolver};
use crate::error::MergeError;
use crate::record::Record;
use crate::sort::sort_records;
use std::collections::{HashMap, HashSet};

// ============================================================================
// CLASSIFICATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Overwrite metadata of the existing record at this index
    MetadataUpdate(usize),

    /// Collides with the existing record at this index
    Duplicate(DuplicateKind, usize),

    New,
}

/// First index of each key in the current set
struct RecordIndex<'a> {
    by_address: HashMap<&'a str, usize>,
    by_name: HashMap<&'a str, usize>,
    headers: HashMap<&'a str, usize>,
}

impl<'a> RecordIndex<'a> {
    fn build(records: &'a [Record]) -> Self {
        let mut index = RecordIndex {
            by_address: HashMap::with_capacity(records.len()),
            by_name: HashMap::with_capacity(records.len()),
            headers: HashMap::new(),
        };

        for (i, record) in records.iter().enumerate() {
            if record.is_header() {
                index.headers.entry(record.category.as_str()).or_insert(i);
            } else {
                index.by_address.entry(record.address.as_str()).or_insert(i);
                index.by_name.entry(record.name.as_str()).or_insert(i);
            }
        }

        index
    }

    /// Earliest current record sharing the address or the name
    fn first_collision(&self, incoming: &Record) -> Option<usize> {
        let by_address = self.by_address.get(incoming.address.as_str()).copied();
        let by_name = self.by_name.get(incoming.name.as_str()).copied();

        match (by_address, by_name) {
            (Some(a), Some(n)) => Some(a.min(n)),
            (a, n) => a.or(n),
        }
    }
}

// ============================================================================
// MERGE OUTCOME
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// New records plus records approved by the resolver
    pub added: usize,

    /// Existing records whose metadata was overwritten
    pub updated: usize,

    /// Existing records replaced pending resolution
    pub removed: usize,

    /// Collisions that were handed to the resolver
    pub duplicates: DuplicateGroups,
}

impl MergeOutcome {
    pub fn address_duplicates(&self) -> usize {
        self.duplicates.address.len()
    }

    pub fn name_duplicates(&self) -> usize {
        self.duplicates.name.len()
    }
}

// ============================================================================
// MERGE ENGINE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeEngine {
    /// Treat exact (address, name) matches as metadata updates.
    /// When false they are reported as address duplicates instead.
    pub allow_metadata_update: bool,
}

impl MergeEngine {
    pub fn new() -> Self {
        MergeEngine {
            allow_metadata_update: true,
        }
    }

    pub fn without_metadata_updates() -> Self {
        MergeEngine {
            allow_metadata_update: false,
        }
    }

    /// Classify every incoming record against `current` without mutating anything
    pub fn classify(&self, current: &[Record], incoming: &[Record]) -> Vec<Classification> {
        let index = RecordIndex::build(current);
        incoming
            .iter()
            .map(|record| self.classify_one(&index, current, record))
            .collect()
    }

    fn classify_one(&self, index: &RecordIndex<'_>, current: &[Record], incoming: &Record) -> Classification {
        if incoming.is_header() {
            // Headers are never duplicates across categories
            return match index.headers.get(incoming.category.as_str()) {
                Some(&i) if self.allow_metadata_update => Classification::MetadataUpdate(i),
                Some(&i) => Classification::Duplicate(DuplicateKind::Address, i),
                None => Classification::New,
            };
        }

        let Some(i) = index.first_collision(incoming) else {
            return Classification::New;
        };

        let existing = &current[i];
        let same_address = existing.address == incoming.address;
        let same_name = existing.name == incoming.name;

        if same_address && same_name && self.allow_metadata_update {
            Classification::MetadataUpdate(i)
        } else if same_address {
            Classification::Duplicate(DuplicateKind::Address, i)
        } else {
            Classification::Duplicate(DuplicateKind::Name, i)
        }
    }

    /// Merge `incoming` into `current`, consulting `resolver` for collisions.
    ///
    /// On success `current` holds the surviving records, the new records and
    /// the resolver's approved records, in canonical order.
    pub fn merge(
        &self,
        current: &mut Vec<Record>,
        incoming: Vec<Record>,
        resolver: &mut dyn Resolver,
    ) -> Result<MergeOutcome, MergeError> {
        let plan = self.classify(current, &incoming);

        let mut outcome = MergeOutcome::default();
        let mut removals: HashSet<usize> = HashSet::new();
        let mut new_records: Vec<Record> = Vec::new();

        for (record, classification) in incoming.into_iter().zip(plan) {
            match classification {
                Classification::MetadataUpdate(i) => {
                    // A header's category is its identity; only the comment is metadata
                    if record.is_header() {
                        current[i].comment = record.comment;
                    } else {
                        current[i].apply_metadata(&record);
                    }
                    outcome.updated += 1;
                }
                Classification::Duplicate(kind, i) => {
                    outcome.duplicates.push(kind, record, current[i].clone());
                    removals.insert(i);
                }
                Classification::New => new_records.push(record),
            }
        }

        if !outcome.duplicates.is_empty() {
            match resolver.resolve(&outcome.duplicates) {
                Resolution::Approved(resolved) => new_records.extend(resolved),
                Resolution::Cancelled => {
                    return Err(MergeError::Cancelled {
                        metadata_updates: outcome.updated,
                    });
                }
            }
        }

        if !removals.is_empty() {
            let mut position = 0;
            current.retain(|_| {
                let keep = !removals.contains(&position);
                position += 1;
                keep
            });
        }

        outcome.removed = removals.len();
        outcome.added = new_records.len();
        current.extend(new_records);
        sort_records(current);

        Ok(outcome)
    }
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deduplication::{resolver_fn, ResolutionPolicy};
    use std::collections::HashSet;

    fn entry(category: &str, address: &str, name: &str, status: i32, comment: &str) -> Record {
        Record::new(category, address, name, status, comment)
    }

    fn no_resolver() -> impl Resolver {
        resolver_fn(|_: &DuplicateGroups| -> Resolution { panic!("resolver should not be invoked") })
    }

    #[test]
    fn test_metadata_update_scenario() {
        let engine = MergeEngine::new();
        let mut current = vec![entry("UI", "0x10", "Foo", 0, "")];
        let incoming = vec![entry("UI2", "0x10", "Foo", 1, "x")];

        let outcome = engine.merge(&mut current, incoming, &mut no_resolver()).unwrap();

        assert_eq!(current, vec![entry("UI2", "0x10", "Foo", 1, "x")]);
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.added, 0);
        assert!(outcome.duplicates.is_empty());
    }

    #[test]
    fn test_exact_matches_never_change_count() {
        let engine = MergeEngine::new();
        let mut current = vec![
            entry("A", "0x10", "Foo", 0, ""),
            entry("A", "0x20", "Bar", 0, ""),
            Record::header("A", "group a"),
        ];
        let incoming = vec![
            entry("B", "0x20", "Bar", 2, "bar"),
            Record::header("A", "renamed group"),
            entry("C", "0x10", "Foo", 1, "foo"),
        ];

        let outcome = engine.merge(&mut current, incoming, &mut no_resolver()).unwrap();

        assert_eq!(current.len(), 3);
        assert_eq!(outcome.updated, 3);
        assert!(current.contains(&entry("C", "0x10", "Foo", 1, "foo")));
        assert!(current.contains(&entry("B", "0x20", "Bar", 2, "bar")));
        assert!(current.contains(&Record::header("A", "renamed group")));
    }

    #[test]
    fn test_address_duplicate_scenario() {
        let engine = MergeEngine::new();
        let mut current = vec![entry("UI", "0x10", "Foo", 0, "")];
        let incoming = vec![entry("UI", "0x10", "Bar", 0, "")];

        let mut seen = None;
        let mut resolver = resolver_fn(|groups: &DuplicateGroups| {
            seen = Some(groups.clone());
            ResolutionPolicy::KeepIncoming.apply(groups)
        });
        let outcome = engine.merge(&mut current, incoming, &mut resolver).unwrap();
        drop(resolver);

        let groups = seen.expect("resolver invoked");
        assert_eq!(groups.address.len(), 1);
        assert!(groups.name.is_empty());
        assert_eq!(groups.address[0].incoming.name, "Bar");
        assert_eq!(groups.address[0].existing.name, "Foo");

        assert_eq!(current, vec![entry("UI", "0x10", "Bar", 0, "")]);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.address_duplicates(), 1);
    }

    #[test]
    fn test_name_duplicate() {
        let engine = MergeEngine::new();
        let mut current = vec![entry("UI", "0x10", "Foo", 0, "")];
        let incoming = vec![entry("UI", "0x30", "Foo", 0, "")];

        let outcome = engine
            .merge(&mut current, incoming, &mut ResolutionPolicy::KeepExisting)
            .unwrap();

        assert_eq!(outcome.name_duplicates(), 1);
        assert_eq!(current, vec![entry("UI", "0x10", "Foo", 0, "")]);
    }

    #[test]
    fn test_first_match_in_current_order_wins() {
        let engine = MergeEngine::new();
        // Name match comes before the address match in current order
        let current = vec![entry("A", "0x50", "Foo", 0, ""), entry("A", "0x10", "Foo2", 0, "")];
        let incoming = vec![entry("A", "0x10", "Foo", 0, "")];

        let plan = engine.classify(&current, &incoming);
        assert_eq!(plan, vec![Classification::Duplicate(DuplicateKind::Name, 0)]);
    }

    #[test]
    fn test_exact_match_without_updates_is_address_duplicate() {
        let engine = MergeEngine::without_metadata_updates();
        let current = vec![entry("A", "0x10", "Foo", 0, "")];
        let incoming = vec![entry("B", "0x10", "Foo", 1, "")];

        let plan = engine.classify(&current, &incoming);
        assert_eq!(plan, vec![Classification::Duplicate(DuplicateKind::Address, 0)]);
    }

    #[test]
    fn test_headers_without_updates() {
        let engine = MergeEngine::without_metadata_updates();
        let current = vec![Record::header("UI", "old")];
        let incoming = vec![Record::header("UI", "new"), Record::header("Net", "new")];

        let plan = engine.classify(&current, &incoming);
        assert_eq!(
            plan,
            vec![Classification::Duplicate(DuplicateKind::Address, 0), Classification::New]
        );
    }

    #[test]
    fn test_header_update_only_touches_comment() {
        let engine = MergeEngine::new();
        let mut current = vec![Record::header("UI", "old")];
        let incoming = vec![entry("UI", "", "", 2, "new")];

        let outcome = engine.merge(&mut current, incoming, &mut no_resolver()).unwrap();

        assert_eq!(outcome.updated, 1);
        assert_eq!(current, vec![entry("UI", "", "", 0, "new")]);
    }

    #[test]
    fn test_header_of_other_category_is_new() {
        let engine = MergeEngine::new();
        let mut current = vec![Record::header("UI", "ui"), entry("UI", "0x10", "Foo", 0, "")];
        let incoming = vec![Record::header("Net", "network")];

        let outcome = engine.merge(&mut current, incoming, &mut no_resolver()).unwrap();

        assert_eq!(outcome.added, 1);
        assert_eq!(current.len(), 3);
        assert_eq!(current[0], Record::header("Net", "network"));
    }

    #[test]
    fn test_no_overlap_adds_whole_batch() {
        let engine = MergeEngine::new();
        let mut current = vec![entry("A", "0x10", "Foo", 0, ""), entry("A", "0x20", "Bar", 0, "")];
        let incoming = vec![
            entry("B", "0x30", "Baz", 0, ""),
            entry("B", "0x40", "Qux", 0, ""),
            entry("B", "0x5", "Quux", 0, ""),
        ];

        let outcome = engine.merge(&mut current, incoming, &mut no_resolver()).unwrap();

        assert_eq!(outcome.added, 3);
        assert_eq!(current.len(), 5);
        let pairs: HashSet<(&str, &str)> = current
            .iter()
            .map(|r| (r.address.as_str(), r.name.as_str()))
            .collect();
        assert_eq!(pairs.len(), 5);
        assert_eq!(current[0].name, "Quux");
    }

    #[test]
    fn test_cancel_keeps_metadata_updates_only() {
        let engine = MergeEngine::new();
        let mut current = vec![entry("A", "0x10", "Foo", 0, ""), entry("A", "0x20", "Bar", 0, "")];
        let incoming = vec![
            entry("B", "0x10", "Foo", 1, "updated"),
            entry("A", "0x20", "Renamed", 0, ""),
            entry("A", "0x30", "Fresh", 0, ""),
        ];

        let err = engine
            .merge(&mut current, incoming, &mut ResolutionPolicy::Abort)
            .unwrap_err();

        assert_eq!(err, MergeError::Cancelled { metadata_updates: 1 });
        assert_eq!(
            current,
            vec![entry("B", "0x10", "Foo", 1, "updated"), entry("A", "0x20", "Bar", 0, "")]
        );
    }

    #[test]
    fn test_existing_hit_twice_is_removed_once() {
        let engine = MergeEngine::new();
        let mut current = vec![entry("A", "0x10", "Foo", 0, ""), entry("A", "0x90", "Keep", 0, "")];
        let incoming = vec![entry("A", "0x10", "Bar", 0, ""), entry("A", "0x40", "Foo", 0, "")];

        let outcome = engine
            .merge(&mut current, incoming, &mut ResolutionPolicy::KeepBoth)
            .unwrap();

        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.duplicates.len(), 2);
        // Foo restored once, plus both incoming, plus the untouched record
        assert_eq!(current.len(), 4);
        assert_eq!(current.iter().filter(|r| r.name == "Foo").count(), 2);
    }

    #[test]
    fn test_result_is_sorted() {
        let engine = MergeEngine::new();
        let mut current = vec![entry("A", "0x100", "Late", 0, "")];
        let incoming = vec![entry("A", "0x1", "Early", 0, "")];

        engine.merge(&mut current, incoming, &mut no_resolver()).unwrap();
        assert_eq!(current[0].name, "Early");
    }
}
