// 🔍 Deduplication Resolver - the decision point for colliding records
//
// The merge engine never decides what to keep when an incoming record
// collides with an existing one on address or name alone. It hands the
// paired groups to a Resolver and either gets back the records to add,
// or a cancellation that aborts the whole merge.

use crate::record::Record;
use serde::{Deserialize, Serialize};

// ============================================================================
// DUPLICATE GROUPS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateKind {
    /// Same address, different name
    Address,

    /// Same name, different address
    Name,
}

impl DuplicateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateKind::Address => "Address",
            DuplicateKind::Name => "Name",
        }
    }
}

/// An incoming record together with the existing record it collided with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatePair {
    pub incoming: Record,
    pub existing: Record,
}

/// Collisions keyed by what collided, in classification order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroups {
    pub address: Vec<DuplicatePair>,
    pub name: Vec<DuplicatePair>,
}

impl DuplicateGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: DuplicateKind, incoming: Record, existing: Record) {
        let pair = DuplicatePair { incoming, existing };
        match kind {
            DuplicateKind::Address => self.address.push(pair),
            DuplicateKind::Name => self.name.push(pair),
        }
    }

    pub fn group(&self, kind: DuplicateKind) -> &[DuplicatePair] {
        match kind {
            DuplicateKind::Address => &self.address,
            DuplicateKind::Name => &self.name,
        }
    }

    /// Incoming side of one group
    pub fn incoming(&self, kind: DuplicateKind) -> Vec<&Record> {
        self.group(kind).iter().map(|p| &p.incoming).collect()
    }

    /// Existing side of one group, parallel to `incoming`
    pub fn existing(&self, kind: DuplicateKind) -> Vec<&Record> {
        self.group(kind).iter().map(|p| &p.existing).collect()
    }

    /// Every pair, address group first
    pub fn pairs(&self) -> impl Iterator<Item = (DuplicateKind, &DuplicatePair)> {
        self.address
            .iter()
            .map(|p| (DuplicateKind::Address, p))
            .chain(self.name.iter().map(|p| (DuplicateKind::Name, p)))
    }

    pub fn len(&self) -> usize {
        self.address.len() + self.name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_empty() && self.name.is_empty()
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Records to add back to the database (caller confirmed)
    Approved(Vec<Record>),

    /// Abort the merge
    Cancelled,
}

/// Turns duplicate groups into a final decision. Called synchronously.
pub trait Resolver {
    fn resolve(&mut self, groups: &DuplicateGroups) -> Resolution;
}

/// Adapter so a closure can act as a resolver
pub struct FnResolver<F>(pub F);

impl<F> Resolver for FnResolver<F>
where
    F: FnMut(&DuplicateGroups) -> Resolution,
{
    fn resolve(&mut self, groups: &DuplicateGroups) -> Resolution {
        (self.0)(groups)
    }
}

pub fn resolver_fn<F>(f: F) -> FnResolver<F>
where
    F: FnMut(&DuplicateGroups) -> Resolution,
{
    FnResolver(f)
}

// ============================================================================
// STOCK POLICIES
// ============================================================================

/// Non-interactive resolution policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionPolicy {
    /// Replace the existing records with the incoming ones
    KeepIncoming,

    /// Drop the incoming records, restore the existing ones
    KeepExisting,

    /// Keep existing and incoming side by side
    KeepBoth,

    /// Cancel the merge
    Abort,
}

impl ResolutionPolicy {
    pub fn apply(&self, groups: &DuplicateGroups) -> Resolution {
        match self {
            ResolutionPolicy::KeepIncoming => Resolution::Approved(incoming_records(groups)),
            ResolutionPolicy::KeepExisting => Resolution::Approved(existing_records(groups)),
            ResolutionPolicy::KeepBoth => {
                let mut records = existing_records(groups);
                records.extend(incoming_records(groups));
                Resolution::Approved(records)
            }
            ResolutionPolicy::Abort => Resolution::Cancelled,
        }
    }
}

impl Resolver for ResolutionPolicy {
    fn resolve(&mut self, groups: &DuplicateGroups) -> Resolution {
        self.apply(groups)
    }
}

fn incoming_records(groups: &DuplicateGroups) -> Vec<Record> {
    groups.pairs().map(|(_, p)| p.incoming.clone()).collect()
}

/// One existing record can collide with several incoming ones; restore it once
fn existing_records(groups: &DuplicateGroups) -> Vec<Record> {
    let mut records: Vec<Record> = Vec::new();
    for (_, pair) in groups.pairs() {
        if !records.contains(&pair.existing) {
            records.push(pair.existing.clone());
        }
    }
    records
}

// ============================================================================
// TESTS
// ============================================================================
