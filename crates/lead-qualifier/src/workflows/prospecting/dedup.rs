//! Exact-key deduplication of business records within a pass and across passes.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::domain::{Candidate, ScoredLead};

const INVISIBLE: [char; 5] = ['\u{feff}', '\u{200b}', '\u{200c}', '\u{200d}', '\u{2060}'];

/// Anything that names a business at an address.
pub trait BusinessIdentity {
    fn business_name(&self) -> &str;
    fn business_address(&self) -> &str;
}

impl BusinessIdentity for Candidate {
    fn business_name(&self) -> &str {
        &self.name
    }

    fn business_address(&self) -> &str {
        &self.address
    }
}

impl BusinessIdentity for ScoredLead {
    fn business_name(&self) -> &str {
        &self.candidate().name
    }

    fn business_address(&self) -> &str {
        &self.candidate().address
    }
}

/// Normalized (name, address) pair two records must share to be the same business.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DedupKey {
    name: String,
    address: String,
}

impl DedupKey {
    /// `None` when both components normalize to empty; such records are never deduplicated.
    pub fn of<T: BusinessIdentity + ?Sized>(record: &T) -> Option<Self> {
        let name = normalize_component(record.business_name());
        let address = normalize_component(record.business_address());
        if name.is_empty() && address.is_empty() {
            return None;
        }

        Some(Self { name, address })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

/// A record dropped as a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateRecord {
    /// Position in the input batch.
    pub index: usize,
    /// Position of the surviving record in the same batch; `None` when the business was
    /// admitted by an earlier pass.
    pub survivor_index: Option<usize>,
    pub key: DedupKey,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Deduplicated<T> {
    pub unique: Vec<T>,
    pub duplicates: Vec<DuplicateRecord>,
}

/// Single-pass deduplication: first occurrence in input order survives.
pub fn deduplicate<T: BusinessIdentity>(records: Vec<T>) -> Deduplicated<T> {
    Deduplicator::new().admit(records)
}

/// Remembers businesses across passes so later batches skip what was already processed.
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    known: HashSet<DedupKey>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_known<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = DedupKey>,
    {
        Self {
            known: keys.into_iter().collect(),
        }
    }

    /// Splits a batch into survivors and duplicates without recording anything.
    pub fn admit<T: BusinessIdentity>(&self, records: Vec<T>) -> Deduplicated<T> {
        let mut first_seen: HashMap<DedupKey, usize> = HashMap::new();
        let mut unique = Vec::with_capacity(records.len());
        let mut duplicates = Vec::new();

        for (index, record) in records.into_iter().enumerate() {
            let Some(key) = DedupKey::of(&record) else {
                unique.push(record);
                continue;
            };

            if self.known.contains(&key) {
                duplicates.push(DuplicateRecord {
                    index,
                    survivor_index: None,
                    key,
                });
                continue;
            }

            match first_seen.get(&key) {
                Some(&survivor) => duplicates.push(DuplicateRecord {
                    index,
                    survivor_index: Some(survivor),
                    key,
                }),
                None => {
                    first_seen.insert(key, index);
                    unique.push(record);
                }
            }
        }

        Deduplicated { unique, duplicates }
    }

    /// Records the keys of processed records; later `admit` calls will reject them.
    pub fn remember<'a, T, I>(&mut self, records: I)
    where
        T: BusinessIdentity + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        self.known
            .extend(records.into_iter().filter_map(|record| DedupKey::of(record)));
    }

    pub fn contains(&self, key: &DedupKey) -> bool {
        self.known.contains(key)
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

pub(crate) fn normalize_component(value: &str) -> String {
    let cleaned = value.replace(INVISIBLE, "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
