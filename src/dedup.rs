// Deduplicator - one representative per distinct business key
// Partition rows by the full business key, rank 1..n within each partition in
// input order, keep only rank 1.

use crate::record::{RawRecord, Staged};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One group of rows sharing a business key, reported to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Business-key hash shared by the group
    pub key_hash: String,

    /// Input index of the row that was kept (rank 1)
    pub kept_index: usize,

    /// How many copies were discarded (group size minus one)
    pub discarded: usize,

    /// Company name of the kept row, for human-readable summaries
    pub company: String,
}

/// Result of a deduplication pass.
#[derive(Debug)]
pub struct DedupOutcome {
    /// Surviving rows, each tagged with its partition rank (always 1 here;
    /// the rank travels with the row until the Projector strips it)
    pub records: Vec<Staged<RawRecord>>,

    /// Groups that actually contained more than one row
    pub duplicate_groups: Vec<DuplicateGroup>,
}

pub struct Deduplicator;

impl Deduplicator {
    /// Filter the working copy down to one row per business key.
    ///
    /// The first occurrence in input order survives. Which copy survives is
    /// not part of the contract (copies are identical across the full key);
    /// uniqueness is. A null field matches a null field in the same position,
    /// so rows that differ only in which fields are missing stay distinct.
    /// Pure filter: an empty input produces an empty output.
    pub fn dedupe(records: Vec<RawRecord>) -> DedupOutcome {
        let mut next_rank: HashMap<String, u32> = HashMap::new();
        let mut groups: HashMap<String, DuplicateGroup> = HashMap::new();
        let mut kept = Vec::with_capacity(records.len());

        for (index, record) in records.into_iter().enumerate() {
            let hash = record.business_key_hash();
            let rank = next_rank.entry(hash.clone()).or_insert(0);
            *rank += 1;

            if *rank == 1 {
                groups.insert(
                    hash.clone(),
                    DuplicateGroup {
                        key_hash: hash,
                        kept_index: index,
                        discarded: 0,
                        company: record.company.clone().unwrap_or_default(),
                    },
                );
                kept.push(Staged { row_num: 1, inner: record });
            } else {
                // rank > 1: logically deleted
                if let Some(group) = groups.get_mut(&hash) {
                    group.discarded += 1;
                }
            }
        }

        let mut duplicate_groups: Vec<DuplicateGroup> =
            groups.into_values().filter(|g| g.discarded > 0).collect();
        duplicate_groups.sort_by_key(|g| g.kept_index);

        DedupOutcome { records: kept, duplicate_groups }
    }
}

// ============================================================================
// TESTS
// ============================================================================
