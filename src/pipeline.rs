// Cleaning pipeline - Load -> Dedupe -> Normalize -> Fill -> Project
// Strictly linear; every stage consumes an owned working copy and returns a
// new one. Only the date coercion can fail, and it aborts the whole run.
//
// Deduplication runs on the raw rows, so uniqueness is guaranteed over the
// raw business key. Rows that only become equal through normalization or
// gap-fill (say, two Crypto spellings) are distinct events and both survive.

use crate::dedup::{Deduplicator, DuplicateGroup};
use crate::gapfill::{AmbiguousFill, GapFiller};
use crate::normalize::Normalizer;
use crate::record::{LayoffRecord, RawRecord, Staged};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// What a run did, stage by stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanSummary {
    pub input_rows: usize,
    pub duplicates_removed: usize,
    pub output_rows: usize,
    pub industries_filled: usize,
    pub industries_unresolved: usize,
    pub ambiguous_companies: Vec<AmbiguousFill>,
    pub duplicate_groups: Vec<DuplicateGroup>,
}

/// A completed run: the cleaned table plus its summary.
#[derive(Debug)]
pub struct CleanOutcome {
    pub records: Vec<LayoffRecord>,
    pub summary: CleanSummary,
}

pub struct Pipeline;

impl Pipeline {
    /// Run the full cleaning pipeline over a raw working copy.
    ///
    /// The input vec is the expendable staging copy; the caller's original
    /// source (file, table) is never touched, so a failed run can simply be
    /// retried against a rebuilt copy.
    pub fn run(raw: Vec<RawRecord>) -> Result<CleanOutcome> {
        let input_rows = raw.len();

        let deduped = Deduplicator::dedupe(raw);
        let kept_rows = deduped.records.len();

        let normalized = Normalizer::normalize(deduped.records)?;

        let filled = GapFiller::fill(normalized);

        let records = Self::project(filled.records);

        Ok(CleanOutcome {
            summary: CleanSummary {
                input_rows,
                duplicates_removed: input_rows - kept_rows,
                output_rows: records.len(),
                industries_filled: filled.filled,
                industries_unresolved: filled.unresolved,
                ambiguous_companies: filled.warnings,
                duplicate_groups: deduped.duplicate_groups,
            },
            records,
        })
    }

    /// Projector: drop the rank bookkeeping from the output schema.
    /// Pure schema operation, no row-level effect.
    fn project(records: Vec<Staged<LayoffRecord>>) -> Vec<LayoffRecord> {
        records.into_iter().map(|staged| staged.inner).collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
