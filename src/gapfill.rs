// Gap-Filler - resolve missing industry values from sibling rows
// A row with a null industry borrows the value from another row of the same
// company. Donor choice is deterministic: most frequent value wins, ties go
// to the lexicographically smallest, and conflicts are reported as warnings.

use crate::record::{LayoffRecord, Staged};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A company whose donor rows disagree on the industry. Non-fatal; the
/// deterministic tie-break still picks one value, but the caller should know.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbiguousFill {
    pub company: String,

    /// The distinct conflicting values, sorted
    pub values: Vec<String>,

    /// The value the tie-break selected
    pub chosen: String,
}

/// Result of a gap-fill pass.
#[derive(Debug)]
pub struct FillOutcome {
    pub records: Vec<Staged<LayoffRecord>>,

    /// How many null industries were resolved
    pub filled: usize,

    /// How many stayed null because no donor exists (an unresolved gap,
    /// not an error)
    pub unresolved: usize,

    pub warnings: Vec<AmbiguousFill>,
}

pub struct GapFiller;

impl GapFiller {
    /// Single pass, single field: fill null industries from same-company
    /// donors. A company whose rows are all null stays null; there is no
    /// transitive or fixpoint propagation.
    pub fn fill(records: Vec<Staged<LayoffRecord>>) -> FillOutcome {
        // Tally donor values per company. BTreeMap keeps the value iteration
        // order stable so the tie-break is reproducible.
        let mut donors: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        for staged in &records {
            if let Some(industry) = &staged.inner.industry {
                *donors
                    .entry(staged.inner.company.clone())
                    .or_default()
                    .entry(industry.clone())
                    .or_insert(0) += 1;
            }
        }

        // Choose one value per company: highest count, then smallest label.
        let mut chosen: BTreeMap<String, String> = BTreeMap::new();
        let mut warnings = Vec::new();
        for (company, counts) in &donors {
            let pick = counts
                .iter()
                .max_by(|(label_a, count_a), (label_b, count_b)| {
                    count_a.cmp(count_b).then(label_b.cmp(label_a))
                })
                .map(|(label, _)| label.clone());

            if let Some(pick) = pick {
                if counts.len() > 1 {
                    warnings.push(AmbiguousFill {
                        company: company.clone(),
                        values: counts.keys().cloned().collect(),
                        chosen: pick.clone(),
                    });
                }
                chosen.insert(company.clone(), pick);
            }
        }

        let mut filled = 0;
        let mut unresolved = 0;
        let records = records
            .into_iter()
            .map(|mut staged| {
                if staged.inner.industry.is_none() {
                    match chosen.get(&staged.inner.company) {
                        Some(value) => {
                            staged.inner.industry = Some(value.clone());
                            filled += 1;
                        }
                        None => unresolved += 1,
                    }
                }
                staged
            })
            .collect();

        FillOutcome { records, filled, unresolved, warnings }
    }
}

// ============================================================================
// TESTS
// ============================================================================
