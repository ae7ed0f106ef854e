// Normalizer - canonicalize text fields and commit the date type change
// Text fixes are per-row; the date coercion is validate-then-commit: parse
// every row first and refuse the whole batch if any value is unparseable.

use crate::record::{LayoffRecord, RawRecord, Staged};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Industry labels that appear under several spellings in the raw data,
/// canonicalized by prefix. `Crypto Currency`, `CryptoCurrency` and plain
/// `Crypto` all become `Crypto`.
const INDUSTRY_PREFIXES: &[(&str, &str)] = &[("Crypto", "Crypto")];

/// Date formats accepted by the coercion. The raw dataset uses M/D/YYYY;
/// ISO is accepted so the pipeline is idempotent over its own CSV output.
const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

// ============================================================================
// ERRORS
// ============================================================================

/// One date value that failed to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MalformedDate {
    /// Position of the row in the deduplicated working copy
    pub row: usize,

    /// Company of the offending row, for the error report
    pub company: String,

    /// The text that would not parse
    pub text: String,
}

/// Raised when any date in the batch is unparseable. The type change is not
/// committed: the caller gets every failure at once and no partial output.
#[derive(Debug, Clone)]
pub struct MalformedDateError {
    pub failures: Vec<MalformedDate>,
}

impl std::fmt::Display for MalformedDateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} date value(s) could not be parsed:", self.failures.len())?;
        for failure in &self.failures {
            writeln!(
                f,
                "  row {} ({}): {:?}",
                failure.row, failure.company, failure.text
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for MalformedDateError {}

// ============================================================================
// NORMALIZER
// ============================================================================

pub struct Normalizer;

impl Normalizer {
    /// Normalize every surviving row and convert the working copy to its
    /// typed form. No rows are added or removed; the rank wrapper is carried
    /// through untouched.
    pub fn normalize(
        records: Vec<Staged<RawRecord>>,
    ) -> Result<Vec<Staged<LayoffRecord>>, MalformedDateError> {
        // Validate phase: attempt every date before committing anything.
        let mut failures = Vec::new();
        for (row, staged) in records.iter().enumerate() {
            if let Some(text) = &staged.inner.date {
                if Self::parse_date(text).is_none() {
                    failures.push(MalformedDate {
                        row,
                        company: staged.inner.company.clone().unwrap_or_default(),
                        text: text.clone(),
                    });
                }
            }
        }
        if !failures.is_empty() {
            return Err(MalformedDateError { failures });
        }

        // Commit phase: every date is known to parse.
        let normalized = records
            .into_iter()
            .map(|staged| Staged {
                row_num: staged.row_num,
                inner: Self::normalize_one(staged.inner),
            })
            .collect();

        Ok(normalized)
    }

    fn normalize_one(raw: RawRecord) -> LayoffRecord {
        LayoffRecord {
            company: raw
                .company
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            location: raw.location.unwrap_or_default(),
            industry: Self::canonical_industry(raw.industry),
            total_laid_off: Self::parse_count(raw.total_laid_off),
            percentage_laid_off: blank_to_none(raw.percentage_laid_off),
            event_date: raw.date.as_deref().and_then(Self::parse_date),
            stage: blank_to_none(raw.stage),
            country: Self::canonical_country(raw.country),
            funds_raised_millions: Self::parse_count(raw.funds_raised_millions),
        }
    }

    /// Canonicalize an industry label. Blank collapses to `None` so the
    /// cleaned table never carries an empty-string industry; a label starting
    /// with a known prefix is replaced by its canonical form.
    fn canonical_industry(industry: Option<String>) -> Option<String> {
        let value = blank_to_none(industry)?;
        let trimmed = value.trim();

        for (prefix, canonical) in INDUSTRY_PREFIXES {
            if trimmed.starts_with(prefix) {
                return Some((*canonical).to_string());
            }
        }
        Some(trimmed.to_string())
    }

    /// Strip a trailing period; the raw data carries both `United States`
    /// and `United States.`.
    fn canonical_country(country: Option<String>) -> String {
        country
            .as_deref()
            .map(|c| c.trim().trim_end_matches('.'))
            .unwrap_or_default()
            .to_string()
    }

    fn parse_date(text: &str) -> Option<NaiveDate> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
    }

    /// Lenient numeric coercion for the count columns. The source data only
    /// ever holds plain integers or NULL here, so anything else is treated as
    /// missing rather than failing the batch; dates are the strict path.
    fn parse_count(text: Option<String>) -> Option<i64> {
        text.as_deref().and_then(|t| t.trim().parse().ok())
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

// ============================================================================
// TESTS
// ============================================================================
