// Record types for the layoffs dataset
// RawRecord is CSV-shaped (all text); LayoffRecord is the typed, cleaned row

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Decode a CSV cell into `Option<String>`.
/// The source dataset encodes missing values both as empty cells and as the
/// literal text `NULL`; both become `None`.
fn de_nullable<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty() && s != "NULL"))
}

// ============================================================================
// RAW RECORD (working copy, pre-normalization)
// ============================================================================

/// One row of the raw layoffs CSV, untouched apart from NULL decoding.
/// Every field stays text until the Normalizer commits the type change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawRecord {
    #[serde(deserialize_with = "de_nullable")]
    pub company: Option<String>,

    #[serde(deserialize_with = "de_nullable")]
    pub location: Option<String>,

    #[serde(deserialize_with = "de_nullable")]
    pub industry: Option<String>,

    #[serde(deserialize_with = "de_nullable")]
    pub total_laid_off: Option<String>,

    #[serde(deserialize_with = "de_nullable")]
    pub percentage_laid_off: Option<String>,

    #[serde(deserialize_with = "de_nullable")]
    pub date: Option<String>,

    #[serde(deserialize_with = "de_nullable")]
    pub stage: Option<String>,

    #[serde(deserialize_with = "de_nullable")]
    pub country: Option<String>,

    #[serde(deserialize_with = "de_nullable")]
    pub funds_raised_millions: Option<String>,
}

impl RawRecord {
    /// Hash of the full business key (all nine fields).
    /// Two rows with equal hashes are duplicates regardless of position.
    /// `None` participates with null-equals-null semantics: a fixed sentinel
    /// that cannot collide with real data, joined by a unit separator.
    pub fn business_key_hash(&self) -> String {
        fn part(field: &Option<String>) -> &str {
            field.as_deref().unwrap_or("\u{0}NULL\u{0}")
        }

        let mut hasher = Sha256::new();
        for field in [
            &self.company,
            &self.location,
            &self.industry,
            &self.total_laid_off,
            &self.percentage_laid_off,
            &self.date,
            &self.stage,
            &self.country,
            &self.funds_raised_millions,
        ] {
            hasher.update(part(field));
            hasher.update("\u{1f}");
        }
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// LAYOFF RECORD (typed, cleaned)
// ============================================================================

/// A cleaned layoff event. This is the output schema: no rank or other
/// bookkeeping fields, dates as real dates, blanks as `None`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LayoffRecord {
    pub company: String,
    pub location: String,
    pub industry: Option<String>,
    pub total_laid_off: Option<i64>,
    pub percentage_laid_off: Option<String>,

    /// Serialized under the raw column name so the cleaned CSV feeds back
    /// through `load_csv` unchanged
    #[serde(rename = "date")]
    pub event_date: Option<NaiveDate>,
    pub stage: Option<String>,
    pub country: String,
    pub funds_raised_millions: Option<i64>,
}

// ============================================================================
// STAGED WRAPPER (dedup bookkeeping)
// ============================================================================

/// Working wrapper carrying the per-partition sequence number assigned by the
/// Deduplicator. The Projector strips it, so the cleaned output type cannot
/// leak the rank.
#[derive(Debug, Clone, PartialEq)]
pub struct Staged<T> {
    pub row_num: u32,
    pub inner: T,
}

// ============================================================================
// CSV I/O
// ============================================================================

/// Load the raw CSV into a working copy. An empty file (headers only, or
/// nothing at all once headers are consumed) yields an empty vec.
pub fn load_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: RawRecord = result.context("Failed to deserialize layoff row")?;
        records.push(record);
    }

    Ok(records)
}

/// Write cleaned records back out as CSV, dates in ISO form, blanks empty.
pub fn write_csv(path: &Path, records: &[LayoffRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;

    for record in records {
        wtr.serialize(record).context("Failed to serialize layoff row")?;
    }
    wtr.flush().context("Failed to flush CSV output")?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(company: &str, industry: Option<&str>) -> RawRecord {
        RawRecord {
            company: Some(company.to_string()),
            location: Some("SF Bay Area".to_string()),
            industry: industry.map(|s| s.to_string()),
            total_laid_off: Some("100".to_string()),
            percentage_laid_off: None,
            date: Some("3/5/2023".to_string()),
            stage: Some("Series B".to_string()),
            country: Some("United States".to_string()),
            funds_raised_millions: None,
        }
    }

    #[test]
    fn test_business_key_identical_rows_hash_equal() {
        let a = raw("Atlassian", Some("Other"));
        let b = raw("Atlassian", Some("Other"));
        assert_eq!(a.business_key_hash(), b.business_key_hash());
    }

    #[test]
    fn test_business_key_null_equals_null() {
        let a = raw("Airbnb", None);
        let b = raw("Airbnb", None);
        assert_eq!(a.business_key_hash(), b.business_key_hash());
    }

    #[test]
    fn test_business_key_differs_on_any_field() {
        let a = raw("Airbnb", Some("Travel"));
        let b = raw("Airbnb", Some("Transportation"));
        assert_ne!(a.business_key_hash(), b.business_key_hash());

        let mut c = raw("Airbnb", Some("Travel"));
        c.funds_raised_millions = Some("120".to_string());
        assert_ne!(a.business_key_hash(), c.business_key_hash());
    }

    #[test]
    fn test_written_csv_loads_back() {
        let path = std::env::temp_dir().join(format!("layoffs_header_{}.csv", std::process::id()));

        let record = LayoffRecord {
            company: "Airbnb".to_string(),
            location: "SF Bay Area".to_string(),
            industry: Some("Travel".to_string()),
            total_laid_off: Some(30),
            percentage_laid_off: None,
            event_date: chrono::NaiveDate::from_ymd_opt(2023, 3, 5),
            stage: Some("Post-IPO".to_string()),
            country: "United States".to_string(),
            funds_raised_millions: Some(6400),
        };
        write_csv(&path, &[record]).unwrap();

        // The date column keeps its raw name so the loader recognizes it
        let contents = std::fs::read_to_string(&path).unwrap();
        let header = contents.lines().next().unwrap();
        assert_eq!(
            header,
            "company,location,industry,total_laid_off,percentage_laid_off,\
             date,stage,country,funds_raised_millions"
        );

        let loaded = load_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].company.as_deref(), Some("Airbnb"));
        assert_eq!(loaded[0].date.as_deref(), Some("2023-03-05"));
        assert_eq!(loaded[0].percentage_laid_off, None);
    }

    #[test]
    fn test_csv_null_literal_decodes_to_none() {
        let data = "company,location,industry,total_laid_off,percentage_laid_off,date,stage,country,funds_raised_millions\n\
                    Airbnb,SF Bay Area,NULL,30,,3/5/2023,NULL,United States,NULL\n";
        let mut rdr = csv::Reader::from_reader(data.as_bytes());
        let record: RawRecord = rdr.deserialize().next().unwrap().unwrap();

        assert_eq!(record.company.as_deref(), Some("Airbnb"));
        assert_eq!(record.industry, None);
        assert_eq!(record.percentage_laid_off, None);
        assert_eq!(record.stage, None);
        assert_eq!(record.funds_raised_millions, None);
        assert_eq!(record.total_laid_off.as_deref(), Some("30"));
    }
}
