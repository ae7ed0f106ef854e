// SQLite persistence for the cleaned layoffs table
// The raw CSV is never touched; only cleaned records land here, and the whole
// batch goes in under one transaction so a failed run commits nothing.

use crate::record::LayoffRecord;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("Failed to enable WAL mode")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS layoffs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company TEXT NOT NULL,
            location TEXT NOT NULL,
            industry TEXT,
            total_laid_off INTEGER,
            percentage_laid_off TEXT,
            event_date TEXT,
            stage TEXT,
            country TEXT NOT NULL,
            funds_raised_millions INTEGER,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create layoffs table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_layoffs_company ON layoffs(company)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_layoffs_country ON layoffs(country)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_layoffs_date ON layoffs(event_date)",
        [],
    )?;

    Ok(())
}

/// Insert cleaned records in a single transaction. Either every row lands or
/// none do; a failure mid-batch leaves the table exactly as it was.
pub fn insert_records(conn: &mut Connection, records: &[LayoffRecord]) -> Result<usize> {
    let tx = conn.transaction().context("Failed to begin transaction")?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO layoffs (
                company, location, industry, total_laid_off, percentage_laid_off,
                event_date, stage, country, funds_raised_millions
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;

        for record in records {
            stmt.execute(params![
                record.company,
                record.location,
                record.industry,
                record.total_laid_off,
                record.percentage_laid_off,
                record.event_date.map(|d| d.to_string()),
                record.stage,
                record.country,
                record.funds_raised_millions,
            ])
            .with_context(|| format!("Failed to insert row for {}", record.company))?;
        }
    }

    tx.commit().context("Failed to commit layoffs batch")?;
    Ok(records.len())
}

pub fn get_all_records(conn: &Connection) -> Result<Vec<LayoffRecord>> {
    let mut stmt = conn.prepare(
        "SELECT company, location, industry, total_laid_off, percentage_laid_off,
                event_date, stage, country, funds_raised_millions
         FROM layoffs ORDER BY id",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<i64>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, String>(7)?,
            row.get::<_, Option<i64>>(8)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (
            company,
            location,
            industry,
            total_laid_off,
            percentage_laid_off,
            event_date,
            stage,
            country,
            funds_raised_millions,
        ) = row.context("Failed to read layoffs row")?;

        let event_date = match event_date {
            Some(text) => Some(
                NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                    .with_context(|| format!("Invalid stored date {:?}", text))?,
            ),
            None => None,
        };

        records.push(LayoffRecord {
            company,
            location,
            industry,
            total_laid_off,
            percentage_laid_off,
            event_date,
            stage,
            country,
            funds_raised_millions,
        });
    }

    Ok(records)
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count = conn
        .query_row("SELECT COUNT(*) FROM layoffs", [], |row| row.get(0))
        .context("Failed to count layoffs")?;
    Ok(count)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(company: &str, date: Option<&str>) -> LayoffRecord {
        LayoffRecord {
            company: company.to_string(),
            location: "Seattle".to_string(),
            industry: Some("Retail".to_string()),
            total_laid_off: Some(10000),
            percentage_laid_off: None,
            event_date: date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            stage: Some("Post-IPO".to_string()),
            country: "United States".to_string(),
            funds_raised_millions: None,
        }
    }

    #[test]
    fn test_insert_and_read_back() {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let records = vec![record("Amazon", Some("2023-01-04")), record("Meta", None)];
        let inserted = insert_records(&mut conn, &records).unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(verify_count(&conn).unwrap(), 2);

        let loaded = get_all_records(&conn).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_empty_batch_commits_nothing() {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        assert_eq!(insert_records(&mut conn, &[]).unwrap(), 0);
        assert_eq!(verify_count(&conn).unwrap(), 0);
    }
}
