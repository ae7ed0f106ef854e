// Reporting queries over the cleaned layoffs table
// Read-only aggregations for downstream analysis; nothing here mutates the
// table or participates in the cleaning contract.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

/// A label (company, industry, country, year) with its summed layoff count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub label: String,
    pub total: i64,
}

/// Per-month total plus the running cumulative total, month ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// Month bucket as `YYYY-MM`
    pub month: String,
    pub total: i64,
    pub rolling_total: i64,
}

/// One of the top-N companies of a year by total layoffs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyTopCompany {
    pub year: i32,
    pub company: String,
    pub total: i64,
    pub rank: i64,
}

fn group_totals(conn: &Connection, column: &str) -> Result<Vec<GroupTotal>> {
    // `column` comes from the fixed call sites below, never from input
    let sql = format!(
        "SELECT {column}, SUM(total_laid_off) AS total
         FROM layoffs
         WHERE {column} IS NOT NULL AND total_laid_off IS NOT NULL
         GROUP BY {column}
         ORDER BY total DESC, {column} ASC"
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt.query_map([], |row| {
        Ok(GroupTotal { label: row.get(0)?, total: row.get(1)? })
    })?;

    let mut totals = Vec::new();
    for row in rows {
        totals.push(row.context("Failed to read aggregate row")?);
    }
    Ok(totals)
}

pub fn totals_by_company(conn: &Connection) -> Result<Vec<GroupTotal>> {
    group_totals(conn, "company")
}

pub fn totals_by_industry(conn: &Connection) -> Result<Vec<GroupTotal>> {
    group_totals(conn, "industry")
}

pub fn totals_by_country(conn: &Connection) -> Result<Vec<GroupTotal>> {
    group_totals(conn, "country")
}

pub fn totals_by_year(conn: &Connection) -> Result<Vec<GroupTotal>> {
    let mut stmt = conn.prepare(
        "SELECT substr(event_date, 1, 4) AS year, SUM(total_laid_off) AS total
         FROM layoffs
         WHERE event_date IS NOT NULL AND total_laid_off IS NOT NULL
         GROUP BY year
         ORDER BY total DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(GroupTotal { label: row.get(0)?, total: row.get(1)? })
    })?;

    let mut totals = Vec::new();
    for row in rows {
        totals.push(row.context("Failed to read yearly total")?);
    }
    Ok(totals)
}

/// Per-month layoff totals with a rolling cumulative sum, ordered by month
/// ascending. Rows without a date are excluded from the time buckets.
pub fn monthly_rolling_totals(conn: &Connection) -> Result<Vec<MonthlyTotal>> {
    let mut stmt = conn.prepare(
        "WITH monthly AS (
             SELECT substr(event_date, 1, 7) AS month,
                    SUM(total_laid_off) AS total
             FROM layoffs
             WHERE event_date IS NOT NULL AND total_laid_off IS NOT NULL
             GROUP BY month
         )
         SELECT month, total, SUM(total) OVER (ORDER BY month) AS rolling_total
         FROM monthly
         ORDER BY month ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(MonthlyTotal {
            month: row.get(0)?,
            total: row.get(1)?,
            rolling_total: row.get(2)?,
        })
    })?;

    let mut totals = Vec::new();
    for row in rows {
        totals.push(row.context("Failed to read monthly total")?);
    }
    Ok(totals)
}

/// The top N companies by total layoffs within each year. Ties share a rank
/// (dense ranking), so a year can return more than N rows.
pub fn top_companies_per_year(conn: &Connection, n: u32) -> Result<Vec<YearlyTopCompany>> {
    let mut stmt = conn.prepare(
        "WITH per_year AS (
             SELECT company,
                    CAST(substr(event_date, 1, 4) AS INTEGER) AS year,
                    SUM(total_laid_off) AS total
             FROM layoffs
             WHERE event_date IS NOT NULL AND total_laid_off IS NOT NULL
             GROUP BY company, year
         ),
         ranked AS (
             SELECT company, year, total,
                    DENSE_RANK() OVER (
                        PARTITION BY year ORDER BY total DESC
                    ) AS rank
             FROM per_year
         )
         SELECT company, year, total, rank
         FROM ranked
         WHERE rank <= ?1
         ORDER BY year ASC, rank ASC, company ASC",
    )?;

    let rows = stmt.query_map(params![n], |row| {
        Ok(YearlyTopCompany {
            company: row.get(0)?,
            year: row.get(1)?,
            total: row.get(2)?,
            rank: row.get(3)?,
        })
    })?;

    let mut top = Vec::new();
    for row in rows {
        top.push(row.context("Failed to read ranked row")?);
    }
    Ok(top)
}

/// Earliest and latest event dates in the cleaned table, if any row has one.
pub fn date_range(conn: &Connection) -> Result<Option<(String, String)>> {
    let range = conn
        .query_row(
            "SELECT MIN(event_date), MAX(event_date)
             FROM layoffs WHERE event_date IS NOT NULL",
            [],
            |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                ))
            },
        )
        .context("Failed to read date range")?;

    Ok(match range {
        (Some(min), Some(max)) => Some((min, max)),
        _ => None,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{insert_records, setup_database};
    use crate::record::LayoffRecord;
    use chrono::NaiveDate;

    fn record(company: &str, country: &str, total: Option<i64>, date: &str) -> LayoffRecord {
        LayoffRecord {
            company: company.to_string(),
            location: "SF Bay Area".to_string(),
            industry: Some("Other".to_string()),
            total_laid_off: total,
            percentage_laid_off: None,
            event_date: Some(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()),
            stage: None,
            country: country.to_string(),
            funds_raised_millions: None,
        }
    }

    fn seeded_conn(records: &[LayoffRecord]) -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        insert_records(&mut conn, records).unwrap();
        conn
    }

    #[test]
    fn test_rolling_totals_accumulate_by_month() {
        let conn = seeded_conn(&[
            record("A", "United States", Some(60), "2023-01-05"),
            record("B", "United States", Some(40), "2023-01-20"),
            record("C", "United States", Some(50), "2023-02-01"),
        ]);

        let totals = monthly_rolling_totals(&conn).unwrap();

        assert_eq!(
            totals,
            vec![
                MonthlyTotal { month: "2023-01".into(), total: 100, rolling_total: 100 },
                MonthlyTotal { month: "2023-02".into(), total: 50, rolling_total: 150 },
            ]
        );
    }

    #[test]
    fn test_totals_by_company_descending() {
        let conn = seeded_conn(&[
            record("A", "United States", Some(10), "2023-01-05"),
            record("A", "United States", Some(15), "2023-03-05"),
            record("B", "India", Some(100), "2023-01-05"),
        ]);

        let totals = totals_by_company(&conn).unwrap();

        assert_eq!(totals[0], GroupTotal { label: "B".into(), total: 100 });
        assert_eq!(totals[1], GroupTotal { label: "A".into(), total: 25 });
    }

    #[test]
    fn test_null_counts_excluded_from_aggregates() {
        let conn = seeded_conn(&[
            record("A", "United States", Some(10), "2023-01-05"),
            record("A", "United States", None, "2023-01-06"),
        ]);

        let totals = totals_by_company(&conn).unwrap();
        assert_eq!(totals, vec![GroupTotal { label: "A".into(), total: 10 }]);
    }

    #[test]
    fn test_top_companies_per_year() {
        let conn = seeded_conn(&[
            record("A", "United States", Some(300), "2022-06-01"),
            record("B", "United States", Some(200), "2022-07-01"),
            record("C", "United States", Some(100), "2022-08-01"),
            record("C", "United States", Some(500), "2023-01-01"),
        ]);

        let top = top_companies_per_year(&conn, 2).unwrap();

        assert_eq!(top.len(), 3);
        assert_eq!((top[0].year, top[0].company.as_str(), top[0].rank), (2022, "A", 1));
        assert_eq!((top[1].year, top[1].company.as_str(), top[1].rank), (2022, "B", 2));
        assert_eq!((top[2].year, top[2].company.as_str(), top[2].rank), (2023, "C", 1));
    }

    #[test]
    fn test_date_range() {
        let conn = seeded_conn(&[
            record("A", "United States", Some(1), "2022-06-01"),
            record("B", "India", Some(2), "2023-03-06"),
        ]);

        assert_eq!(
            date_range(&conn).unwrap(),
            Some(("2022-06-01".into(), "2023-03-06".into()))
        );
    }

    #[test]
    fn test_empty_table_reports_empty() {
        let conn = seeded_conn(&[]);

        assert!(totals_by_company(&conn).unwrap().is_empty());
        assert!(monthly_rolling_totals(&conn).unwrap().is_empty());
        assert_eq!(date_range(&conn).unwrap(), None);
    }
}
