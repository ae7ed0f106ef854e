use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::env;
use std::path::Path;

use layoffs_cleaner::{
    date_range, insert_records, load_csv, monthly_rolling_totals, setup_database,
    top_companies_per_year, totals_by_company, totals_by_country, totals_by_industry,
    totals_by_year, verify_count, write_csv, Pipeline,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("clean") => run_clean(&args[2..]),
        Some("report") => run_report(&args[2..]),
        _ => {
            eprintln!("Usage:");
            eprintln!("  layoffs-cleaner clean <input.csv> <db> [--csv-out <path>] [--json]");
            eprintln!("  layoffs-cleaner report <db>");
            std::process::exit(2);
        }
    }
}

fn run_clean(args: &[String]) -> Result<()> {
    let (input, db_path) = match (args.first(), args.get(1)) {
        (Some(input), Some(db)) => (Path::new(input), Path::new(db)),
        _ => bail!("clean requires <input.csv> and <db> arguments"),
    };
    let csv_out = csv_out_arg(args)?;
    let json_summary = args.iter().any(|a| a == "--json");

    println!("🧹 Layoffs Cleaner - CSV → cleaned SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load the raw CSV into an expendable working copy
    println!("\n📂 Loading CSV...");
    let raw = load_csv(input)?;
    println!("✓ Loaded {} raw rows from {}", raw.len(), input.display());

    // 2. Run the cleaning pipeline
    println!("\n🔄 Running pipeline (dedupe → normalize → gap-fill → project)...");
    let outcome = Pipeline::run(raw).context("Cleaning pipeline aborted")?;
    let summary = &outcome.summary;

    println!("✓ Duplicates removed:    {}", summary.duplicates_removed);
    println!("✓ Industries gap-filled: {}", summary.industries_filled);
    if summary.industries_unresolved > 0 {
        println!("✓ Unresolved gaps:       {}", summary.industries_unresolved);
    }
    for warning in &summary.ambiguous_companies {
        println!(
            "⚠️  {} has conflicting industry values {:?}; using {:?}",
            warning.company, warning.values, warning.chosen
        );
    }

    // 3. Persist the cleaned table (single transaction)
    println!("\n💾 Writing cleaned table...");
    let mut conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    setup_database(&conn)?;
    insert_records(&mut conn, &outcome.records)?;

    let count = verify_count(&conn)?;
    println!("✓ Database contains {} cleaned rows", count);

    if let Some(path) = csv_out {
        write_csv(Path::new(path), &outcome.records)?;
        println!("✓ Cleaned CSV written to {}", path);
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "🎉 Done: {} rows in → {} rows out",
        summary.input_rows, summary.output_rows
    );

    if json_summary {
        println!("{}", serde_json::to_string_pretty(summary)?);
    }

    Ok(())
}

/// Extract the `--csv-out` path if the flag is present. Another flag is not
/// a path, so `--csv-out --json` is an error rather than a file named
/// `--json`.
fn csv_out_arg(args: &[String]) -> Result<Option<&String>> {
    match args.iter().position(|a| a == "--csv-out") {
        Some(i) => match args.get(i + 1) {
            Some(path) if !path.starts_with("--") => Ok(Some(path)),
            _ => bail!("--csv-out requires a file path"),
        },
        None => Ok(None),
    }
}

fn run_report(args: &[String]) -> Result<()> {
    let db_path = match args.first() {
        Some(db) => Path::new(db),
        None => bail!("report requires a <db> argument"),
    };
    if !db_path.exists() {
        bail!(
            "Database not found: {}\nRun `layoffs-cleaner clean` first.",
            db_path.display()
        );
    }

    let conn = Connection::open(db_path)?;

    println!("📊 Layoffs Report");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if let Some((min, max)) = date_range(&conn)? {
        println!("\nEvent dates span {} → {}", min, max);
    }

    println!("\n🏢 Top companies by total laid off:");
    for total in totals_by_company(&conn)?.iter().take(10) {
        println!("  {:<24} {}", total.label, total.total);
    }

    println!("\n🏭 By industry:");
    for total in totals_by_industry(&conn)?.iter().take(10) {
        println!("  {:<24} {}", total.label, total.total);
    }

    println!("\n🌍 By country:");
    for total in totals_by_country(&conn)?.iter().take(10) {
        println!("  {:<24} {}", total.label, total.total);
    }

    println!("\n📅 By year:");
    for total in totals_by_year(&conn)? {
        println!("  {:<24} {}", total.label, total.total);
    }

    println!("\n📈 Monthly rolling total:");
    for month in monthly_rolling_totals(&conn)? {
        println!("  {}  {:>8}  (rolling {})", month.month, month.total, month.rolling_total);
    }

    println!("\n🏆 Top 5 companies per year:");
    for entry in top_companies_per_year(&conn, 5)? {
        println!("  {}  #{}  {:<24} {}", entry.year, entry.rank, entry.company, entry.total);
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
