// Layoffs Cleaner - Core Library
// Batch cleaning pipeline plus reporting queries over the cleaned table

pub mod db;
pub mod dedup;
pub mod gapfill;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod report;

// Re-export commonly used types
pub use db::{get_all_records, insert_records, setup_database, verify_count};
pub use dedup::{Deduplicator, DedupOutcome, DuplicateGroup};
pub use gapfill::{AmbiguousFill, FillOutcome, GapFiller};
pub use normalize::{MalformedDate, MalformedDateError, Normalizer};
pub use pipeline::{CleanOutcome, CleanSummary, Pipeline};
pub use record::{load_csv, write_csv, LayoffRecord, RawRecord, Staged};
pub use report::{
    date_range, monthly_rolling_totals, top_companies_per_year, totals_by_company,
    totals_by_country, totals_by_industry, totals_by_year, GroupTotal, MonthlyTotal,
    YearlyTopCompany,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
