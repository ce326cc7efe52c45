use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Three-tier fallback for the event_timestamp of a migrated row:
/// 1. A `YYYY-MM-DD` prefix in `source_file` (split on `-`, first three
///    segments parsed as year/month/day), at noon.
/// 2. `transaction_date` itself, at noon.
/// 3. The current time, as a last resort.
pub fn infer_import_timestamp(source_file: &str, transaction_date: NaiveDate, now: DateTime<Utc>) -> DateTime<Utc> {
    if let Some(ts) = parse_filename_prefix(source_file) {
        return ts;
    }
    noon_on(transaction_date).unwrap_or(now)
}

fn parse_filename_prefix(source_file: &str) -> Option<DateTime<Utc>> {
    let stem = source_file.rsplit('/').next().unwrap_or(source_file);
    let parts: Vec<&str> = stem.split('-').collect();
    if parts.len() < 3 {
        return None;
    }
    let year: i32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let day: u32 = parts[2].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    noon_on(date)
}

fn noon_on(date: NaiveDate) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(date.year(), date.month(), date.day(), 12, 0, 0)
        .single()
}

use chrono::Datelike;
