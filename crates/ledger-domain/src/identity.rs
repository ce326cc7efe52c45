use chrono::NaiveDate;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

/// Normalizes a raw bank description for identity hashing: trims
/// surrounding whitespace, collapses internal runs of whitespace, and
/// uppercases. Two descriptions that differ only in case or spacing
/// still collapse to the same transaction id; descriptions that differ
/// in wording do not.
fn normalize_description(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Deterministic content-addressed identity for a transaction, derived
/// from `(source_account, date, amount, normalized description)`.
///
/// Two ingests of the same underlying bank row yield the same id. The
/// same underlying transaction re-exported with altered description
/// text yields a different id, which the ingest pipeline resolves via a
/// `TransactionDescriptionObserved` event rather than silent collision.
pub fn transaction_id(
    source_account: &str,
    date: NaiveDate,
    amount: Decimal,
    description: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_account.as_bytes());
    hasher.update(b"|");
    hasher.update(date.format("%Y-%m-%d").to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(amount.normalize().to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_description(description).as_bytes());
    hex::encode(hasher.finalize())
}
