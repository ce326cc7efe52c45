use serde::Deserialize;

/// One row of the legacy transaction CSV. Transfer-link and split
/// columns are not modeled here; the core never interprets them, per
/// the external interfaces contract — callers that need them read the
/// raw CSV themselves.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvRow {
    pub row_type: String,
    pub transaction_id: String,
    pub date: String,
    pub description: String,
    pub amount: String,
    pub currency: String,
    pub account_id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub source_file: String,
    #[serde(default)]
    pub metadata_json: String,
}
