use std::io::Write;

use chrono::{TimeZone, Utc};
use ledger_config::CategoriesConfig;
use ledger_core::{EventLog, ProjectionBuilder};
use ledger_migrate::MigrationService;
use ledger_storage_sqlite::{SqliteBudgetProjectionStore, SqliteEventLog, SqliteProjectionMetadataStore, SqliteTransactionProjectionStore};
use tempfile::tempdir;

const CSV_BODY: &str = "\
row_type,transaction_id,date,description,amount,currency,account_id,category,subcategory,source_file,metadata_json
primary,tx-1,2025-03-01,SPOTIFY PREMIUM,-12.99,CAD,acct-chequing,Subscriptions,,2025-03-01-chequing.csv,
primary,tx-2,2025-03-02,COFFEE SHOP,-4.50,CAD,acct-chequing,,,2025-03-01-chequing.csv,
primary,tx-3,2025-03-03,PAYCHECK,2500.00,CAD,acct-chequing,Income,Salary,2025-03-01-chequing.csv,
";

const CATEGORIES_YAML: &str = "\
categories:
  - name: Subscriptions
    description: Recurring services
    budget:
      amount: \"50.00\"
      period: monthly
  - name: Income
    description: Earnings
    subcategories:
      - name: Salary
        description: Regular pay
  - name: Groceries
    description: Food
    budget:
      amount: \"400.00\"
      period: monthly
";

#[test]
fn backfill_scenario_matches_source_counts() {
    let source_dir = tempdir().unwrap();
    let mut csv_file = std::fs::File::create(source_dir.path().join("2025-03-01-chequing.csv")).unwrap();
    csv_file.write_all(CSV_BODY.as_bytes()).unwrap();

    let config_path = tempdir().unwrap().path().join("categories.yml");
    std::fs::write(&config_path, CATEGORIES_YAML).unwrap();
    let config = CategoriesConfig::load(&config_path).unwrap();

    let dbs = tempdir().unwrap();
    let event_log = SqliteEventLog::open(dbs.path().join("events.db")).unwrap();
    let transactions = SqliteTransactionProjectionStore::open(dbs.path().join("projections.db")).unwrap();
    let budgets = SqliteBudgetProjectionStore::open(dbs.path().join("budget_projections.db")).unwrap();
    let metadata = SqliteProjectionMetadataStore::open(dbs.path().join("projections.db")).unwrap();

    MigrationService::check_preconditions(source_dir.path(), event_log.latest_sequence().unwrap() == 0, false).unwrap();

    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let generated = MigrationService::generate_transaction_events(
        &source_dir.path().join("2025-03-01-chequing.csv"),
        now,
    )
    .unwrap();
    assert!(generated.errors.is_empty());
    // 3 primary rows, 2 of which carry a category -> 5 events total.
    assert_eq!(generated.events.len(), 5);

    for event in &generated.events {
        event_log.append(event).unwrap();
    }

    let budget_events = MigrationService::generate_budget_events(&config, "CAD", None);
    // Only top-level categories with a budget: Subscriptions and Groceries.
    assert_eq!(budget_events.len(), 2);
    for event in &budget_events {
        event_log.append(event).unwrap();
    }

    let builder = ProjectionBuilder::new(&event_log, &transactions, &budgets, &metadata);
    builder.rebuild_from_scratch().unwrap();

    let result = MigrationService::validate_migration(source_dir.path(), &transactions, &budgets, &config).unwrap();
    assert!(result.is_valid, "validation errors: {:?}", result.errors);
    assert!(result.transaction_count_match);
    assert!(result.budget_count_match);
    assert!(result.sample_transactions_match);
}

#[test]
fn missing_transaction_id_is_skipped_not_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.csv");
    std::fs::write(
        &path,
        "row_type,transaction_id,date,description,amount,currency,account_id,category,subcategory,source_file,metadata_json\n\
         primary,,2025-03-01,MYSTERY,-1.00,CAD,acct-1,,,broken.csv,\n\
         primary,tx-ok,2025-03-02,KNOWN,-2.00,CAD,acct-1,,,broken.csv,\n",
    )
    .unwrap();

    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let generated = MigrationService::generate_transaction_events(&path, now).unwrap();
    assert_eq!(generated.events.len(), 1);
    assert_eq!(generated.errors.len(), 1);
    assert!(generated.errors[0].contains("Missing transaction_id"));
}

#[test]
fn colon_in_category_is_skipped_not_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad-category.csv");
    std::fs::write(
        &path,
        "row_type,transaction_id,date,description,amount,currency,account_id,category,subcategory,source_file,metadata_json\n\
         primary,tx-1,2025-03-01,RENT,-1000.00,CAD,acct-1,Housing:Rent,,bad-category.csv,\n\
         primary,tx-2,2025-03-02,PAYCHECK,2000.00,CAD,acct-1,Income,,bad-category.csv,\n",
    )
    .unwrap();

    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let generated = MigrationService::generate_transaction_events(&path, now).unwrap();
    // Both TransactionImported events still land; only the malformed
    // category's TransactionCategorized is dropped.
    assert_eq!(generated.events.len(), 3);
    assert_eq!(generated.errors.len(), 1);
    assert!(generated.errors[0].contains("must not contain ':'"));
}
