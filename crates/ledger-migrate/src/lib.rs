mod csv_row;
mod error;
mod migration_service;
mod timestamp;

pub use csv_row::CsvRow;
pub use error::MigrationError;
pub use migration_service::{GeneratedEvents, MigrationService, ValidationResult};
pub use timestamp::infer_import_timestamp;
