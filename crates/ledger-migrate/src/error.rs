use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("source directory {0} does not exist or contains no CSV files")]
    NoSourceData(String),
    #[error("event log already contains data; pass force to overwrite")]
    TargetNotEmpty,
}
