use std::path::PathBuf;

/// Failures while locating or reading the processed payroll file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("wrong format: expected a .csv file, got '{extension}'")]
    WrongFormat { extension: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
