//! Import of raw business records from collector exports (CSV or JSON).

mod normalizer;
mod parser;

pub use normalizer::{normalize, NormalizationError};
pub use parser::{parse_csv, parse_json, RawRecord};

use std::path::Path;

#[derive(Debug)]
pub enum IntakeError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    UnsupportedFormat(String),
}

impl std::fmt::Display for IntakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntakeError::Io(err) => write!(f, "failed to read lead export: {}", err),
            IntakeError::Csv(err) => write!(f, "invalid lead CSV data: {}", err),
            IntakeError::Json(err) => write!(f, "invalid lead JSON data: {}", err),
            IntakeError::UnsupportedFormat(extension) => write!(
                f,
                "unsupported lead export format '{}' (expected .csv or .json)",
                extension
            ),
        }
    }
}

impl std::error::Error for IntakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IntakeError::Io(err) => Some(err),
            IntakeError::Csv(err) => Some(err),
            IntakeError::Json(err) => Some(err),
            IntakeError::UnsupportedFormat(_) => None,
        }
    }
}

impl From<std::io::Error> for IntakeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for IntakeError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for IntakeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Reads a collector export, picking the parser from the file extension.
pub fn load_path<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>, IntakeError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => parse_csv(std::fs::File::open(path)?),
        "json" => parse_json(std::fs::File::open(path)?),
        _ => Err(IntakeError::UnsupportedFormat(extension)),
    }
}
