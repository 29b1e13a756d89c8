use std::io;

use pdf::error::PdfError;
use thiserror::Error;

/// Primary error type for fetching, reading and writing term-date data.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("invalid academic year label {0:?}, expected e.g. \"2025-2026\"")]
    InvalidAcademicYear(String),
}
