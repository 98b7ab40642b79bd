//! Analysis error type

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Malformed snapshot data (bad timestamp, missing field)
    #[error(transparent)]
    Input(#[from] common::Error),
    #[error("Invalid heuristic pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
