//! Error types for ShowReco

use thiserror::Error;

/// Result type alias for loading and evaluation
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single pairwise similarity computation. Callers ranking candidates exclude
/// the pair instead of scoring it.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SimilarityError {
    #[error("Similarity undefined for an empty like-set or a zero-norm feature vector")]
    DegenerateInput,

    #[error("Feature vectors differ in length: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read catalog: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to serialize: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Catalog line {line} needs title, genre and text columns")]
    MalformedCatalogRow { line: u64 },

    #[error("No users are eligible for evaluation")]
    NoEligibleUsers,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
