//! Error types for tristage

use thiserror::Error;

/// Main error type for inference operations
#[derive(Error, Debug)]
pub enum TristageError {
    #[error("Invalid expression matrix: {reason}")]
    InvalidExpressionMatrix { reason: String },

    #[error("Invalid time axis: {reason}")]
    InvalidTimeAxis { reason: String },

    #[error("Invalid annotation: {reason}")]
    InvalidAnnotation { reason: String },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: String, got: String },

    #[error("Unknown gene identifier: {id}")]
    UnknownGene { id: String },

    #[error("Unknown relationship direction '{token}'. Use 'regulators' or 'targets'.")]
    InvalidDirection { token: String },

    #[error("Clustering failed: {reason}")]
    ClusteringFailed { reason: String },

    #[error("Query not applicable: {reason}")]
    InfeasibleQuery { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Empty data: {reason}")]
    EmptyData { reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },
}

/// Result type alias for tristage operations
pub type Result<T> = std::result::Result<T, TristageError>;
