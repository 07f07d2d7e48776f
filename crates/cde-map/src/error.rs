//! Error types for matching and mapping-table operations.

use std::path::PathBuf;

use cde_model::{ModelError, SimilarityMethod};
use thiserror::Error;

/// Errors from the similarity engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("unknown similarity method: {0}")]
    UnknownMethod(String),
    #[error("top_k must be at least 1")]
    InvalidTopK,
    #[error("schema has no CDE codes to match against")]
    EmptySchema,
    #[error("similarity method {0} needs an embedder")]
    MissingEmbedder(SimilarityMethod),
    #[error("invalid embedding table: {0}")]
    InvalidEmbeddingTable(String),
    #[error("no embedding available for {word:?}: {reason}")]
    EmbeddingUnavailable { word: String, reason: String },
}

impl MatchError {
    pub(crate) fn unavailable(word: &str, reason: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable {
            word: word.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors from mapping-table edits and the mapping artifact.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("row index {index} out of range for a table of {len} rows")]
    RowOutOfRange { index: usize, len: usize },
    #[error("CDE code not in schema: {0}")]
    UnknownCode(String),
    #[error("no match candidates for column {0}")]
    NoCandidates(String),
    #[error("record {record} is missing field {field:?}")]
    MissingField { record: usize, field: &'static str },
    #[error("record {record} is invalid: {message}")]
    InvalidRecord { record: usize, message: String },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("failed to parse mapping JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MappingError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
