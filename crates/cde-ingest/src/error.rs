//! Error types for loading and writing external files.

use std::path::PathBuf;

use cde_map::MatchError;
use cde_model::ModelError;
use thiserror::Error;

/// Errors that can occur while reading or writing datasets, schemas and
/// embedding tables.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Input file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Errors ===
    /// Failed to read or parse CSV.
    #[error("failed to read CSV {path}: {source}")]
    CsvRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Failed to write CSV.
    #[error("failed to write CSV {path}: {source}")]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// CSV file has no header row.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    /// A header cell is blank.
    #[error("column {index} of {path} has an empty name")]
    EmptyColumnName { path: PathBuf, index: usize },

    // === Schema Errors ===
    /// Required column not found in a schema file.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: &'static str, path: PathBuf },

    /// Failed to parse a JSON schema.
    #[error("failed to parse JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Schema or dataset contents break a model rule.
    #[error("invalid contents in {path}: {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    // === Embedding Errors ===
    /// A line of an embedding table could not be parsed.
    #[error("invalid embedding table {path}, line {line}: {reason}")]
    EmbeddingLine {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// The loaded vectors do not form a usable table.
    #[error("invalid embedding table {path}: {source}")]
    Embeddings {
        path: PathBuf,
        #[source]
        source: MatchError,
    },
}

impl IngestError {
    /// Maps an open/read failure, keeping "not found" distinct.
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound { path }
        } else {
            Self::FileRead { path, source }
        }
    }

    pub(crate) fn model(path: impl Into<PathBuf>, source: ModelError) -> Self {
        Self::Model {
            path: path.into(),
            source,
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
