//! Loading and writing the files around a mapping session.
//!
//! This crate reads source datasets and CDE schemas, writes transformed
//! datasets, and loads character embedding tables for the similarity engine.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use cde_ingest::{read_dataset, read_schema, write_dataset};
//!
//! let dataset = read_dataset(Path::new("data/source.csv"))?;
//! let schema = read_schema(Path::new("data/cdes.csv"))?;
//! // ... match, edit and apply ...
//! write_dataset(&outcome.dataset, Path::new("data/harmonized.csv"))?;
//! ```

mod dataset;
mod embeddings;
mod error;
mod schema;

// === Error Types ===
pub use error::{IngestError, Result};

// === Datasets ===
pub use dataset::{read_dataset, read_dataset_from, write_dataset, write_dataset_to};

// === Schemas ===
pub use schema::{read_schema, read_schema_csv, read_schema_json};

// === Embedding Tables ===
pub use embeddings::{read_char_embeddings, read_char_embeddings_from};
