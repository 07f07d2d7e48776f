//! Matching dataset columns to Common Data Elements.
//!
//! This crate proposes CDE codes for source columns, synthesizes a first
//! transform for each match, and holds the editable mapping table.
//!
//! # Example
//!
//! ```ignore
//! use cde_map::{MatchingEngine, TransformSynthesizer, build_initial};
//! use cde_model::MatchingOptions;
//!
//! let engine = MatchingEngine::new(MatchingOptions::default());
//! let outcome = engine.match_columns(&dataset.column_names(), &schema.codes())?;
//! let initial = build_initial(&outcome, &dataset, &schema, &TransformSynthesizer::default())?;
//! ```

pub mod embedding;
pub mod engine;
pub mod error;
pub mod repository;
pub mod score;
pub mod synthesize;
pub mod table;

pub use embedding::{CharBagEmbedder, CharTableEmbedder, Embedder};
pub use engine::{
    MatchFailure, MatchOutcome, MatchResult, MatchingEngine, SimilarityMatrix, parse_method,
};
pub use error::{MappingError, MatchError};
pub use repository::{
    MAPPING_FIELDS, MappingFormat, load_mapping, mapping_to_string, parse_mapping, save_mapping,
    save_mapping_as,
};
pub use score::{LexicalScorer, Scorer, cosine_distance, lexical_dissimilarity, lexical_ratio};
pub use synthesize::{Synthesis, SynthesisWarning, TransformSynthesizer};
pub use table::{InitialMapping, MappingTable, build_initial, validate};
