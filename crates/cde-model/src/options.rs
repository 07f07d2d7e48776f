//! Configuration options for matching, transform synthesis, and output.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default number of candidate codes kept per source column.
pub const DEFAULT_TOP_K: usize = 10;

/// Similarity strategy used to rank CDE codes for a source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimilarityMethod {
    /// Normalized edit-distance ratio on the raw strings.
    #[default]
    Lexical,
    /// Sum of per-character vectors from a lookup table.
    CharEmbedding,
    /// A learned character-level model supplied by the caller.
    LearnedEmbedding,
}

impl SimilarityMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityMethod::Lexical => "lexical",
            SimilarityMethod::CharEmbedding => "char-embedding",
            SimilarityMethod::LearnedEmbedding => "learned-embedding",
        }
    }

    pub fn uses_embeddings(&self) -> bool {
        !matches!(self, SimilarityMethod::Lexical)
    }
}

impl fmt::Display for SimilarityMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimilarityMethod {
    type Err = String;

    /// Accepts the canonical names and the historical `fuzzy`, `glove` and
    /// `chars2vec` names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lexical" | "fuzzy" => Ok(SimilarityMethod::Lexical),
            "char-embedding" | "glove" => Ok(SimilarityMethod::CharEmbedding),
            "learned-embedding" | "chars2vec" => Ok(SimilarityMethod::LearnedEmbedding),
            _ => Err(format!("Unknown similarity method: {s}")),
        }
    }
}

/// Options for the similarity engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingOptions {
    /// Number of candidates kept per column (must be at least 1).
    pub top_k: usize,
    pub method: SimilarityMethod,
    /// Identifier of the embedding model, if any.
    pub embedding_model: Option<String>,
}

impl Default for MatchingOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            method: SimilarityMethod::default(),
            embedding_model: None,
        }
    }
}

impl MatchingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: SimilarityMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }
}

/// What to do when two source values pick the same domain value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Keep every best match, duplicates included, and warn.
    #[default]
    Preserve,
    /// Greedy one-to-one assignment by descending similarity.
    Deduplicate,
}

/// Options for the transform synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SynthesisOptions {
    pub collision_policy: CollisionPolicy,
}

impl SynthesisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }
}

/// Column layout of the transformed dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputOrder {
    /// One column per mapping row, in row order.
    #[default]
    Unordered,
    /// One column per schema code, in schema order; unmapped codes are empty.
    SchemaOrdered,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_aliases() {
        assert_eq!(
            "fuzzy".parse::<SimilarityMethod>().unwrap(),
            SimilarityMethod::Lexical
        );
        assert_eq!(
            "GloVe".parse::<SimilarityMethod>().unwrap(),
            SimilarityMethod::CharEmbedding
        );
        assert_eq!(
            "chars2vec".parse::<SimilarityMethod>().unwrap(),
            SimilarityMethod::LearnedEmbedding
        );
        assert!("word2vec".parse::<SimilarityMethod>().is_err());
    }

    #[test]
    fn defaults() {
        let options = MatchingOptions::default();
        assert_eq!(options.top_k, 10);
        assert_eq!(options.method, SimilarityMethod::Lexical);
        assert_eq!(
            SynthesisOptions::default().collision_policy,
            CollisionPolicy::Preserve
        );
    }
}
