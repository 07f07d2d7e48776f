//! Dissimilarity measures used to rank CDE codes.
//!
//! Lexical scores use the normalized Indel similarity (the Levenshtein ratio
//! without substitutions), case-sensitive on the raw strings. Embedding
//! scores use the cosine distance between vectors. Both are "lower is better"
//! but live on different scales and must not be compared with each other.

use rapidfuzz::distance::indel;

/// Similarity ratio in `[0, 1]` between two strings; `1.0` means identical.
pub fn lexical_ratio(a: &str, b: &str) -> f64 {
    indel::normalized_similarity(a.chars(), b.chars())
}

/// Lexical dissimilarity in `[0, 1]`.
pub fn lexical_dissimilarity(a: &str, b: &str) -> f64 {
    1.0 - lexical_ratio(a, b)
}

/// Cosine distance in `[0, 2]` between two vectors.
///
/// Returns `None` when the lengths differ. A zero vector has no direction, so
/// its distance to anything is `1.0` (orthogonal).
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(1.0);
    }
    let cosine = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
    Some(1.0 - cosine)
}

/// Pairwise string scorer used by the lexical strategy.
pub trait Scorer {
    /// Dissimilarity between `a` and `b`; lower is better.
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Edit-distance ratio scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalScorer;

impl Scorer for LexicalScorer {
    fn score(&self, a: &str, b: &str) -> f64 {
        lexical_dissimilarity(a, b)
    }
}
