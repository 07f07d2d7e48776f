//! Word embedding capabilities used by the embedding similarity methods.

use std::collections::BTreeMap;

use crate::error::MatchError;

/// Turns a word into a fixed-length vector.
pub trait Embedder {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &str;

    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;

    /// Embeds `word`, failing with [`MatchError::EmbeddingUnavailable`] when
    /// the word cannot be represented.
    fn embed(&self, word: &str) -> Result<Vec<f32>, MatchError>;
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed(&self, word: &str) -> Result<Vec<f32>, MatchError> {
        (**self).embed(word)
    }
}

/// Characters that take part in a character-level embedding.
fn embedding_chars(word: &str) -> impl Iterator<Item = char> + '_ {
    word.chars().flat_map(char::to_lowercase).filter(|c| *c != '_')
}

/// Sums per-character vectors from a lookup table.
///
/// The word is lower-cased and underscores are dropped before lookup. A
/// character missing from the table makes the whole word unavailable.
#[derive(Debug, Clone)]
pub struct CharTableEmbedder {
    name: String,
    dimension: usize,
    table: BTreeMap<char, Vec<f32>>,
}

impl CharTableEmbedder {
    /// Builds an embedder from a character table; all vectors must share one
    /// non-zero length and hold finite components.
    pub fn new(name: impl Into<String>, table: BTreeMap<char, Vec<f32>>) -> Result<Self, MatchError> {
        let name = name.into();
        let dimension = table.values().next().map_or(0, Vec::len);
        if dimension == 0 {
            return Err(MatchError::InvalidEmbeddingTable(format!(
                "{name}: table is empty"
            )));
        }
        if let Some((c, vector)) = table.iter().find(|(_, v)| v.len() != dimension) {
            return Err(MatchError::InvalidEmbeddingTable(format!(
                "{name}: vector for {c:?} has {} components, expected {dimension}",
                vector.len()
            )));
        }
        if let Some(c) = table
            .iter()
            .find_map(|(c, v)| v.iter().any(|x| !x.is_finite()).then_some(c))
        {
            return Err(MatchError::InvalidEmbeddingTable(format!(
                "{name}: vector for {c:?} has a non-finite component"
            )));
        }
        Ok(Self {
            name,
            dimension,
            table,
        })
    }

    pub fn contains(&self, c: char) -> bool {
        self.table.contains_key(&c)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Embedder for CharTableEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, word: &str) -> Result<Vec<f32>, MatchError> {
        let mut sum = vec![0.0_f32; self.dimension];
        let mut seen = 0usize;
        for c in embedding_chars(word) {
            let vector = self
                .table
                .get(&c)
                .ok_or_else(|| MatchError::unavailable(word, format!("{c:?} is not in the table")))?;
            for (acc, v) in sum.iter_mut().zip(vector) {
                *acc += v;
            }
            seen += 1;
        }
        if seen == 0 {
            return Err(MatchError::unavailable(word, "no characters to embed"));
        }
        Ok(sum)
    }
}

const BAG_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

/// Deterministic bag-of-characters counts over `[a-z0-9]` plus one bucket for
/// every other character.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharBagEmbedder;

impl CharBagEmbedder {
    pub const DIMENSION: usize = BAG_ALPHABET.len() + 1;
}

impl Embedder for CharBagEmbedder {
    fn name(&self) -> &str {
        "char-bag"
    }

    fn dimension(&self) -> usize {
        Self::DIMENSION
    }

    fn embed(&self, word: &str) -> Result<Vec<f32>, MatchError> {
        let mut counts = vec![0.0_f32; Self::DIMENSION];
        let mut seen = 0usize;
        for c in embedding_chars(word) {
            let slot = BAG_ALPHABET.find(c).unwrap_or(Self::DIMENSION - 1);
            counts[slot] += 1.0;
            seen += 1;
        }
        if seen == 0 {
            return Err(MatchError::unavailable(word, "no characters to embed"));
        }
        Ok(counts)
    }
}
