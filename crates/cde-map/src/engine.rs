//! Similarity engine: ranks schema CDE codes for every source column.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cde_model::{MatchingOptions, SimilarityMethod};

use crate::embedding::Embedder;
use crate::error::MatchError;
use crate::score::{LexicalScorer, Scorer, cosine_distance};

/// Parses a similarity method name, accepting the historical `fuzzy`,
/// `glove` and `chars2vec` names.
pub fn parse_method(name: &str) -> Result<SimilarityMethod, MatchError> {
    name.parse()
        .map_err(|_| MatchError::UnknownMethod(name.to_string()))
}

/// Ranked candidate codes for one source column.
///
/// `words`, `distances` and `embeddings` are parallel and ordered from best
/// to worst match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub column: String,
    pub words: Vec<String>,
    pub distances: Vec<f64>,
    /// Embedding of each candidate code; `None` for the lexical method.
    pub embeddings: Vec<Option<Vec<f32>>>,
    /// Embedding of the column name itself; `None` for the lexical method.
    pub query_embedding: Option<Vec<f32>>,
}

impl MatchResult {
    /// Best candidate code, if any.
    pub fn best(&self) -> Option<&str> {
        self.words.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// `(code, distance)` pairs from best to worst.
    pub fn candidates(&self) -> impl Iterator<Item = (&str, f64)> {
        self.words
            .iter()
            .map(String::as_str)
            .zip(self.distances.iter().copied())
    }
}

/// A source column the embedder could not represent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFailure {
    pub column: String,
    pub reason: String,
}

/// Column-by-code dissimilarities, computed once per request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    columns: Vec<String>,
    codes: Vec<String>,
    distances: Vec<Vec<f64>>,
}

impl SimilarityMatrix {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// Distances from `column` to every code, in schema order.
    pub fn row(&self, column: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| self.distances[idx].as_slice())
    }

    pub fn get(&self, column: &str, code: &str) -> Option<f64> {
        let code_idx = self.codes.iter().position(|c| c == code)?;
        self.row(column)
            .and_then(|row| row.get(code_idx).copied())
    }

    /// Code indices of `row` ranked by ascending distance, ties in schema
    /// order, truncated to `k`.
    ///
    /// A NaN distance ranks after every other distance.
    fn ranked(row: &[f64], k: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..row.len()).collect();
        order.sort_by(|a, b| {
            let (x, y) = (row[*a], row[*b]);
            x.is_nan()
                .cmp(&y.is_nan())
                .then_with(|| x.total_cmp(&y))
                .then_with(|| a.cmp(b))
        });
        order.truncate(k);
        order
    }
}

/// Result of matching a set of columns against the schema codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub method: SimilarityMethod,
    /// Embedding model used to rank; `None` for lexical matching.
    pub embedding_model: Option<String>,
    /// One result per matched column, in input order.
    pub results: Vec<MatchResult>,
    /// Columns left out because they could not be embedded.
    pub failures: Vec<MatchFailure>,
    pub matrix: SimilarityMatrix,
}

impl MatchOutcome {
    pub fn get(&self, column: &str) -> Option<&MatchResult> {
        self.results.iter().find(|r| r.column == column)
    }

    /// `(column, best code)` pairs in input order.
    pub fn best_matches(&self) -> Vec<(&str, &str)> {
        self.results
            .iter()
            .filter_map(|r| r.best().map(|code| (r.column.as_str(), code)))
            .collect()
    }
}

/// Engine for proposing CDE codes for dataset columns.
///
/// # Example
///
/// ```ignore
/// use cde_map::MatchingEngine;
/// use cde_model::MatchingOptions;
///
/// let engine = MatchingEngine::new(MatchingOptions::default().with_top_k(3));
/// let outcome = engine.match_columns(&columns, &schema.codes())?;
/// ```
pub struct MatchingEngine {
    options: MatchingOptions,
    embedder: Option<Box<dyn Embedder>>,
}

impl MatchingEngine {
    pub fn new(options: MatchingOptions) -> Self {
        Self {
            options,
            embedder: None,
        }
    }

    /// Uses `embedder` for the embedding methods.
    #[must_use]
    pub fn with_embedder(mut self, embedder: impl Embedder + 'static) -> Self {
        self.embedder = Some(Box::new(embedder));
        self
    }

    pub fn options(&self) -> &MatchingOptions {
        &self.options
    }

    /// Ranks `codes` for each of `columns`.
    ///
    /// Each result keeps `min(top_k, codes.len())` candidates. A column the
    /// embedder cannot represent is reported in [`MatchOutcome::failures`];
    /// a code it cannot represent fails the whole request.
    pub fn match_columns(
        &self,
        columns: &[String],
        codes: &[String],
    ) -> Result<MatchOutcome, MatchError> {
        if self.options.top_k == 0 {
            return Err(MatchError::InvalidTopK);
        }
        if codes.is_empty() {
            return Err(MatchError::EmptySchema);
        }
        info!(
            method = %self.options.method,
            columns = columns.len(),
            codes = codes.len(),
            top_k = self.options.top_k,
            "matching dataset columns to CDE codes"
        );

        let outcome = match self.options.method {
            SimilarityMethod::Lexical => self.match_lexical(columns, codes),
            method => {
                let embedder = self
                    .embedder
                    .as_deref()
                    .ok_or(MatchError::MissingEmbedder(method))?;
                self.match_embedded(embedder, columns, codes)?
            }
        };

        if !outcome.failures.is_empty() {
            warn!(
                failed = outcome.failures.len(),
                "some columns could not be embedded and were left unmatched"
            );
        }
        Ok(outcome)
    }

    fn match_lexical(&self, columns: &[String], codes: &[String]) -> MatchOutcome {
        let scorer = LexicalScorer;
        let mut matrix = SimilarityMatrix {
            columns: Vec::with_capacity(columns.len()),
            codes: codes.to_vec(),
            distances: Vec::with_capacity(columns.len()),
        };
        let mut results = Vec::with_capacity(columns.len());

        for column in columns {
            let row: Vec<f64> = codes.iter().map(|code| scorer.score(column, code)).collect();
            let ranked = SimilarityMatrix::ranked(&row, self.options.top_k);
            let result = MatchResult {
                column: column.clone(),
                words: ranked.iter().map(|idx| codes[*idx].clone()).collect(),
                distances: ranked.iter().map(|idx| row[*idx]).collect(),
                embeddings: vec![None; ranked.len()],
                query_embedding: None,
            };
            debug!(column = %column, best = ?result.best(), "ranked candidates");
            matrix.columns.push(column.clone());
            matrix.distances.push(row);
            results.push(result);
        }

        MatchOutcome {
            method: SimilarityMethod::Lexical,
            embedding_model: None,
            results,
            failures: Vec::new(),
            matrix,
        }
    }

    fn match_embedded(
        &self,
        embedder: &dyn Embedder,
        columns: &[String],
        codes: &[String],
    ) -> Result<MatchOutcome, MatchError> {
        let code_vectors = codes
            .iter()
            .map(|code| embedder.embed(code))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            embedder = embedder.name(),
            dimension = embedder.dimension(),
            "embedded schema codes"
        );

        let mut matrix = SimilarityMatrix {
            columns: Vec::with_capacity(columns.len()),
            codes: codes.to_vec(),
            distances: Vec::with_capacity(columns.len()),
        };
        let mut results = Vec::with_capacity(columns.len());
        let mut failures = Vec::new();

        for column in columns {
            let row = embedder.embed(column).and_then(|query| {
                let row = code_vectors
                    .iter()
                    .map(|v| {
                        cosine_distance(&query, v).ok_or_else(|| {
                            MatchError::unavailable(column, "embedding dimensions differ")
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((query, row))
            });
            let (query, row) = match row {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(column = %column, error = %err, "column left unmatched");
                    failures.push(MatchFailure {
                        column: column.clone(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let ranked = SimilarityMatrix::ranked(&row, self.options.top_k);
            let result = MatchResult {
                column: column.clone(),
                words: ranked.iter().map(|idx| codes[*idx].clone()).collect(),
                distances: ranked.iter().map(|idx| row[*idx]).collect(),
                embeddings: ranked
                    .iter()
                    .map(|idx| Some(code_vectors[*idx].clone()))
                    .collect(),
                query_embedding: Some(query),
            };
            debug!(column = %column, best = ?result.best(), "ranked candidates");
            matrix.columns.push(column.clone());
            matrix.distances.push(row);
            results.push(result);
        }

        let embedding_model = self
            .options
            .embedding_model
            .clone()
            .unwrap_or_else(|| embedder.name().to_string());
        Ok(MatchOutcome {
            method: self.options.method,
            embedding_model: Some(embedding_model),
            results,
            failures,
            matrix,
        })
    }
}
