//! Stages shared by the commands: embedder selection, matching and applying.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use cde_ingest::read_char_embeddings;
use cde_map::{
    CharBagEmbedder, Embedder, InitialMapping, MappingTable, MatchOutcome, MatchingEngine,
    TransformSynthesizer, build_initial,
};
use cde_model::{Dataset, MatchingOptions, OutputOrder, Schema, SimilarityMethod, SynthesisOptions};
use cde_transform::{ApplyError, ApplyOutcome, apply, apply_checked};

/// Picks the embedder for `method`.
///
/// The character-embedding method needs a table file. No learned model ships
/// with the binary, so the learned method substitutes the character-bag
/// embedder and says so in the log and the match summary.
pub fn build_embedder(
    method: SimilarityMethod,
    table: Option<&Path>,
) -> Result<Option<Box<dyn Embedder>>> {
    match method {
        SimilarityMethod::Lexical => Ok(None),
        SimilarityMethod::CharEmbedding => {
            let Some(path) = table else {
                bail!("the char-embedding method needs --embeddings or CDE_MAPPER_EMBEDDINGS");
            };
            let embedder = read_char_embeddings(path)
                .with_context(|| format!("load embeddings {}", path.display()))?;
            Ok(Some(Box::new(embedder)))
        }
        SimilarityMethod::LearnedEmbedding => {
            if let Some(path) = table {
                warn!(path = %path.display(), "embedding table ignored by the learned method");
            }
            warn!(
                embedder = CharBagEmbedder.name(),
                "no learned model available; using character counts instead"
            );
            Ok(Some(Box::new(CharBagEmbedder)))
        }
    }
}

/// Candidates and the initial mapping table for one dataset.
#[derive(Debug)]
pub struct MatchRun {
    pub outcome: MatchOutcome,
    pub initial: InitialMapping,
}

/// Matches every dataset column and seeds the mapping table from the best
/// candidates.
pub fn run_matching(
    dataset: &Dataset,
    schema: &Schema,
    options: MatchingOptions,
    synthesis: SynthesisOptions,
    embedder: Option<Box<dyn Embedder>>,
) -> Result<MatchRun> {
    let mut engine = MatchingEngine::new(options);
    if let Some(embedder) = embedder {
        engine = engine.with_embedder(embedder);
    }

    let outcome = engine
        .match_columns(&dataset.column_names(), &schema.codes())
        .context("match dataset columns")?;
    let synthesizer = TransformSynthesizer::new(synthesis);
    let initial = build_initial(&outcome, dataset, schema, &synthesizer)
        .context("build initial mapping table")?;
    info!(
        rows = initial.table.len(),
        warnings = initial.warnings.len(),
        "matching complete"
    );
    Ok(MatchRun { outcome, initial })
}

/// One-line description of how `outcome` was ranked.
///
/// Flags the character-bag stand-in when the learned method ran without a
/// learned model.
pub fn describe_method(outcome: &MatchOutcome) -> String {
    match outcome.embedding_model.as_deref() {
        None => outcome.method.to_string(),
        Some(model)
            if outcome.method == SimilarityMethod::LearnedEmbedding
                && model == CharBagEmbedder.name() =>
        {
            format!(
                "{} (model: {model}; character counts substituted for a learned model)",
                outcome.method
            )
        }
        Some(model) => format!("{} (model: {model})", outcome.method),
    }
}

/// Applies `table`, checking it first when a schema is given.
///
/// Without a schema the output is always in table order.
pub fn run_apply(
    dataset: &Dataset,
    table: &MappingTable,
    schema: Option<&Schema>,
    order: OutputOrder,
) -> Result<ApplyOutcome, ApplyError> {
    match schema {
        Some(schema) => apply_checked(dataset, table.rows(), schema, order),
        None => {
            warn!("no schema given; mapping table applied without checks");
            Ok(apply(dataset, table.rows(), None))
        }
    }
}
