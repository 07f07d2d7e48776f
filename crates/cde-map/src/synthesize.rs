//! Initial transform proposals for matched (column, CDE) pairs.
//!
//! Numeric CDEs always get the neutral scale `"1.0"`. Categorical CDEs get a
//! relabel dictionary derived from the distinct column values and the CDE's
//! value domain; irregular shapes downgrade to a warning transform instead of
//! failing.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use cde_model::{
    CdeEntry, CdeType, CellValue, CollisionPolicy, MISSING_SENTINEL, NEUTRAL_SCALE, NO_TRANSFORM,
    RelabelMap, SynthesisOptions, ValueDomain, distinct_keys,
};

use crate::score::lexical_ratio;

/// A data-shape irregularity found while proposing a transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SynthesisWarning {
    /// The column holds nothing but missing values.
    AllMissing { column: String },
    /// More distinct column values than domain values; every value maps to
    /// `"nan"` until the user fixes the row.
    MustBeFixed {
        column: String,
        source_values: usize,
        domain_values: usize,
    },
    /// Positional pairing dropped values whose missing status disagreed.
    Incomplete {
        column: String,
        mapped: usize,
        source_values: usize,
    },
    /// Several column values were paired with the same domain value.
    DuplicateTargets {
        column: String,
        target: String,
        sources: Vec<String>,
    },
}

impl fmt::Display for SynthesisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllMissing { column } => {
                write!(f, "column '{column}' contains only missing values")
            }
            Self::MustBeFixed {
                column,
                source_values,
                domain_values,
            } => write!(
                f,
                "column '{column}' has {source_values} distinct values for {domain_values} domain values; the transform must be fixed"
            ),
            Self::Incomplete {
                column,
                mapped,
                source_values,
            } => write!(
                f,
                "column '{column}': only {mapped} of {source_values} values could be paired"
            ),
            Self::DuplicateTargets {
                column,
                target,
                sources,
            } => write!(
                f,
                "column '{column}': values {} all map to '{target}'",
                sources.join(", ")
            ),
        }
    }
}

/// A proposed transform string and the warnings raised while building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub transform: String,
    pub warnings: Vec<SynthesisWarning>,
}

impl Synthesis {
    fn clean(transform: impl Into<String>) -> Self {
        Self {
            transform: transform.into(),
            warnings: Vec::new(),
        }
    }
}

/// Proposes the initial `transform` of a mapping row.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformSynthesizer {
    options: SynthesisOptions,
}

impl TransformSynthesizer {
    pub fn new(options: SynthesisOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    /// Proposes a transform for `column` (with cell `values`) mapped to `cde`.
    pub fn synthesize(&self, column: &str, values: &[CellValue], cde: &CdeEntry) -> Synthesis {
        self.synthesize_keys(
            column,
            &distinct_keys(values),
            cde.cde_type,
            cde.values.as_ref(),
        )
    }

    /// Same as [`TransformSynthesizer::synthesize`], from the distinct
    /// stringified column values.
    pub fn synthesize_keys(
        &self,
        column: &str,
        source: &[String],
        cde_type: CdeType,
        domain: Option<&ValueDomain>,
    ) -> Synthesis {
        if cde_type.is_numeric() {
            return Synthesis::clean(NEUTRAL_SCALE);
        }
        let empty = ValueDomain::default();
        let domain = domain.unwrap_or(&empty);
        let targets: Vec<&str> = domain.codes().collect();

        if !source.is_empty() && source.iter().all(|v| v == MISSING_SENTINEL) {
            warn!(column, "column contains only missing values");
            return Synthesis {
                transform: NO_TRANSFORM.to_string(),
                warnings: vec![SynthesisWarning::AllMissing {
                    column: column.to_string(),
                }],
            };
        }

        match source.len().cmp(&targets.len()) {
            Ordering::Equal => self.pair_by_similarity(column, source, domain),
            Ordering::Less => pair_by_position(column, source, &targets),
            Ordering::Greater => {
                warn!(
                    column,
                    source_values = source.len(),
                    domain_values = targets.len(),
                    "more column values than domain values"
                );
                let map = RelabelMap::from_pairs(source.iter().map(|v| (v.as_str(), NO_TRANSFORM)));
                Synthesis {
                    transform: map.to_literal(),
                    warnings: vec![SynthesisWarning::MustBeFixed {
                        column: column.to_string(),
                        source_values: source.len(),
                        domain_values: targets.len(),
                    }],
                }
            }
        }
    }

    fn pair_by_similarity(&self, column: &str, source: &[String], domain: &ValueDomain) -> Synthesis {
        let scores: Vec<Vec<f64>> = source
            .iter()
            .map(|value| {
                domain
                    .values()
                    .iter()
                    .map(|target| {
                        lexical_ratio(value, &target.code).max(lexical_ratio(value, &target.label))
                    })
                    .collect()
            })
            .collect();

        let assignment = match self.options.collision_policy {
            CollisionPolicy::Preserve => best_per_source(&scores),
            CollisionPolicy::Deduplicate => greedy_one_to_one(&scores),
        };

        let map = RelabelMap::from_pairs(
            source
                .iter()
                .zip(&assignment)
                .map(|(value, idx)| (value.as_str(), domain.values()[*idx].code.as_str())),
        );

        let mut by_target: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for (value, target) in map.iter() {
            by_target.entry(target).or_default().push(value.to_string());
        }
        let warnings: Vec<SynthesisWarning> = by_target
            .into_iter()
            .filter(|(_, sources)| sources.len() > 1)
            .map(|(target, sources)| SynthesisWarning::DuplicateTargets {
                column: column.to_string(),
                target: target.to_string(),
                sources,
            })
            .collect();
        if !warnings.is_empty() {
            warn!(column, collisions = warnings.len(), "several values share a target");
        }

        Synthesis {
            transform: map.to_literal(),
            warnings,
        }
    }
}

/// Index of the first best-scoring target for each source value.
fn best_per_source(scores: &[Vec<f64>]) -> Vec<usize> {
    scores
        .iter()
        .map(|row| {
            let mut best = 0;
            for (idx, score) in row.iter().enumerate() {
                if *score > row[best] {
                    best = idx;
                }
            }
            best
        })
        .collect()
}

/// One-to-one assignment taking pairs by descending score, ties by source
/// then target order.
fn greedy_one_to_one(scores: &[Vec<f64>]) -> Vec<usize> {
    let mut pairs: Vec<(usize, usize, f64)> = scores
        .iter()
        .enumerate()
        .flat_map(|(s, row)| row.iter().enumerate().map(move |(t, score)| (s, t, *score)))
        .collect();
    pairs.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
            .then_with(|| a.1.cmp(&b.1))
    });

    let width = scores.first().map_or(0, Vec::len);
    let mut assignment = vec![None; scores.len()];
    let mut taken = vec![false; width];
    for (source, target, _) in pairs {
        if assignment[source].is_none() && !taken[target] {
            assignment[source] = Some(target);
            taken[target] = true;
        }
    }
    assignment.into_iter().map(|a| a.unwrap_or(0)).collect()
}

fn pair_by_position(column: &str, source: &[String], targets: &[&str]) -> Synthesis {
    let map = RelabelMap::from_pairs(
        source
            .iter()
            .zip(targets)
            .filter(|(value, target)| {
                (value.as_str() == MISSING_SENTINEL) == (**target == MISSING_SENTINEL)
            })
            .map(|(value, target)| (value.as_str(), *target)),
    );
    let mut warnings = Vec::new();
    if map.len() < source.len() {
        warn!(
            column,
            mapped = map.len(),
            source_values = source.len(),
            "positional pairing dropped values"
        );
        warnings.push(SynthesisWarning::Incomplete {
            column: column.to_string(),
            mapped: map.len(),
            source_values: source.len(),
        });
    }
    Synthesis {
        transform: map.to_literal(),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn domain(pairs: &[(&str, &str)]) -> ValueDomain {
        ValueDomain::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn numeric_cde_gets_neutral_scale() {
        let synthesis = TransformSynthesizer::default().synthesize_keys(
            "age_years",
            &keys(&["34", "nan"]),
            CdeType::Integer,
            None,
        );
        assert_eq!(synthesis, Synthesis::clean("1.0"));
    }

    #[test]
    fn all_missing_column_is_no_transform() {
        let d = domain(&[("0", "No"), ("1", "Yes")]);
        let synthesis = TransformSynthesizer::default().synthesize_keys(
            "flag",
            &keys(&["nan"]),
            CdeType::Binomial,
            Some(&d),
        );
        assert_eq!(synthesis.transform, "nan");
        assert!(matches!(
            synthesis.warnings.as_slice(),
            [SynthesisWarning::AllMissing { .. }]
        ));
    }

    #[test]
    fn all_missing_even_when_domain_has_nan() {
        let d = domain(&[("nan", "Unknown"), ("1", "Yes")]);
        let synthesis = TransformSynthesizer::default().synthesize_keys(
            "flag",
            &keys(&["nan"]),
            CdeType::Binomial,
            Some(&d),
        );
        assert_eq!(synthesis.transform, "nan");
    }

    #[test]
    fn fewer_values_pair_by_position_and_match_missing_status() {
        let d = domain(&[("0", "A"), ("nan", "Unknown"), ("2", "C")]);
        let synthesis = TransformSynthesizer::default().synthesize_keys(
            "grade",
            &keys(&["x", "y"]),
            CdeType::Multinomial,
            Some(&d),
        );
        assert_eq!(synthesis.transform, r#"{"x": "0"}"#);
        assert!(matches!(
            synthesis.warnings.as_slice(),
            [SynthesisWarning::Incomplete { mapped: 1, source_values: 2, .. }]
        ));
    }

    #[test]
    fn more_values_map_to_nan() {
        let d = domain(&[("0", "No"), ("1", "Yes")]);
        let synthesis = TransformSynthesizer::default().synthesize_keys(
            "answer",
            &keys(&["y", "n", "maybe"]),
            CdeType::Binomial,
            Some(&d),
        );
        assert_eq!(
            synthesis.transform,
            r#"{"y": "nan", "n": "nan", "maybe": "nan"}"#
        );
        assert!(matches!(
            synthesis.warnings.as_slice(),
            [SynthesisWarning::MustBeFixed { source_values: 3, domain_values: 2, .. }]
        ));
    }

    #[test]
    fn greedy_assignment_resolves_collisions() {
        // both sources prefer target 0; the stronger one keeps it
        let scores = vec![vec![0.9, 0.1], vec![0.8, 0.2]];
        assert_eq!(best_per_source(&scores), vec![0, 0]);
        assert_eq!(greedy_one_to_one(&scores), vec![0, 1]);
    }
}
