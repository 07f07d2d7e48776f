//! The mapping table: one row per source column bound to a CDE code.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cde_model::{
    CdeEntry, CellValue, Dataset, MappingRow, ModelError, NEUTRAL_SCALE, PLACEHOLDER_MAP, Schema,
    Transform, Violation,
};

use crate::engine::{MatchOutcome, MatchResult};
use crate::error::MappingError;
use crate::synthesize::{SynthesisWarning, TransformSynthesizer};

/// Ordered mapping rows with single-owner editing.
///
/// Edits never enforce the table invariants; call [`MappingTable::validate`]
/// to list what is wrong before applying the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingTable {
    rows: Vec<MappingRow>,
}

/// A freshly seeded table and the warnings raised while filling transforms.
#[derive(Debug, Clone)]
pub struct InitialMapping {
    pub table: MappingTable,
    pub warnings: Vec<SynthesisWarning>,
    /// Dataset columns without a match result.
    pub skipped: Vec<String>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<MappingRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[MappingRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<MappingRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MappingRow> {
        self.rows.get(index)
    }

    /// First row targeting `code`.
    pub fn find_by_code(&self, code: &str) -> Option<(usize, &MappingRow)> {
        self.rows.iter().enumerate().find(|(_, r)| r.cde_code == code)
    }

    pub fn push(&mut self, row: MappingRow) {
        self.rows.push(row);
    }

    pub fn remove(&mut self, index: usize) -> Result<MappingRow, MappingError> {
        self.check_index(index)?;
        Ok(self.rows.remove(index))
    }

    /// Replaces the row at `index`, returning the old one.
    pub fn replace(&mut self, index: usize, row: MappingRow) -> Result<MappingRow, MappingError> {
        self.check_index(index)?;
        Ok(std::mem::replace(&mut self.rows[index], row))
    }

    /// Points row `index` at `code`, re-deriving its CDE type, transform type
    /// and transform.
    ///
    /// With `values` the transform is synthesized from the column; without
    /// them it falls back to `"1.0"` or the placeholder dictionary.
    pub fn set_cde_code(
        &mut self,
        index: usize,
        code: &str,
        schema: &Schema,
        values: Option<&[CellValue]>,
        synthesizer: &TransformSynthesizer,
    ) -> Result<Vec<SynthesisWarning>, MappingError> {
        self.check_index(index)?;
        let cde = schema
            .get(code)
            .ok_or_else(|| MappingError::UnknownCode(code.to_string()))?;
        let column = self.rows[index].dataset_column.clone();
        let (row, warnings) = seed_row(&column, cde, values, synthesizer);
        debug!(row = index, column = %column, code, "CDE code changed");
        self.rows[index] = row;
        Ok(warnings)
    }

    /// Appends a row for `column`, seeded with its best match.
    pub fn add_column(
        &mut self,
        matches: &MatchResult,
        schema: &Schema,
        values: Option<&[CellValue]>,
        synthesizer: &TransformSynthesizer,
    ) -> Result<Vec<SynthesisWarning>, MappingError> {
        let code = matches
            .best()
            .ok_or_else(|| MappingError::NoCandidates(matches.column.clone()))?;
        let cde = schema
            .get(code)
            .ok_or_else(|| MappingError::UnknownCode(code.to_string()))?;
        let (row, warnings) = seed_row(&matches.column, cde, values, synthesizer);
        self.rows.push(row);
        Ok(warnings)
    }

    /// Lists every broken invariant; see [`validate`].
    pub fn validate(&self, schema: &Schema) -> Vec<Violation> {
        validate(&self.rows, schema)
    }

    fn check_index(&self, index: usize) -> Result<(), MappingError> {
        if index < self.rows.len() {
            Ok(())
        } else {
            Err(MappingError::RowOutOfRange {
                index,
                len: self.rows.len(),
            })
        }
    }
}

impl From<Vec<MappingRow>> for MappingTable {
    fn from(rows: Vec<MappingRow>) -> Self {
        Self::from_rows(rows)
    }
}

impl<'a> IntoIterator for &'a MappingTable {
    type Item = &'a MappingRow;
    type IntoIter = std::slice::Iter<'a, MappingRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn seed_row(
    column: &str,
    cde: &CdeEntry,
    values: Option<&[CellValue]>,
    synthesizer: &TransformSynthesizer,
) -> (MappingRow, Vec<SynthesisWarning>) {
    let (transform, warnings) = match values {
        Some(values) => {
            let synthesis = synthesizer.synthesize(column, values, cde);
            (synthesis.transform, synthesis.warnings)
        }
        None if cde.cde_type.is_numeric() => (NEUTRAL_SCALE.to_string(), Vec::new()),
        None => (PLACEHOLDER_MAP.to_string(), Vec::new()),
    };
    (
        MappingRow::new(column, cde.code.as_str(), cde.cde_type, transform),
        warnings,
    )
}

/// Seeds one row per dataset column from its best match, in dataset order.
///
/// Columns without a match result (for example ones the embedder could not
/// represent) are skipped with a warning. A best match that is not in
/// `schema` is an error.
pub fn build_initial(
    outcome: &MatchOutcome,
    dataset: &Dataset,
    schema: &Schema,
    synthesizer: &TransformSynthesizer,
) -> Result<InitialMapping, MappingError> {
    let mut table = MappingTable::new();
    let mut warnings = Vec::new();
    let mut skipped = Vec::new();

    for column in dataset.columns() {
        let Some(matches) = outcome.get(&column.name) else {
            warn!(column = %column.name, "no match result; column skipped");
            skipped.push(column.name.clone());
            continue;
        };
        warnings.extend(table.add_column(matches, schema, Some(&column.values), synthesizer)?);
    }

    info!(
        rows = table.len(),
        skipped = skipped.len(),
        warnings = warnings.len(),
        "initial mapping table built"
    );
    Ok(InitialMapping {
        table,
        warnings,
        skipped,
    })
}

/// Checks `rows` against `schema` and reports every violation, in row order.
///
/// Nothing is fixed: duplicate codes, unknown codes, unparseable transforms
/// and type disagreements are all returned so they can be corrected in one
/// pass.
pub fn validate(rows: &[MappingRow], schema: &Schema) -> Vec<Violation> {
    let mut violations = Vec::new();

    let mut by_code: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, row) in rows.iter().enumerate() {
        by_code.entry(row.cde_code.as_str()).or_default().push(idx);
    }
    let mut duplicates: Vec<(&str, Vec<usize>)> = by_code
        .into_iter()
        .filter(|(_, idxs)| idxs.len() > 1)
        .collect();
    duplicates.sort_by_key(|(_, idxs)| idxs[0]);
    for (code, idxs) in duplicates {
        violations.push(Violation::DuplicateCdeCode {
            cde_code: code.to_string(),
            rows: idxs,
        });
    }

    for (idx, row) in rows.iter().enumerate() {
        match schema.get(&row.cde_code) {
            None => violations.push(Violation::UnknownCdeCode {
                row: idx,
                cde_code: row.cde_code.clone(),
            }),
            Some(cde) if cde.cde_type != row.cde_type => {
                violations.push(Violation::CdeTypeMismatch {
                    row: idx,
                    cde_code: row.cde_code.clone(),
                    declared: cde.cde_type,
                    found: row.cde_type,
                });
            }
            Some(_) => {}
        }

        if row.transform_type != row.cde_type.transform_type() {
            violations.push(Violation::TransformTypeMismatch {
                row: idx,
                cde_type: row.cde_type,
                transform_type: row.transform_type,
            });
        }

        if let Err(err) = Transform::parse(row.transform_type, &row.transform) {
            let message = match err {
                ModelError::InvalidTransform { message, .. } => message,
                other => other.to_string(),
            };
            violations.push(Violation::InvalidTransform {
                row: idx,
                transform: row.transform.clone(),
                message,
            });
        }
    }

    if !violations.is_empty() {
        debug!(violations = violations.len(), "mapping table has violations");
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use cde_model::{CdeType, TransformType, ValueDomain};

    fn schema() -> Schema {
        Schema::new(vec![
            CdeEntry::numeric("age", CdeType::Integer),
            CdeEntry::categorical(
                "sex",
                CdeType::Multinomial,
                ValueDomain::from_pairs([("0", "Male"), ("1", "Female")]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn remove_and_replace_check_bounds() {
        let mut table = MappingTable::new();
        table.push(MappingRow::new("age_years", "age", CdeType::Integer, "1.0"));
        assert!(matches!(
            table.remove(3),
            Err(MappingError::RowOutOfRange { index: 3, len: 1 })
        ));
        let old = table
            .replace(0, MappingRow::new("years", "age", CdeType::Integer, "2.0"))
            .unwrap();
        assert_eq!(old.dataset_column, "age_years");
        assert_eq!(table.remove(0).unwrap().dataset_column, "years");
        assert!(table.is_empty());
    }

    #[test]
    fn set_cde_code_cascades_defaults() {
        let schema = schema();
        let synthesizer = TransformSynthesizer::default();
        let mut table = MappingTable::from_rows(vec![MappingRow::new(
            "gender",
            "age",
            CdeType::Integer,
            "1.0",
        )]);
        let warnings = table
            .set_cde_code(0, "sex", &schema, None, &synthesizer)
            .unwrap();
        assert!(warnings.is_empty());
        let row = table.get(0).unwrap();
        assert_eq!(row.cde_type, CdeType::Multinomial);
        assert_eq!(row.transform_type, TransformType::Map);
        assert_eq!(row.transform, PLACEHOLDER_MAP);
        assert!(matches!(
            table.set_cde_code(0, "bmi", &schema, None, &synthesizer),
            Err(MappingError::UnknownCode(_))
        ));
    }

    #[test]
    fn validate_reports_duplicates_once() {
        let rows = vec![
            MappingRow::new("a", "age", CdeType::Integer, "1.0"),
            MappingRow::new("b", "age", CdeType::Integer, "1.0"),
            MappingRow::new("c", "age", CdeType::Integer, "1.0"),
        ];
        let violations = validate(&rows, &schema());
        assert_eq!(
            violations,
            vec![Violation::DuplicateCdeCode {
                cde_code: "age".into(),
                rows: vec![0, 1, 2],
            }]
        );
    }
}
