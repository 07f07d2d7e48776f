//! Applies a mapping table to a source dataset.

use tracing::{debug, info, warn};

use cde_model::{Column, Dataset, MappingRow, ModelError, OutputOrder, Schema, Transform};

use crate::error::ApplyError;
use crate::relabel::Relabeler;
use crate::scale::{NumericKind, scale_values};
use crate::types::{ApplyOutcome, TransformWarning};

/// Transforms `source` according to `rows`.
///
/// Without `schema_codes` the output has one column per row, in row order;
/// rows whose source column is absent are skipped. With `schema_codes` the
/// output has one column per code, in that order; a code without a row, or
/// whose source column is absent, becomes an all-missing column.
///
/// The table is not validated. Problems with single columns are recovered
/// and reported in [`ApplyOutcome::warnings`].
pub fn apply(source: &Dataset, rows: &[MappingRow], schema_codes: Option<&[String]>) -> ApplyOutcome {
    let mut executor = Executor::new(source);
    match schema_codes {
        None => {
            for row in rows {
                match source.column(&row.dataset_column) {
                    Some(column) => {
                        let column = transform_column(column, row, &mut executor.warnings);
                        executor.push(column);
                    }
                    None => executor.missing_source(row),
                }
            }
        }
        Some(codes) => {
            for code in codes {
                let Some(row) = rows.iter().find(|r| &r.cde_code == code) else {
                    debug!(cde_code = %code, "no mapping row; emitting empty column");
                    executor.warnings.push(TransformWarning::Unmapped {
                        cde_code: code.clone(),
                    });
                    executor.push(Column::missing(code.as_str(), source.row_count()));
                    continue;
                };
                match source.column(&row.dataset_column) {
                    Some(column) => {
                        let column = transform_column(column, row, &mut executor.warnings);
                        executor.push(column);
                    }
                    None => {
                        executor.missing_source(row);
                        executor.push(Column::missing(code.as_str(), source.row_count()));
                    }
                }
            }
        }
    }
    executor.finish()
}

/// Validates `rows` against `schema`, then applies them in `order`.
///
/// Any violation blocks the transformation and the complete list is
/// returned.
pub fn apply_checked(
    source: &Dataset,
    rows: &[MappingRow],
    schema: &Schema,
    order: OutputOrder,
) -> Result<ApplyOutcome, ApplyError> {
    let violations = cde_map::validate(rows, schema);
    if !violations.is_empty() {
        warn!(violations = violations.len(), "mapping table is invalid");
        return Err(ApplyError::InvalidMapping { violations });
    }
    let outcome = match order {
        OutputOrder::Unordered => apply(source, rows, None),
        OutputOrder::SchemaOrdered => {
            let codes = schema.codes();
            apply(source, rows, Some(codes.as_slice()))
        }
    };
    Ok(outcome)
}

struct Executor {
    dataset: Dataset,
    warnings: Vec<TransformWarning>,
}

impl Executor {
    fn new(source: &Dataset) -> Self {
        Self {
            dataset: Dataset::with_rows(source.row_count()),
            warnings: Vec::new(),
        }
    }

    fn push(&mut self, column: Column) {
        let name = column.name.clone();
        match self.dataset.push(column) {
            Ok(()) => {}
            Err(ModelError::DuplicateColumn(_)) => {
                warn!(cde_code = %name, "output column already exists; row skipped");
                self.warnings
                    .push(TransformWarning::DuplicateOutput { cde_code: name });
            }
            Err(err) => {
                // column lengths always equal the source row count
                warn!(cde_code = %name, error = %err, "output column rejected");
            }
        }
    }

    fn missing_source(&mut self, row: &MappingRow) {
        warn!(
            dataset_column = %row.dataset_column,
            cde_code = %row.cde_code,
            "source column not found"
        );
        self.warnings.push(TransformWarning::MissingSourceColumn {
            dataset_column: row.dataset_column.clone(),
            cde_code: row.cde_code.clone(),
        });
    }

    fn finish(self) -> ApplyOutcome {
        info!(
            columns = self.dataset.width(),
            rows = self.dataset.row_count(),
            warnings = self.warnings.len(),
            "dataset transformed"
        );
        ApplyOutcome {
            dataset: self.dataset,
            warnings: self.warnings,
        }
    }
}

/// Renames `column` to the row's CDE code and applies its transform.
pub fn transform_column(
    column: &Column,
    row: &MappingRow,
    warnings: &mut Vec<TransformWarning>,
) -> Column {
    let renamed = || Column::new(row.cde_code.as_str(), column.values.clone());
    let transform = match Transform::parse(row.transform_type, &row.transform) {
        Ok(transform) => transform,
        Err(err) => {
            warn!(cde_code = %row.cde_code, error = %err, "transform not applied");
            warnings.push(TransformWarning::InvalidTransform {
                cde_code: row.cde_code.clone(),
                message: err.to_string(),
            });
            return renamed();
        }
    };

    match transform {
        Transform::Identity => {
            warn!(cde_code = %row.cde_code, "no transformation applied");
            warnings.push(TransformWarning::NoTransform {
                cde_code: row.cde_code.clone(),
            });
            renamed()
        }
        Transform::Scale(factor) => {
            let kind = NumericKind::for_cde(row.cde_type);
            match scale_values(&column.values, kind, factor) {
                Ok(values) => Column::new(row.cde_code.as_str(), values),
                Err(bad) => {
                    warn!(
                        dataset_column = %row.dataset_column,
                        cde_code = %row.cde_code,
                        cde_type = %row.cde_type,
                        "cast failed; column left unscaled"
                    );
                    warnings.push(TransformWarning::CastFailed {
                        dataset_column: row.dataset_column.clone(),
                        cde_code: row.cde_code.clone(),
                        cde_type: row.cde_type,
                        value: bad.to_key(),
                    });
                    renamed()
                }
            }
        }
        Transform::Map(map) => {
            let relabeler = Relabeler::new(&map);
            Column::new(row.cde_code.as_str(), relabeler.relabel_all(&column.values))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cde_model::{CdeType, CellValue};

    fn source() -> Dataset {
        Dataset::new(vec![
            Column::new("years", vec![CellValue::Integer(34), CellValue::Missing]),
            Column::new("gender", vec!["M".into(), "f".into()]),
        ])
        .unwrap()
    }

    #[test]
    fn unordered_mode_follows_rows_and_skips_absent_sources() {
        let rows = vec![
            MappingRow::new("gender", "sex", CdeType::Binomial, "{'M': '0', 'F': '1'}"),
            MappingRow::new("weight", "bmi", CdeType::Real, "1.0"),
            MappingRow::new("years", "age", CdeType::Integer, "1.0"),
        ];
        let outcome = apply(&source(), &rows, None);
        assert_eq!(outcome.dataset.column_names(), vec!["sex", "age"]);
        assert_eq!(
            outcome.warnings,
            vec![TransformWarning::MissingSourceColumn {
                dataset_column: "weight".into(),
                cde_code: "bmi".into(),
            }]
        );
    }

    #[test]
    fn schema_ordered_mode_fills_every_code() {
        let rows = vec![MappingRow::new("years", "age", CdeType::Integer, "2.0")];
        let codes = vec!["sex".to_string(), "age".to_string()];
        let outcome = apply(&source(), &rows, Some(codes.as_slice()));
        assert_eq!(outcome.dataset.column_names(), vec!["sex", "age"]);
        assert!(
            outcome
                .dataset
                .column("sex")
                .unwrap()
                .values
                .iter()
                .all(CellValue::is_missing)
        );
        assert_eq!(
            outcome.dataset.column("age").unwrap().values,
            vec![CellValue::Integer(68), CellValue::Missing]
        );
    }

    #[test]
    fn duplicate_targets_keep_first_row() {
        let rows = vec![
            MappingRow::new("years", "age", CdeType::Integer, "1.0"),
            MappingRow::new("gender", "age", CdeType::Integer, "1.0"),
        ];
        let outcome = apply(&source(), &rows, None);
        assert_eq!(outcome.dataset.width(), 1);
        assert!(outcome.warnings.iter().any(|w| matches!(
            w,
            TransformWarning::CastFailed { .. }
        )));
        assert!(outcome
            .warnings
            .contains(&TransformWarning::DuplicateOutput { cde_code: "age".into() }));
    }
}
