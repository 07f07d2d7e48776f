//! Column-oriented source and output datasets.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Textual form of a missing value.
pub const MISSING_SENTINEL: &str = "nan";

/// A single scalar cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum CellValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Missing,
}

impl CellValue {
    /// Infers a typed cell from raw text: integer, then real, then text.
    ///
    /// Blank cells and the usual missing markers (`nan`, `NA`, `null`) are
    /// missing.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if is_missing_marker(trimmed) {
            return CellValue::Missing;
        }
        if let Ok(v) = trimmed.parse::<i64>() {
            return CellValue::Integer(v);
        }
        if let Ok(v) = trimmed.parse::<f64>()
            && v.is_finite()
        {
            return CellValue::Real(v);
        }
        CellValue::Text(raw.to_string())
    }

    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Missing => true,
            CellValue::Real(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the cell; text is parsed, missing yields `None`.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(v) => Some(*v as f64),
            CellValue::Real(v) if v.is_finite() => Some(*v),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// Stable string form used for value matching.
    ///
    /// Reals keep a trailing `.0` when integral and missing cells render as
    /// `"nan"`.
    pub fn to_key(&self) -> String {
        match self {
            CellValue::Integer(v) => v.to_string(),
            CellValue::Real(v) if v.is_nan() => MISSING_SENTINEL.to_string(),
            CellValue::Real(v) => format_real(*v),
            CellValue::Text(s) => s.clone(),
            CellValue::Missing => MISSING_SENTINEL.to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => Ok(()),
            CellValue::Real(v) if v.is_nan() => Ok(()),
            other => f.write_str(&other.to_key()),
        }
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        if v.is_nan() {
            CellValue::Missing
        } else {
            CellValue::Real(v)
        }
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellValue::Missing, Into::into)
    }
}

fn is_missing_marker(s: &str) -> bool {
    s.is_empty()
        || s.eq_ignore_ascii_case("nan")
        || s.eq_ignore_ascii_case("na")
        || s.eq_ignore_ascii_case("null")
}

fn format_real(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// A column of `len` missing cells.
    pub fn missing(name: impl Into<String>, len: usize) -> Self {
        Self::new(name, vec![CellValue::Missing; len])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Distinct stringified values of `values` in first-seen order.
pub fn distinct_keys(values: &[CellValue]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut keys = Vec::new();
    for value in values {
        let key = value.to_key();
        if seen.insert(key.clone()) {
            keys.push(key);
        }
    }
    keys
}

/// An ordered set of equally long, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map_or(0, Column::len);
        let mut names = BTreeSet::new();
        for column in &columns {
            if column.len() != row_count {
                return Err(ModelError::ColumnLength {
                    column: column.name.clone(),
                    expected: row_count,
                    actual: column.len(),
                });
            }
            if !names.insert(column.name.as_str()) {
                return Err(ModelError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Self { columns, row_count })
    }

    /// An empty dataset with a fixed row count, filled by [`Dataset::push`].
    pub fn with_rows(row_count: usize) -> Self {
        Self {
            columns: Vec::new(),
            row_count,
        }
    }

    pub fn push(&mut self, column: Column) -> Result<()> {
        if column.len() != self.row_count {
            return Err(ModelError::ColumnLength {
                column: column.name.clone(),
                expected: self.row_count,
                actual: column.len(),
            });
        }
        if self.column(&column.name).is_some() {
            return Err(ModelError::DuplicateColumn(column.name.clone()));
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_prefers_integer_then_real() {
        assert_eq!(CellValue::infer("34"), CellValue::Integer(34));
        assert_eq!(CellValue::infer("1.5"), CellValue::Real(1.5));
        assert_eq!(CellValue::infer("M"), CellValue::Text("M".into()));
        assert_eq!(CellValue::infer(""), CellValue::Missing);
        assert_eq!(CellValue::infer("NaN"), CellValue::Missing);
    }

    #[test]
    fn keys_follow_numeric_type() {
        assert_eq!(CellValue::Integer(1).to_key(), "1");
        assert_eq!(CellValue::Real(1.0).to_key(), "1.0");
        assert_eq!(CellValue::Real(2.5).to_key(), "2.5");
        assert_eq!(CellValue::Missing.to_key(), "nan");
        assert_eq!(CellValue::Real(f64::NAN).to_key(), "nan");
    }

    #[test]
    fn distinct_keys_keep_first_seen_order() {
        let column = Column::new(
            "gender",
            vec!["M".into(), "F".into(), "M".into(), CellValue::Missing],
        );
        assert_eq!(distinct_keys(&column.values), vec!["M", "F", "nan"]);
    }

    #[test]
    fn dataset_rejects_ragged_columns() {
        let err = Dataset::new(vec![
            Column::new("a", vec![CellValue::Integer(1), CellValue::Integer(2)]),
            Column::new("b", vec![CellValue::Integer(1)]),
        ])
        .unwrap_err();
        assert!(matches!(err, ModelError::ColumnLength { .. }));
    }
}
