use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cde::CdeType;
use crate::error::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformType {
    /// Multiply by a numeric factor after casting.
    Scale,
    /// Relabel categorical values.
    Map,
}

impl TransformType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformType::Scale => "scale",
            TransformType::Map => "map",
        }
    }
}

impl fmt::Display for TransformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scale" => Ok(TransformType::Scale),
            "map" => Ok(TransformType::Map),
            _ => Err(ModelError::UnknownTransformType(s.to_string())),
        }
    }
}

/// One row of the mapping table: a source column bound to a CDE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRow {
    pub dataset_column: String,
    pub cde_code: String,
    pub cde_type: CdeType,
    pub transform_type: TransformType,
    pub transform: String,
}

impl MappingRow {
    /// Builds a row whose transform type is derived from `cde_type`.
    pub fn new(
        dataset_column: impl Into<String>,
        cde_code: impl Into<String>,
        cde_type: CdeType,
        transform: impl Into<String>,
    ) -> Self {
        Self {
            dataset_column: dataset_column.into(),
            cde_code: cde_code.into(),
            cde_type,
            transform_type: cde_type.transform_type(),
            transform: transform.into(),
        }
    }
}

/// A broken invariant of a mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Several rows target the same CDE code.
    DuplicateCdeCode { cde_code: String, rows: Vec<usize> },
    /// The CDE code is not declared in the schema.
    UnknownCdeCode { row: usize, cde_code: String },
    /// The transform string is not a valid literal for its transform type.
    InvalidTransform {
        row: usize,
        transform: String,
        message: String,
    },
    /// The transform type does not follow from the CDE type.
    TransformTypeMismatch {
        row: usize,
        cde_type: CdeType,
        transform_type: TransformType,
    },
    /// The row's CDE type differs from the schema's declaration.
    CdeTypeMismatch {
        row: usize,
        cde_code: String,
        declared: CdeType,
        found: CdeType,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DuplicateCdeCode { cde_code, rows } => {
                let rows = rows
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "CDE code '{cde_code}' is mapped by rows {rows}")
            }
            Violation::UnknownCdeCode { row, cde_code } => {
                write!(f, "row {row}: CDE code '{cde_code}' is not in the schema")
            }
            Violation::InvalidTransform {
                row,
                transform,
                message,
            } => write!(f, "row {row}: invalid transform {transform:?} ({message})"),
            Violation::TransformTypeMismatch {
                row,
                cde_type,
                transform_type,
            } => write!(
                f,
                "row {row}: transform type '{transform_type}' does not fit CDE type '{cde_type}'"
            ),
            Violation::CdeTypeMismatch {
                row,
                cde_code,
                declared,
                found,
            } => write!(
                f,
                "row {row}: CDE '{cde_code}' is declared '{declared}' but the row says '{found}'"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_derives_transform_type() {
        let row = MappingRow::new("age_years", "age", CdeType::Integer, "1.0");
        assert_eq!(row.transform_type, TransformType::Scale);
        let row = MappingRow::new("gender", "sex", CdeType::Binomial, "nan");
        assert_eq!(row.transform_type, TransformType::Map);
    }

    #[test]
    fn violation_messages_name_the_row() {
        let v = Violation::UnknownCdeCode {
            row: 2,
            cde_code: "foo".into(),
        };
        assert_eq!(v.to_string(), "row 2: CDE code 'foo' is not in the schema");
    }
}
