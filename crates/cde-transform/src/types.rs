//! Output and warning types of the transform applier.

use std::fmt;

use serde::{Deserialize, Serialize};

use cde_model::{CdeType, Dataset};

/// A recovered irregularity met while transforming one output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformWarning {
    /// The row carries the `"nan"` sentinel; the column was only renamed.
    NoTransform { cde_code: String },
    /// The source column is absent from the dataset.
    MissingSourceColumn {
        dataset_column: String,
        cde_code: String,
    },
    /// No row targets this schema code; an all-missing column was emitted.
    Unmapped { cde_code: String },
    /// A value could not be cast to the CDE type; the column was left
    /// unscaled.
    CastFailed {
        dataset_column: String,
        cde_code: String,
        cde_type: CdeType,
        value: String,
    },
    /// The transform literal did not parse; the column was only renamed.
    InvalidTransform { cde_code: String, message: String },
    /// A second row targets an output column that already exists.
    DuplicateOutput { cde_code: String },
}

impl fmt::Display for TransformWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTransform { cde_code } => {
                write!(f, "no transformation applied for output column {cde_code}")
            }
            Self::MissingSourceColumn {
                dataset_column,
                cde_code,
            } => write!(
                f,
                "source column {dataset_column} for {cde_code} is not in the dataset"
            ),
            Self::Unmapped { cde_code } => {
                write!(f, "no mapping for {cde_code}; column left empty")
            }
            Self::CastFailed {
                dataset_column,
                cde_code,
                cde_type,
                value,
            } => write!(
                f,
                "cannot cast {value:?} in {dataset_column} to {cde_type}; {cde_code} left unscaled"
            ),
            Self::InvalidTransform { cde_code, message } => {
                write!(f, "invalid transform for {cde_code}: {message}")
            }
            Self::DuplicateOutput { cde_code } => {
                write!(f, "output column {cde_code} is already mapped; row skipped")
            }
        }
    }
}

/// The transformed dataset and the warnings raised while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    pub dataset: Dataset,
    pub warnings: Vec<TransformWarning>,
}

impl ApplyOutcome {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
