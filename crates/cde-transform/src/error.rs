//! Error types for applying a mapping table.

use cde_model::Violation;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// The mapping table breaks its invariants; every violation is listed.
    #[error("mapping table has {} violation(s)", violations.len())]
    InvalidMapping { violations: Vec<Violation> },
}

impl ApplyError {
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::InvalidMapping { violations } => violations,
        }
    }
}
