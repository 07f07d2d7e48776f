use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unknown CDE type: {0}")]
    UnknownCdeType(String),
    #[error("unknown transform type: {0}")]
    UnknownTransformType(String),
    #[error("invalid value domain for CDE {code}: {message}")]
    InvalidValueDomain { code: String, message: String },
    #[error("invalid {kind} transform literal {literal:?}: {message}")]
    InvalidTransform {
        kind: &'static str,
        literal: String,
        message: String,
    },
    #[error("duplicate CDE code in schema: {0}")]
    DuplicateCode(String),
    #[error("column {column} has {actual} values, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("duplicate column in dataset: {0}")]
    DuplicateColumn(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
