//! Applying a finalized mapping table to a source dataset.
//!
//! Each mapping row renames a source column to its CDE code and applies the
//! row's transform: numeric columns are cast to the CDE type and scaled,
//! categorical columns are relabeled case-insensitively. Missing cells stay
//! missing throughout.
//!
//! # Example
//!
//! ```ignore
//! use cde_model::OutputOrder;
//! use cde_transform::apply_checked;
//!
//! let outcome = apply_checked(&dataset, table.rows(), &schema, OutputOrder::SchemaOrdered)?;
//! for warning in &outcome.warnings {
//!     eprintln!("{warning}");
//! }
//! ```

pub mod error;
pub mod executor;
pub mod relabel;
pub mod scale;
pub mod types;

pub use error::ApplyError;
pub use executor::{apply, apply_checked, transform_column};
pub use relabel::Relabeler;
pub use scale::{NumericKind, scale_values};
pub use types::{ApplyOutcome, TransformWarning};
