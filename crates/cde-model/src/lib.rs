pub mod cde;
pub mod error;
pub mod mapping;
pub mod options;
pub mod transform;
pub mod value;

pub use cde::{CdeEntry, CdeType, DomainValue, Schema, ValueDomain};
pub use error::{ModelError, Result};
pub use mapping::{MappingRow, TransformType, Violation};
pub use options::{
    CollisionPolicy, DEFAULT_TOP_K, MatchingOptions, OutputOrder, SimilarityMethod,
    SynthesisOptions,
};
pub use transform::{
    NEUTRAL_SCALE, NO_TRANSFORM, PLACEHOLDER_MAP, RelabelMap, Transform, is_no_transform,
    parse_scale,
};
pub use value::{CellValue, Column, Dataset, MISSING_SENTINEL, distinct_keys};
