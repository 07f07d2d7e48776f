//! Reading and writing the mapping artifact.
//!
//! The artifact is an ordered list of row objects carrying exactly the five
//! mapping fields. It is stored either as a JSON array or as newline-delimited
//! JSON (one object per line); the reader detects which.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use cde_model::{MappingRow, NO_TRANSFORM};

use crate::error::MappingError;
use crate::table::MappingTable;

/// Fields every mapping record must carry.
pub const MAPPING_FIELDS: [&str; 5] = [
    "dataset_column",
    "cde_code",
    "cde_type",
    "transform_type",
    "transform",
];

/// On-disk layout of the mapping artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingFormat {
    /// A pretty-printed JSON array of objects.
    #[default]
    JsonArray,
    /// One compact JSON object per line.
    NdJson,
}

impl MappingFormat {
    /// `.ndjson` and `.jsonl` files are newline-delimited; anything else is
    /// an array.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("ndjson" | "jsonl") => Self::NdJson,
            _ => Self::JsonArray,
        }
    }
}

/// Parses mapping records from JSON array or NDJSON text.
pub fn parse_mapping(text: &str) -> Result<MappingTable, MappingError> {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    let records: Vec<Value> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        trimmed
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str::<Value>)
            .collect::<Result<_, _>>()?
    };

    let rows = records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| parse_record(idx, record))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(rows = rows.len(), "parsed mapping records");
    Ok(MappingTable::from_rows(rows))
}

fn parse_record(record: usize, value: Value) -> Result<MappingRow, MappingError> {
    let Value::Object(mut fields) = value else {
        return Err(MappingError::InvalidRecord {
            record,
            message: "expected a JSON object".to_string(),
        });
    };
    for field in MAPPING_FIELDS {
        if !fields.contains_key(field) {
            return Err(MappingError::MissingField { record, field });
        }
    }
    // Tables written by dataframe tools store an absent transform as null
    // and a scale factor as a bare number.
    if let Some(transform) = fields.get_mut("transform") {
        match transform {
            Value::Null => *transform = Value::String(NO_TRANSFORM.to_string()),
            Value::Number(n) => *transform = Value::String(n.to_string()),
            _ => {}
        }
    }
    serde_json::from_value(Value::Object(fields)).map_err(|err| MappingError::InvalidRecord {
        record,
        message: err.to_string(),
    })
}

/// Serializes the table in `format`.
pub fn mapping_to_string(table: &MappingTable, format: MappingFormat) -> Result<String, MappingError> {
    match format {
        MappingFormat::JsonArray => Ok(serde_json::to_string_pretty(table.rows())?),
        MappingFormat::NdJson => {
            let mut out = String::new();
            for row in table {
                out.push_str(&serde_json::to_string(row)?);
                out.push('\n');
            }
            Ok(out)
        }
    }
}

/// Loads a mapping artifact from `path`.
pub fn load_mapping(path: &Path) -> Result<MappingTable, MappingError> {
    let text = fs::read_to_string(path).map_err(|err| MappingError::io(path, err))?;
    let table = parse_mapping(&text)?;
    info!(path = %path.display(), rows = table.len(), "loaded mapping");
    Ok(table)
}

/// Writes `table` to `path`, choosing the layout from the file extension.
pub fn save_mapping(table: &MappingTable, path: &Path) -> Result<(), MappingError> {
    save_mapping_as(table, path, MappingFormat::from_path(path))
}

pub fn save_mapping_as(
    table: &MappingTable,
    path: &Path,
    format: MappingFormat,
) -> Result<(), MappingError> {
    let text = mapping_to_string(table, format)?;
    fs::write(path, text).map_err(|err| MappingError::io(path, err))?;
    info!(path = %path.display(), rows = table.len(), "saved mapping");
    Ok(())
}
