//! CDE schema loading from CSV or JSON.
//!
//! Both layouts carry one record per CDE with a `code`, a `type` and, for
//! categorical CDEs, a `values` cell holding the encoded value domain. Any
//! other column is ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use cde_model::{CdeEntry, CdeType, Schema, ValueDomain};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};

const REQUIRED_COLUMNS: [&str; 2] = ["code", "type"];

#[derive(Debug, Deserialize)]
struct CsvRecord {
    code: String,
    #[serde(rename = "type")]
    cde_type: String,
    #[serde(default)]
    values: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonRecord {
    code: String,
    #[serde(rename = "type")]
    cde_type: String,
    #[serde(default)]
    values: Option<Value>,
}

/// Loads a schema, choosing JSON for `.json` files and CSV otherwise.
pub fn read_schema(path: &Path) -> Result<Schema> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let file = File::open(path).map_err(|e| IngestError::read(path, e))?;
    let schema = if is_json {
        read_schema_json(file, path)?
    } else {
        read_schema_csv(file, path)?
    };
    info!(path = %path.display(), cdes = schema.len(), "loaded schema");
    Ok(schema)
}

/// Reads a CSV schema with `code`, `type` and optional `values` columns.
pub fn read_schema_csv<R: Read>(reader: R, origin: &Path) -> Result<Schema> {
    let csv_error = |source| IngestError::CsvRead {
        path: origin.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers().map_err(csv_error)?;
    for column in REQUIRED_COLUMNS {
        if !headers
            .iter()
            .any(|h| h.trim_start_matches('\u{feff}') == column)
        {
            return Err(IngestError::MissingColumn {
                column,
                path: origin.to_path_buf(),
            });
        }
    }
    // a BOM would hide the first column from serde
    let cleaned: csv::StringRecord = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}'))
        .collect();
    reader.set_headers(cleaned);

    let mut entries = Vec::new();
    for record in reader.deserialize::<CsvRecord>() {
        let record = record.map_err(csv_error)?;
        entries.push(build_entry(
            &record.code,
            &record.cde_type,
            record.values.as_deref().map(RawDomain::Text),
            origin,
        )?);
    }
    finish(entries, origin)
}

/// Reads a JSON array of `{code, type, values}` objects.
///
/// `values` may be the same string encoding as in CSV schemas or an array of
/// `{code, label}` objects.
pub fn read_schema_json<R: Read>(reader: R, origin: &Path) -> Result<Schema> {
    let records: Vec<JsonRecord> =
        serde_json::from_reader(reader).map_err(|source| IngestError::Json {
            path: origin.to_path_buf(),
            source,
        })?;
    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        let entry = match record.values {
            None | Some(Value::Null) => build_entry(&record.code, &record.cde_type, None, origin),
            Some(Value::String(text)) => build_entry(
                &record.code,
                &record.cde_type,
                Some(RawDomain::Text(&text)),
                origin,
            ),
            Some(other) => build_entry(
                &record.code,
                &record.cde_type,
                Some(RawDomain::Structured(other)),
                origin,
            ),
        }?;
        entries.push(entry);
    }
    finish(entries, origin)
}

enum RawDomain<'a> {
    Text(&'a str),
    Structured(Value),
}

fn build_entry(
    code: &str,
    cde_type: &str,
    domain: Option<RawDomain<'_>>,
    origin: &Path,
) -> Result<CdeEntry> {
    let code = code.trim();
    let cde_type: CdeType = cde_type
        .parse()
        .map_err(|e| IngestError::model(origin, e))?;

    if !cde_type.is_categorical() {
        return Ok(CdeEntry::numeric(code, cde_type));
    }
    let values = match domain {
        None => None,
        Some(RawDomain::Text(text)) if text.trim().is_empty() => None,
        Some(RawDomain::Text(text)) => {
            Some(ValueDomain::parse(code, text).map_err(|e| IngestError::model(origin, e))?)
        }
        Some(RawDomain::Structured(value)) => {
            Some(serde_json::from_value(value).map_err(|source| IngestError::Json {
                path: origin.to_path_buf(),
                source,
            })?)
        }
    };
    match values {
        Some(values) => Ok(CdeEntry::categorical(code, cde_type, values)),
        None => {
            warn!(cde_code = %code, "categorical CDE has no value domain");
            Ok(CdeEntry {
                code: code.to_string(),
                cde_type,
                values: None,
            })
        }
    }
}

fn finish(entries: Vec<CdeEntry>, origin: &Path) -> Result<Schema> {
    debug!(path = %origin.display(), cdes = entries.len(), "parsed schema records");
    Schema::new(entries).map_err(|e| IngestError::model(origin, e))
}
