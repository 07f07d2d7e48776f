//! CSV dataset reading and writing.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use cde_model::{CellValue, Column, Dataset};
use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};

/// Reads a CSV file with one header row into a [`Dataset`].
///
/// Cells are typed with [`CellValue::infer`]; blank cells and `nan`/`NA`
/// markers become missing.
pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let file = File::open(path).map_err(|e| IngestError::read(path, e))?;
    let dataset = read_dataset_from(file, path)?;
    info!(
        path = %path.display(),
        columns = dataset.width(),
        rows = dataset.row_count(),
        "loaded dataset"
    );
    Ok(dataset)
}

/// Reads CSV from any reader; `origin` only labels errors.
pub fn read_dataset_from<R: Read>(reader: R, origin: &Path) -> Result<Dataset> {
    let csv_error = |source| IngestError::CsvRead {
        path: origin.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = reader.headers().map_err(csv_error)?.clone();
    if headers.is_empty() {
        return Err(IngestError::EmptyCsv {
            path: origin.to_path_buf(),
        });
    }
    let names: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let name = if idx == 0 {
                name.trim_start_matches('\u{feff}')
            } else {
                name
            };
            name.trim().to_string()
        })
        .collect();
    if let Some(index) = names.iter().position(String::is_empty) {
        return Err(IngestError::EmptyColumnName {
            path: origin.to_path_buf(),
            index,
        });
    }

    let mut values: Vec<Vec<CellValue>> = vec![Vec::new(); names.len()];
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        for (column, cell) in values.iter_mut().zip(record.iter()) {
            column.push(CellValue::infer(cell));
        }
    }

    let columns: Vec<Column> = names
        .into_iter()
        .zip(values)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    let dataset = Dataset::new(columns).map_err(|e| IngestError::model(origin, e))?;
    if dataset.row_count() == 0 {
        warn!(path = %origin.display(), "dataset has no rows");
    }
    debug!(path = %origin.display(), columns = dataset.width(), "parsed dataset");
    Ok(dataset)
}

/// Writes `dataset` as CSV with a header row; missing cells are blank.
pub fn write_dataset(dataset: &Dataset, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|source| IngestError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    write_dataset_to(dataset, file, path)?;
    info!(
        path = %path.display(),
        columns = dataset.width(),
        rows = dataset.row_count(),
        "wrote dataset"
    );
    Ok(())
}

/// Writes `dataset` as CSV to any writer; `origin` only labels errors.
pub fn write_dataset_to<W: Write>(dataset: &Dataset, writer: W, origin: &Path) -> Result<()> {
    let csv_error = |source| IngestError::CsvWrite {
        path: origin.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_writer(writer);
    writer
        .write_record(dataset.columns().iter().map(|c| c.name.as_str()))
        .map_err(csv_error)?;
    for row in 0..dataset.row_count() {
        writer
            .write_record(
                dataset
                    .columns()
                    .iter()
                    .map(|column| column.values[row].to_string()),
            )
            .map_err(csv_error)?;
    }
    writer.flush().map_err(|source| IngestError::FileWrite {
        path: origin.to_path_buf(),
        source,
    })
}
