//! Case-insensitive value relabeling of a categorical column.

use std::collections::BTreeMap;

use cde_model::{CellValue, MISSING_SENTINEL, RelabelMap};

/// Lower-cased lookup built from a relabel dictionary.
///
/// When two keys differ only by case, the first one wins.
#[derive(Debug, Clone)]
pub struct Relabeler<'a> {
    lookup: BTreeMap<String, &'a str>,
}

impl<'a> Relabeler<'a> {
    pub fn new(map: &'a RelabelMap) -> Self {
        let mut lookup = BTreeMap::new();
        for (key, target) in map.iter() {
            lookup.entry(key.to_lowercase()).or_insert(target);
        }
        Self { lookup }
    }

    /// Relabels one cell; unmatched and missing cells pass through.
    ///
    /// A `"nan"` target produces a missing cell.
    pub fn relabel(&self, value: &CellValue) -> CellValue {
        if value.is_missing() {
            return CellValue::Missing;
        }
        match self.lookup.get(&value.to_key().to_lowercase()) {
            Some(target) if target.eq_ignore_ascii_case(MISSING_SENTINEL) => CellValue::Missing,
            Some(target) => CellValue::Text((*target).to_string()),
            None => value.clone(),
        }
    }

    pub fn relabel_all(&self, values: &[CellValue]) -> Vec<CellValue> {
        values.iter().map(|v| self.relabel(v)).collect()
    }
}
