//! Numeric cast and scale of a column.

use cde_model::{CdeType, CellValue};

/// Numeric type a scaled column is cast to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Integer,
    Real,
}

impl NumericKind {
    /// `integer` casts to integers; every other CDE type casts to reals.
    pub fn for_cde(cde_type: CdeType) -> Self {
        match cde_type {
            CdeType::Integer => Self::Integer,
            _ => Self::Real,
        }
    }
}

/// Casts every cell to `kind` and multiplies it by `factor`.
///
/// Missing cells stay missing. For [`NumericKind::Integer`] both the value
/// and the factor are truncated to integers before the multiplication, so a
/// factor of `2.5` doubles and a factor of `0.5` zeroes. The first cell that
/// cannot be cast is returned as the error and nothing is scaled.
pub fn scale_values(
    values: &[CellValue],
    kind: NumericKind,
    factor: f64,
) -> Result<Vec<CellValue>, CellValue> {
    values
        .iter()
        .map(|value| {
            if value.is_missing() {
                return Ok(CellValue::Missing);
            }
            scale_cell(value, kind, factor).ok_or_else(|| value.clone())
        })
        .collect()
}

fn scale_cell(value: &CellValue, kind: NumericKind, factor: f64) -> Option<CellValue> {
    let number = value.to_f64()?;
    match kind {
        NumericKind::Real => {
            let scaled = number * factor;
            scaled.is_finite().then_some(CellValue::Real(scaled))
        }
        NumericKind::Integer => to_integer(number)?
            .checked_mul(to_integer(factor)?)
            .map(CellValue::Integer),
    }
}

fn to_integer(value: f64) -> Option<i64> {
    // i64::MAX is not exactly representable; stay strictly below 2^63
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let truncated = value.trunc();
    (truncated.is_finite() && truncated >= -LIMIT && truncated < LIMIT)
        .then_some(truncated as i64)
}
