// Compression-strategy selection for the compressed container.
//
// Decision order: NULL, SINGLE_VALUE, DICTIONARY (strings only), RLE
// (numerics only), RAW. The selector never picks an encoding it cannot
// faithfully write: RLE and dictionary entries carry u8 length prefixes,
// so any candidate string over 255 bytes falls through to RAW.

use serde::{Deserialize, Serialize};

use crate::data::{Encoding, LogicalType, Value};
use crate::table::Column;

/// Longest string value representable by a tagged value or dictionary
/// entry (u8 length prefix).
pub(crate) const MAX_TAGGED_STRING_LEN: usize = 255;

/// Most entries a dictionary can carry (u16 size field).
pub(crate) const MAX_DICT_SIZE: usize = 65_535;

/// Thresholds steering the per-column encoding choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Dictionary-encode a string column when `distinct / rows` is at or
    /// below this ratio.
    pub uniqueness_threshold: f64,
    /// Run-length encode a numeric column when `runs / rows` is at or
    /// below this ratio.
    pub redundancy_threshold: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            uniqueness_threshold: 0.10,
            redundancy_threshold: 0.50,
        }
    }
}

/// Pick an encoding for one column. Deterministic: the same column always
/// yields the same choice.
pub fn select(config: &SelectorConfig, column: &Column) -> Encoding {
    let values = column.values();
    let rows = values.len();

    // Empty columns are vacuously all-null.
    if values.iter().all(Value::is_null) {
        return Encoding::Null;
    }

    if !column.has_nulls() {
        if let Some(value) = single_non_null_value(values) {
            if tag_encodable(value) {
                return Encoding::SingleValue;
            }
        }
    }

    if column.logical_type() == LogicalType::String {
        let distinct = distinct_strings(values);
        let fits = distinct.len() <= MAX_DICT_SIZE
            && distinct.iter().all(|s| s.len() <= MAX_TAGGED_STRING_LEN);
        if fits && distinct.len() as f64 / rows as f64 <= config.uniqueness_threshold {
            return Encoding::Dictionary;
        }
    }

    if column.logical_type().is_numeric() {
        let run_count = runs(values).len();
        if run_count as f64 / rows as f64 <= config.redundancy_threshold {
            return Encoding::Rle;
        }
    }

    Encoding::Raw
}

/// Some iff the column has at least one non-null value and all non-null
/// values are bit-equal.
fn single_non_null_value(values: &[Value]) -> Option<&Value> {
    let mut non_null = values.iter().filter(|v| !v.is_null());
    let first = non_null.next()?;
    if non_null.all(|v| v.bit_eq(first)) {
        Some(first)
    } else {
        None
    }
}

fn tag_encodable(value: &Value) -> bool {
    match value {
        Value::String(s) => s.len() <= MAX_TAGGED_STRING_LEN,
        _ => true,
    }
}

/// Distinct non-null string values in first-occurrence order. This is also
/// the dictionary entry order, so selection and encoding agree.
pub(crate) fn distinct_strings(values: &[Value]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    let mut distinct = Vec::new();
    for value in values {
        if let Value::String(s) = value {
            if seen.insert(s.as_str()) {
                distinct.push(s.as_str());
            }
        }
    }
    distinct
}

/// Maximal runs of bit-equal values (null equals null), in column order.
pub(crate) fn runs(values: &[Value]) -> Vec<(&Value, u32)> {
    let mut runs: Vec<(&Value, u32)> = Vec::new();
    for value in values {
        match runs.last_mut() {
            Some((current, count)) if current.bit_eq(value) => *count += 1,
            _ => runs.push((value, 1)),
        }
    }
    runs
}
