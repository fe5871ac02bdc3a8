// Storage-width analysis
//
// Finds the narrowest physical type that holds every non-null value of a
// column losslessly. Unsigned widths are preferred for non-negative
// integer ranges; float64 narrows to float32 only when the narrow/widen
// round trip is bit-exact for every value.

use crate::data::{LogicalType, StorageType, Value};
use crate::table::Column;

/// Analyzer output for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Analysis {
    pub storage: StorageType,
    /// Set iff any value is null.
    pub nullable: bool,
}

pub fn analyze(column: &Column) -> Analysis {
    let nullable = column.has_nulls();
    let all_null = !column.is_empty() && column.null_count() == column.len();
    if all_null {
        return Analysis {
            storage: StorageType::String,
            nullable: true,
        };
    }

    let storage = match column.logical_type() {
        LogicalType::Int32 | LogicalType::Int64 => narrow_integers(column.values()),
        LogicalType::Float32 => StorageType::Float32,
        LogicalType::Float64 => narrow_floats(column.values()),
        LogicalType::Boolean => StorageType::Bool,
        LogicalType::String => StorageType::String,
    };
    Analysis { storage, nullable }
}

fn narrow_integers(values: &[Value]) -> StorageType {
    let mut bounds: Option<(i64, i64)> = None;
    for value in values {
        if let Value::Int(n) = value {
            bounds = Some(match bounds {
                None => (*n, *n),
                Some((min, max)) => (min.min(*n), max.max(*n)),
            });
        }
    }
    let (min, max) = match bounds {
        Some(b) => b,
        // No non-null values at all: the integer family defaults to int32.
        None => return StorageType::Int32,
    };

    if min >= 0 {
        if max <= u8::MAX as i64 {
            return StorageType::Uint8;
        }
        if max <= u16::MAX as i64 {
            return StorageType::Uint16;
        }
        if max <= u32::MAX as i64 {
            return StorageType::Uint32;
        }
    }
    if min >= i8::MIN as i64 && max <= i8::MAX as i64 {
        StorageType::Int8
    } else if min >= i16::MIN as i64 && max <= i16::MAX as i64 {
        StorageType::Int16
    } else if min >= i32::MIN as i64 && max <= i32::MAX as i64 {
        StorageType::Int32
    } else {
        StorageType::Int64
    }
}

fn narrow_floats(values: &[Value]) -> StorageType {
    let mut seen = false;
    for value in values {
        if let Value::Double(d) = value {
            seen = true;
            if ((*d as f32) as f64).to_bits() != d.to_bits() {
                return StorageType::Float64;
            }
        }
    }
    if seen {
        StorageType::Float32
    } else {
        StorageType::Float64
    }
}
