// In-memory columnar table model
//
// This is the boundary type the codec consumes and produces. Values are
// tagged (`Value`), columns are homogeneously typed, and all columns of a
// table share one row count.

use crate::data::{LogicalType, Value};
use crate::error::{FormatError, Result};

/// Upper bound on a UTF-8 column name; names are length-prefixed with a
/// single byte on the wire.
pub const MAX_NAME_LEN: usize = 255;

/// A named, typed column of values. `Value::Null` marks missing rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    logical_type: LogicalType,
    values: Vec<Value>,
}

impl Column {
    /// Create a column, validating every value against the logical type.
    pub fn new(
        name: impl Into<String>,
        logical_type: LogicalType,
        values: Vec<Value>,
    ) -> Result<Self> {
        let name = name.into();
        for value in &values {
            check_value(&name, logical_type, value)?;
        }
        Ok(Column {
            name,
            logical_type,
            values,
        })
    }

    /// Create a column from values plus an explicit null mask. A set mask
    /// bit overrides the corresponding value with null.
    pub fn from_parts(
        name: impl Into<String>,
        logical_type: LogicalType,
        values: Vec<Value>,
        null_mask: &[bool],
    ) -> Result<Self> {
        if values.len() != null_mask.len() {
            return Err(FormatError::ShapeError(format!(
                "null mask covers {} rows but column has {}",
                null_mask.len(),
                values.len()
            )));
        }
        let values = values
            .into_iter()
            .zip(null_mask)
            .map(|(value, &is_null)| if is_null { Value::Null } else { value })
            .collect();
        Column::new(name, logical_type, values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn logical_type(&self) -> LogicalType {
        self.logical_type
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    pub fn has_nulls(&self) -> bool {
        self.values.iter().any(|v| v.is_null())
    }
}

fn check_value(name: &str, logical_type: LogicalType, value: &Value) -> Result<()> {
    let ok = match (logical_type, value) {
        (_, Value::Null) => true,
        (LogicalType::Int32, Value::Int(n)) => {
            *n >= i32::MIN as i64 && *n <= i32::MAX as i64
        }
        (LogicalType::Int64, Value::Int(_)) => true,
        // A float32 column's caller view is f32; every value must survive
        // the narrow/widen trip bit-exactly.
        (LogicalType::Float32, Value::Double(d)) => {
            ((*d as f32) as f64).to_bits() == d.to_bits()
        }
        (LogicalType::Float64, Value::Double(_)) => true,
        (LogicalType::String, Value::String(_)) => true,
        (LogicalType::Boolean, Value::Bool(_)) => true,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(FormatError::ShapeError(format!(
            "value {:?} does not fit column '{}' of type {:?}",
            value, name, logical_type
        )))
    }
}

/// An ordered sequence of columns sharing a row count.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Create a table, checking that all columns agree on row count and
    /// that names are unique.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let rows = first.len();
            for column in &columns {
                if column.len() != rows {
                    return Err(FormatError::ShapeError(format!(
                        "column '{}' has {} rows, expected {}",
                        column.name(),
                        column.len(),
                        rows
                    )));
                }
            }
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name() == column.name()) {
                return Err(FormatError::ShapeError(format!(
                    "duplicate column name '{}'",
                    column.name()
                )));
            }
        }
        Ok(Table { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }
}
