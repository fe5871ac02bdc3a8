// Core type definitions for hybf

use serde::{Deserialize, Serialize};

/// A single cell at the table boundary.
///
/// Columns are homogeneously typed by their [`LogicalType`]; `Null` may
/// appear in any column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Double(f64),
    Bool(bool),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Equality with bit-exact doubles, so a run of NaN collapses the same
    /// way a run of any other constant does. Null equals null.
    pub fn bit_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

/// Logical column types - the caller's view on both sides of the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Boolean,
}

impl LogicalType {
    /// Wire code used in column directories.
    pub fn code(self) -> u8 {
        match self {
            LogicalType::Int32 => 1,
            LogicalType::Int64 => 2,
            LogicalType::Float32 => 3,
            LogicalType::Float64 => 4,
            LogicalType::String => 5,
            LogicalType::Boolean => 6,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(LogicalType::Int32),
            2 => Some(LogicalType::Int64),
            3 => Some(LogicalType::Float32),
            4 => Some(LogicalType::Float64),
            5 => Some(LogicalType::String),
            6 => Some(LogicalType::Boolean),
            _ => None,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, LogicalType::Int32 | LogicalType::Int64)
    }

    pub fn is_float(self) -> bool {
        matches!(self, LogicalType::Float32 | LogicalType::Float64)
    }

    /// Numeric for the purposes of run-length analysis; booleans are not.
    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// In-memory width of one value, used by the container size estimator
    /// and by the minimal container, which stores the logical width.
    pub fn byte_width(self) -> usize {
        match self {
            LogicalType::Int32 | LogicalType::Float32 => 4,
            LogicalType::Int64 | LogicalType::Float64 => 8,
            LogicalType::Boolean => 1,
            LogicalType::String => 0,
        }
    }

    /// The storage type of the same width as the logical type.
    pub fn native_storage(self) -> StorageType {
        match self {
            LogicalType::Int32 => StorageType::Int32,
            LogicalType::Int64 => StorageType::Int64,
            LogicalType::Float32 => StorageType::Float32,
            LogicalType::Float64 => StorageType::Float64,
            LogicalType::String => StorageType::String,
            LogicalType::Boolean => StorageType::Bool,
        }
    }
}

/// Physical storage widths written to the stream, possibly narrower than
/// the logical width when the analyzer proves the narrowing lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Uint8,
    Uint16,
    Uint32,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    String,
}

impl StorageType {
    /// Dtype code carried inside an optimized-numeric raw payload.
    /// `Bool` and `String` never appear there.
    pub fn dtype_code(self) -> Option<u8> {
        match self {
            StorageType::Uint8 => Some(1),
            StorageType::Uint16 => Some(2),
            StorageType::Uint32 => Some(3),
            StorageType::Int8 => Some(4),
            StorageType::Int16 => Some(5),
            StorageType::Int32 => Some(6),
            StorageType::Int64 => Some(7),
            StorageType::Float32 => Some(8),
            StorageType::Float64 => Some(9),
            StorageType::Bool | StorageType::String => None,
        }
    }

    pub fn from_dtype_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(StorageType::Uint8),
            2 => Some(StorageType::Uint16),
            3 => Some(StorageType::Uint32),
            4 => Some(StorageType::Int8),
            5 => Some(StorageType::Int16),
            6 => Some(StorageType::Int32),
            7 => Some(StorageType::Int64),
            8 => Some(StorageType::Float32),
            9 => Some(StorageType::Float64),
            _ => None,
        }
    }

    pub fn byte_width(self) -> usize {
        match self {
            StorageType::Uint8 | StorageType::Int8 | StorageType::Bool => 1,
            StorageType::Uint16 | StorageType::Int16 => 2,
            StorageType::Uint32 | StorageType::Int32 | StorageType::Float32 => 4,
            StorageType::Int64 | StorageType::Float64 => 8,
            StorageType::String => 0,
        }
    }
}

/// Per-column encoding in the compressed container. The minimal container
/// is implicitly `Raw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Raw,
    Rle,
    Dictionary,
    SingleValue,
    Null,
}

impl Encoding {
    pub fn tag(self) -> u8 {
        match self {
            Encoding::Raw => 1,
            Encoding::Rle => 2,
            Encoding::Dictionary => 3,
            Encoding::SingleValue => 4,
            Encoding::Null => 5,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Encoding::Raw),
            2 => Some(Encoding::Rle),
            3 => Some(Encoding::Dictionary),
            4 => Some(Encoding::SingleValue),
            5 => Some(Encoding::Null),
            _ => None,
        }
    }
}

/// Container layout variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    Minimal,
    Compressed,
}

impl FormatType {
    pub fn code(self) -> u8 {
        match self {
            FormatType::Minimal => 1,
            FormatType::Compressed => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(FormatType::Minimal),
            2 => Some(FormatType::Compressed),
            _ => None,
        }
    }
}
