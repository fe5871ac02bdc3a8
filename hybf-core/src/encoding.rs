// Column payload encoders
//
// The five encodings of the compressed container, plus the packed-value
// primitives the minimal container shares. Each payload is written into a
// caller-provided sink; the compressed container frames it with an
// encoding tag and a length prefix.

use std::collections::HashMap;
use std::io::{Read, Write};

use crate::analyze::analyze;
use crate::bitpack::{bits_for_dict, packed_len, BitPacker, BitUnpacker};
use crate::data::{Encoding, LogicalType, StorageType, Value};
use crate::error::{FormatError, Result};
use crate::io::{
    read_bytes, read_f64_be, read_i64_be, read_null_bitmap, read_u16_be, read_u32_be, read_u8,
    write_bytes, write_f64_be, write_i64_be, write_null_bitmap, write_u16_be, write_u32_be,
    write_u8,
};
use crate::select::{distinct_strings, runs, MAX_DICT_SIZE, MAX_TAGGED_STRING_LEN};
use crate::table::Column;

/// Raw payload sub-format markers.
const RAW_MARKER_STRING: u8 = 0;
const RAW_MARKER_NUMERIC: u8 = 1;

/// Write one column payload for the given encoding.
pub fn write_column_payload<W: Write>(
    writer: &mut W,
    encoding: Encoding,
    column: &Column,
) -> Result<()> {
    match encoding {
        Encoding::Raw => write_raw(writer, column),
        Encoding::Rle => write_rle(writer, column),
        Encoding::Dictionary => write_dictionary(writer, column),
        Encoding::SingleValue => write_single_value(writer, column),
        Encoding::Null => write_null_column(writer, column.len()),
    }
}

/// Decode one column payload back into values.
pub fn read_column_payload<R: Read>(
    reader: &mut R,
    encoding: Encoding,
    logical_type: LogicalType,
    row_count: usize,
) -> Result<Vec<Value>> {
    match encoding {
        Encoding::Raw => read_raw(reader, logical_type, row_count),
        Encoding::Rle => read_rle(reader, logical_type, row_count),
        Encoding::Dictionary => read_dictionary(reader, row_count),
        Encoding::SingleValue => read_single_value(reader, logical_type, row_count),
        Encoding::Null => read_null_column(reader, row_count),
    }
}

// Raw
//
// Every boundary column is tagged, so the payload always opens with a
// one-byte sub-format marker: 1 for analyzer-narrowed numerics (dtype
// code, unconditional null bitmap, packed non-null values), 0 for strings
// (null bitmap, u16 length-prefixed UTF-8 per non-null value).

pub fn write_raw<W: Write>(writer: &mut W, column: &Column) -> Result<()> {
    match column.logical_type() {
        LogicalType::String => {
            write_u8(writer, RAW_MARKER_STRING)?;
            let nulls: Vec<bool> = column.values().iter().map(Value::is_null).collect();
            write_null_bitmap(writer, &nulls)?;
            for value in column.values() {
                if let Value::String(s) = value {
                    if s.len() > u16::MAX as usize {
                        return Err(FormatError::ShapeError(format!(
                            "string value of {} bytes exceeds the raw limit of {}",
                            s.len(),
                            u16::MAX
                        )));
                    }
                    write_u16_be(writer, s.len() as u16)?;
                    write_bytes(writer, s.as_bytes())?;
                }
            }
            Ok(())
        }
        _ => {
            write_u8(writer, RAW_MARKER_NUMERIC)?;
            let storage = match analyze(column).storage {
                // Booleans store as 0/1 bytes; the dtype menu has no bool.
                StorageType::Bool => StorageType::Uint8,
                storage => storage,
            };
            let code = storage.dtype_code().ok_or_else(|| {
                FormatError::ShapeError(format!(
                    "column '{}' has no raw numeric storage",
                    column.name()
                ))
            })?;
            write_u8(writer, code)?;
            let nulls: Vec<bool> = column.values().iter().map(Value::is_null).collect();
            write_null_bitmap(writer, &nulls)?;
            write_values_le(
                writer,
                storage,
                column.values().iter().filter(|v| !v.is_null()),
            )
        }
    }
}

pub fn read_raw<R: Read>(
    reader: &mut R,
    logical_type: LogicalType,
    row_count: usize,
) -> Result<Vec<Value>> {
    let marker = read_u8(reader)?;
    match marker {
        RAW_MARKER_STRING => {
            let nulls = read_null_bitmap(reader, row_count)?;
            let mut values = Vec::with_capacity(row_count);
            for is_null in nulls {
                if is_null {
                    values.push(Value::Null);
                } else {
                    let len = read_u16_be(reader)? as usize;
                    values.push(Value::String(read_utf8(reader, len)?));
                }
            }
            Ok(values)
        }
        RAW_MARKER_NUMERIC => {
            let code = read_u8(reader)?;
            let storage =
                StorageType::from_dtype_code(code).ok_or(FormatError::UnknownValueTag(code))?;
            let nulls = read_null_bitmap(reader, row_count)?;
            let non_null_count = nulls.iter().filter(|&&n| !n).count();
            let mut non_null =
                read_values_le(reader, storage, logical_type, non_null_count)?.into_iter();
            Ok(nulls
                .into_iter()
                .map(|is_null| {
                    if is_null {
                        Value::Null
                    } else {
                        // the bitmap counted exactly this many values
                        non_null.next().unwrap_or(Value::Null)
                    }
                })
                .collect())
        }
        other => Err(FormatError::UnknownValueTag(other)),
    }
}

// Run-length

pub fn write_rle<W: Write>(writer: &mut W, column: &Column) -> Result<()> {
    let runs = runs(column.values());
    write_u32_be(writer, runs.len() as u32)?;
    for (value, count) in runs {
        write_tagged_value(writer, value)?;
        write_u32_be(writer, count)?;
    }
    Ok(())
}

pub fn read_rle<R: Read>(
    reader: &mut R,
    logical_type: LogicalType,
    row_count: usize,
) -> Result<Vec<Value>> {
    let run_count = read_u32_be(reader)? as usize;
    let mut values = Vec::with_capacity(row_count);
    for _ in 0..run_count {
        let value = read_tagged_value(reader, logical_type)?;
        let count = read_u32_be(reader)? as usize;
        if values.len() + count > row_count {
            return Err(FormatError::LengthMismatch {
                expected: row_count,
                actual: values.len() + count,
            });
        }
        values.extend(std::iter::repeat(value).take(count));
    }
    if values.len() != row_count {
        return Err(FormatError::LengthMismatch {
            expected: row_count,
            actual: values.len(),
        });
    }
    Ok(values)
}

// Dictionary (strings only)

pub fn write_dictionary<W: Write>(writer: &mut W, column: &Column) -> Result<()> {
    let entries = distinct_strings(column.values());
    if entries.len() > MAX_DICT_SIZE {
        return Err(FormatError::DictionaryTooLarge(entries.len()));
    }
    let bits = bits_for_dict(entries.len());
    write_u16_be(writer, entries.len() as u16)?;
    write_u8(writer, bits)?;

    let mut index_of: HashMap<&str, u16> = HashMap::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        if entry.len() > MAX_TAGGED_STRING_LEN {
            return Err(FormatError::ShapeError(format!(
                "dictionary entry of {} bytes exceeds {}",
                entry.len(),
                MAX_TAGGED_STRING_LEN
            )));
        }
        write_u8(writer, entry.len() as u8)?;
        write_bytes(writer, entry.as_bytes())?;
        index_of.insert(entry, i as u16);
    }

    let null_index = ((1u32 << bits) - 1) as u16;
    let mut packer = BitPacker::new(bits);
    for value in column.values() {
        match value {
            Value::Null => packer.push(null_index),
            Value::String(s) => packer.push(index_of[s.as_str()]),
            other => {
                return Err(FormatError::ShapeError(format!(
                    "dictionary encoding is reserved for strings, got {:?}",
                    other
                )))
            }
        }
    }
    write_bytes(writer, &packer.finish())
}

pub fn read_dictionary<R: Read>(reader: &mut R, row_count: usize) -> Result<Vec<Value>> {
    let dict_size = read_u16_be(reader)? as usize;
    let bits = read_u8(reader)?;
    if !(1..=16).contains(&bits) {
        return Err(FormatError::ShapeError(format!(
            "invalid dictionary bit width: {}",
            bits
        )));
    }
    let mut entries = Vec::with_capacity(dict_size);
    for _ in 0..dict_size {
        let len = read_u8(reader)? as usize;
        entries.push(read_utf8(reader, len)?);
    }

    let packed = read_bytes(reader, packed_len(row_count, bits))?;
    let null_index = ((1u32 << bits) - 1) as u16;
    let mut unpacker = BitUnpacker::new(&packed, bits);
    let mut values = Vec::with_capacity(row_count);
    for _ in 0..row_count {
        let index = unpacker.next_index();
        if index == null_index {
            values.push(Value::Null);
        } else if (index as usize) < dict_size {
            values.push(Value::String(entries[index as usize].clone()));
        } else {
            return Err(FormatError::ShapeError(format!(
                "dictionary index {} out of range for {} entries",
                index, dict_size
            )));
        }
    }
    Ok(values)
}

// Single value and null

pub fn write_single_value<W: Write>(writer: &mut W, column: &Column) -> Result<()> {
    let value = column
        .values()
        .iter()
        .find(|v| !v.is_null())
        .ok_or_else(|| {
            FormatError::ShapeError(format!(
                "column '{}' has no value to single-value encode",
                column.name()
            ))
        })?;
    write_tagged_value(writer, value)?;
    write_u32_be(writer, column.len() as u32)
}

pub fn read_single_value<R: Read>(
    reader: &mut R,
    logical_type: LogicalType,
    row_count: usize,
) -> Result<Vec<Value>> {
    let value = read_tagged_value(reader, logical_type)?;
    let stored = read_u32_be(reader)? as usize;
    if stored != row_count {
        return Err(FormatError::LengthMismatch {
            expected: row_count,
            actual: stored,
        });
    }
    Ok(vec![value; row_count])
}

pub fn write_null_column<W: Write>(writer: &mut W, row_count: usize) -> Result<()> {
    write_u32_be(writer, row_count as u32)
}

pub fn read_null_column<R: Read>(reader: &mut R, row_count: usize) -> Result<Vec<Value>> {
    let stored = read_u32_be(reader)? as usize;
    if stored != row_count {
        return Err(FormatError::LengthMismatch {
            expected: row_count,
            actual: stored,
        });
    }
    Ok(vec![Value::Null; row_count])
}

// Tagged values, shared by the run-length and single-value encoders.
// 0 = null, 1 = integer (i64 big-endian), 2 = float (f64 big-endian),
// 3 = string (u8 length, UTF-8).

fn write_tagged_value<W: Write>(writer: &mut W, value: &Value) -> Result<()> {
    match value {
        Value::Null => write_u8(writer, 0),
        Value::Int(n) => {
            write_u8(writer, 1)?;
            write_i64_be(writer, *n)
        }
        Value::Bool(b) => {
            write_u8(writer, 1)?;
            write_i64_be(writer, *b as i64)
        }
        Value::Double(d) => {
            write_u8(writer, 2)?;
            write_f64_be(writer, *d)
        }
        Value::String(s) => {
            if s.len() > MAX_TAGGED_STRING_LEN {
                return Err(FormatError::ShapeError(format!(
                    "string value of {} bytes exceeds the tagged limit of {}",
                    s.len(),
                    MAX_TAGGED_STRING_LEN
                )));
            }
            write_u8(writer, 3)?;
            write_u8(writer, s.len() as u8)?;
            write_bytes(writer, s.as_bytes())
        }
    }
}

fn read_tagged_value<R: Read>(reader: &mut R, logical_type: LogicalType) -> Result<Value> {
    match read_u8(reader)? {
        0 => Ok(Value::Null),
        1 => {
            let n = read_i64_be(reader)?;
            if logical_type == LogicalType::Boolean {
                Ok(Value::Bool(n != 0))
            } else {
                Ok(Value::Int(n))
            }
        }
        2 => Ok(Value::Double(read_f64_be(reader)?)),
        3 => {
            let len = read_u8(reader)? as usize;
            Ok(Value::String(read_utf8(reader, len)?))
        }
        tag => Err(FormatError::UnknownValueTag(tag)),
    }
}

// Packed-value primitives. Bulk values are little-endian and tightly
// packed; the minimal container uses these at the logical width, the raw
// encoder at the analyzer's narrowed width.

pub fn write_values_le<'a, W, I>(writer: &mut W, storage: StorageType, values: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Value>,
{
    let mut buf = Vec::new();
    for value in values {
        match storage {
            StorageType::Uint8 => buf.extend_from_slice(&(value_as_int(value)? as u8).to_le_bytes()),
            StorageType::Uint16 => {
                buf.extend_from_slice(&(value_as_int(value)? as u16).to_le_bytes())
            }
            StorageType::Uint32 => {
                buf.extend_from_slice(&(value_as_int(value)? as u32).to_le_bytes())
            }
            StorageType::Int8 => buf.extend_from_slice(&(value_as_int(value)? as i8).to_le_bytes()),
            StorageType::Int16 => {
                buf.extend_from_slice(&(value_as_int(value)? as i16).to_le_bytes())
            }
            StorageType::Int32 => {
                buf.extend_from_slice(&(value_as_int(value)? as i32).to_le_bytes())
            }
            StorageType::Int64 => buf.extend_from_slice(&value_as_int(value)?.to_le_bytes()),
            StorageType::Float32 => {
                buf.extend_from_slice(&(value_as_double(value)? as f32).to_le_bytes())
            }
            StorageType::Float64 => buf.extend_from_slice(&value_as_double(value)?.to_le_bytes()),
            StorageType::Bool => match value {
                Value::Bool(b) => buf.push(*b as u8),
                other => {
                    return Err(FormatError::ShapeError(format!(
                        "expected boolean value, got {:?}",
                        other
                    )))
                }
            },
            StorageType::String => {
                return Err(FormatError::ShapeError(
                    "strings have no packed representation".to_string(),
                ))
            }
        }
    }
    write_bytes(writer, &buf)
}

pub fn read_values_le<R: Read>(
    reader: &mut R,
    storage: StorageType,
    logical_type: LogicalType,
    count: usize,
) -> Result<Vec<Value>> {
    let width = storage.byte_width();
    if width == 0 {
        return Err(FormatError::ShapeError(
            "strings have no packed representation".to_string(),
        ));
    }
    let data = read_bytes(reader, count * width)?;
    let mut values = Vec::with_capacity(count);
    for chunk in data.chunks_exact(width) {
        let value = match storage {
            StorageType::Uint8 => int_value(chunk[0] as i64, logical_type),
            StorageType::Uint16 => {
                int_value(u16::from_le_bytes([chunk[0], chunk[1]]) as i64, logical_type)
            }
            StorageType::Uint32 => int_value(
                u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as i64,
                logical_type,
            ),
            StorageType::Int8 => int_value(chunk[0] as i8 as i64, logical_type),
            StorageType::Int16 => {
                int_value(i16::from_le_bytes([chunk[0], chunk[1]]) as i64, logical_type)
            }
            StorageType::Int32 => int_value(
                i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as i64,
                logical_type,
            ),
            StorageType::Int64 => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(chunk);
                int_value(i64::from_le_bytes(bytes), logical_type)
            }
            StorageType::Float32 => {
                let bits = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                Value::Double(f32::from_bits(bits) as f64)
            }
            StorageType::Float64 => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(chunk);
                Value::Double(f64::from_bits(u64::from_le_bytes(bytes)))
            }
            StorageType::Bool => Value::Bool(chunk[0] != 0),
            StorageType::String => unreachable!("checked above"),
        };
        values.push(value);
    }
    Ok(values)
}

fn int_value(n: i64, logical_type: LogicalType) -> Value {
    if logical_type == LogicalType::Boolean {
        Value::Bool(n != 0)
    } else {
        Value::Int(n)
    }
}

fn value_as_int(value: &Value) -> Result<i64> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::Bool(b) => Ok(*b as i64),
        other => Err(FormatError::ShapeError(format!(
            "expected integer value, got {:?}",
            other
        ))),
    }
}

fn value_as_double(value: &Value) -> Result<f64> {
    match value {
        Value::Double(d) => Ok(*d),
        other => Err(FormatError::ShapeError(format!(
            "expected float value, got {:?}",
            other
        ))),
    }
}

fn read_utf8<R: Read>(reader: &mut R, len: usize) -> Result<String> {
    let bytes = read_bytes(reader, len)?;
    String::from_utf8(bytes)
        .map_err(|e| FormatError::ShapeError(format!("invalid UTF-8 in string payload: {}", e)))
}
