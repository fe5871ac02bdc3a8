// Binary layer - container formats and the on-disk wire protocol
//
// File layout (both containers):
// ```text
// [Magic: 4 bytes] "HYBF"
// [Version: 1 byte] 1
// [Format Type: 1 byte] 1 = minimal, 2 = compressed
// [Column Count: 2 bytes] big-endian u16
// [Column Directory: variable]
// [Row Count: 4 bytes] big-endian u32
// [Column Payloads: variable] in directory order
// ```
//
// Minimal directory entry: {logical_type: u8, name_len: u8, name, nullable: u8}.
// Payloads are packed back to back without framing.
//
// Compressed directory entry: {logical_type: u8, name_len: u8, name};
// nullability is implicit in the per-column encoding. Each payload is
// framed as {encoding_tag: u8, payload_len: u32 big-endian, payload}.

use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use crate::analyze::{analyze, Analysis};
use crate::data::{Encoding, FormatType, LogicalType, Value};
use crate::encoding::{read_column_payload, read_values_le, write_column_payload, write_values_le};
use crate::error::{FormatError, Result};
use crate::io::{
    read_bytes, read_null_bitmap, read_u16_be, read_u32_be, read_u8, write_bytes,
    write_null_bitmap, write_u16_be, write_u32_be, write_u8,
};
use crate::select::{select, SelectorConfig};
use crate::table::{Column, Table, MAX_NAME_LEN};

/// Four-byte prefix identifying a hybf stream.
pub const MAGIC: &[u8; 4] = b"HYBF";

/// Current wire format version.
pub const VERSION: u8 = 1;

/// Estimated-size cutoff: tables at or below this choose the minimal
/// container.
pub const SIZE_THRESHOLD: usize = 4096;

/// Encode a table into a fresh byte buffer, choosing the container by
/// estimated size.
pub fn encode(table: &Table) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write(table, &mut buf)?;
    Ok(buf)
}

/// Decode a table from a byte slice, dispatching on the format type byte.
pub fn decode(data: &[u8]) -> Result<Table> {
    read(&mut Cursor::new(data))
}

/// Write a table to a sink. Tables estimated at or below
/// [`SIZE_THRESHOLD`] bytes take the minimal container, larger ones the
/// compressed container.
pub fn write<W: Write>(table: &Table, writer: &mut W) -> Result<()> {
    if estimated_size(table) <= SIZE_THRESHOLD {
        write_minimal(table, writer)
    } else {
        write_compressed(table, writer)
    }
}

/// Read a table from a seekable source, dispatching on the format type
/// byte at offset 5. The stream position is restored before the container
/// reader takes over.
pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Table> {
    let start = reader.stream_position()?;
    reader.seek(SeekFrom::Start(5))?;
    let code = read_u8(reader)?;
    reader.seek(SeekFrom::Start(start))?;
    match FormatType::from_code(code) {
        Some(FormatType::Minimal) => read_minimal(reader),
        Some(FormatType::Compressed) => read_compressed(reader),
        None => Err(FormatError::UnsupportedFormat(code)),
    }
}

/// Estimated in-memory footprint used for container selection: column data
/// plus name bytes, the fixed header, and two directory bytes per column.
/// Strings count their UTF-8 length plus a 24-byte header per row.
pub fn estimated_size(table: &Table) -> usize {
    let mut size = 8 + 2 * table.num_columns();
    for column in table.columns() {
        size += column.name().len();
        size += match column.logical_type() {
            LogicalType::String => column
                .values()
                .iter()
                .map(|value| match value {
                    Value::String(s) => s.len() + 24,
                    _ => 24,
                })
                .sum(),
            ty => column.len() * ty.byte_width(),
        };
    }
    size
}

// Minimal container

/// Write a table in the minimal container: logical-width payloads, no
/// per-column compression. Empty strings are not representable and are
/// written as null.
pub fn write_minimal<W: Write>(table: &Table, writer: &mut W) -> Result<()> {
    validate_for_write(table)?;
    warn_mixed_nulls(table);
    let analyses: Vec<Analysis> = table.columns().iter().map(analyze).collect();

    write_header(writer, FormatType::Minimal, table.num_columns())?;
    for (column, analysis) in table.columns().iter().zip(&analyses) {
        write_u8(writer, column.logical_type().code())?;
        write_u8(writer, column.name().len() as u8)?;
        write_bytes(writer, column.name().as_bytes())?;
        write_u8(writer, analysis.nullable as u8)?;
    }
    write_u32_be(writer, table.row_count() as u32)?;
    for (column, analysis) in table.columns().iter().zip(&analyses) {
        write_minimal_column(writer, column, analysis.nullable)?;
    }
    Ok(())
}

/// Read a table from the minimal container.
pub fn read_minimal<R: Read>(reader: &mut R) -> Result<Table> {
    let (format, num_columns) = read_header(reader)?;
    if format != FormatType::Minimal {
        return Err(FormatError::WrongContainer {
            expected: FormatType::Minimal,
            actual: format,
        });
    }

    let mut directory = Vec::with_capacity(num_columns);
    for _ in 0..num_columns {
        let logical_type = read_logical_type(reader)?;
        let name = read_name(reader)?;
        let nullable = read_u8(reader)? != 0;
        directory.push((logical_type, name, nullable));
    }
    let row_count = read_u32_be(reader)? as usize;

    let mut columns = Vec::with_capacity(num_columns);
    for (logical_type, name, nullable) in directory {
        let values = read_minimal_column(reader, logical_type, nullable, row_count)?;
        columns.push(Column::new(name, logical_type, values)?);
    }
    Table::new(columns)
}

fn write_minimal_column<W: Write>(writer: &mut W, column: &Column, nullable: bool) -> Result<()> {
    match column.logical_type() {
        LogicalType::String => {
            for value in column.values() {
                match value {
                    Value::String(s) if !s.is_empty() => {
                        if s.len() > u8::MAX as usize {
                            return Err(FormatError::ShapeError(format!(
                                "string value of {} bytes exceeds the minimal container limit of {}",
                                s.len(),
                                u8::MAX
                            )));
                        }
                        write_u8(writer, s.len() as u8)?;
                        write_bytes(writer, s.as_bytes())?;
                    }
                    // A zero length prefix doubles as the null sentinel, so
                    // empty strings degrade to null here.
                    _ => write_u8(writer, 0)?,
                }
            }
            Ok(())
        }
        ty => {
            let storage = ty.native_storage();
            if nullable {
                let nulls: Vec<bool> = column.values().iter().map(Value::is_null).collect();
                write_null_bitmap(writer, &nulls)?;
                write_values_le(
                    writer,
                    storage,
                    column.values().iter().filter(|v| !v.is_null()),
                )
            } else {
                write_values_le(writer, storage, column.values())
            }
        }
    }
}

fn read_minimal_column<R: Read>(
    reader: &mut R,
    logical_type: LogicalType,
    nullable: bool,
    row_count: usize,
) -> Result<Vec<Value>> {
    match logical_type {
        LogicalType::String => {
            let mut values = Vec::with_capacity(row_count);
            for _ in 0..row_count {
                let len = read_u8(reader)? as usize;
                if len == 0 {
                    values.push(Value::Null);
                } else {
                    let bytes = read_bytes(reader, len)?;
                    let s = String::from_utf8(bytes).map_err(|e| {
                        FormatError::ShapeError(format!("invalid UTF-8 in string payload: {}", e))
                    })?;
                    values.push(Value::String(s));
                }
            }
            Ok(values)
        }
        ty => {
            let storage = ty.native_storage();
            if nullable {
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
                            non_null.next().unwrap_or(Value::Null)
                        }
                    })
                    .collect())
            } else {
                read_values_le(reader, storage, logical_type, row_count)
            }
        }
    }
}

// Compressed container

/// Write a table in the compressed container with default selector
/// thresholds.
pub fn write_compressed<W: Write>(table: &Table, writer: &mut W) -> Result<()> {
    write_compressed_with(table, &SelectorConfig::default(), writer)
}

/// Write a table in the compressed container, choosing an encoding per
/// column with the given thresholds. Payloads are staged in a per-column
/// buffer to size the length prefix.
pub fn write_compressed_with<W: Write>(
    table: &Table,
    config: &SelectorConfig,
    writer: &mut W,
) -> Result<()> {
    validate_for_write(table)?;
    warn_mixed_nulls(table);

    write_header(writer, FormatType::Compressed, table.num_columns())?;
    for column in table.columns() {
        write_u8(writer, column.logical_type().code())?;
        write_u8(writer, column.name().len() as u8)?;
        write_bytes(writer, column.name().as_bytes())?;
    }
    write_u32_be(writer, table.row_count() as u32)?;

    for column in table.columns() {
        let encoding = select(config, column);
        let mut payload = Vec::new();
        write_column_payload(&mut payload, encoding, column)?;
        write_u8(writer, encoding.tag())?;
        write_u32_be(writer, payload.len() as u32)?;
        write_bytes(writer, &payload)?;
    }
    Ok(())
}

/// Read a table from the compressed container.
pub fn read_compressed<R: Read>(reader: &mut R) -> Result<Table> {
    let (format, num_columns) = read_header(reader)?;
    if format != FormatType::Compressed {
        return Err(FormatError::WrongContainer {
            expected: FormatType::Compressed,
            actual: format,
        });
    }

    let mut directory = Vec::with_capacity(num_columns);
    for _ in 0..num_columns {
        let logical_type = read_logical_type(reader)?;
        let name = read_name(reader)?;
        directory.push((logical_type, name));
    }
    let row_count = read_u32_be(reader)? as usize;

    let mut columns = Vec::with_capacity(num_columns);
    for (logical_type, name) in directory {
        let tag = read_u8(reader)?;
        let encoding = Encoding::from_tag(tag).ok_or(FormatError::UnknownEncoding(tag))?;
        let payload_len = read_u32_be(reader)? as usize;
        let payload = read_bytes(reader, payload_len)?;
        let mut cursor = Cursor::new(payload);
        let values = read_column_payload(&mut cursor, encoding, logical_type, row_count)?;
        columns.push(Column::new(name, logical_type, values)?);
    }
    Table::new(columns)
}

// Header and directory pieces

fn write_header<W: Write>(writer: &mut W, format: FormatType, num_columns: usize) -> Result<()> {
    write_bytes(writer, MAGIC)?;
    write_u8(writer, VERSION)?;
    write_u8(writer, format.code())?;
    write_u16_be(writer, num_columns as u16)
}

fn read_header<R: Read>(reader: &mut R) -> Result<(FormatType, usize)> {
    let magic = read_bytes(reader, MAGIC.len())?;
    if magic != MAGIC {
        return Err(FormatError::InvalidMagic);
    }
    let version = read_u8(reader)?;
    if version != VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }
    let code = read_u8(reader)?;
    let format = FormatType::from_code(code).ok_or(FormatError::UnsupportedFormat(code))?;
    let num_columns = read_u16_be(reader)? as usize;
    Ok((format, num_columns))
}

fn read_logical_type<R: Read>(reader: &mut R) -> Result<LogicalType> {
    let code = read_u8(reader)?;
    LogicalType::from_code(code)
        .ok_or_else(|| FormatError::ShapeError(format!("unknown logical type code {}", code)))
}

fn read_name<R: Read>(reader: &mut R) -> Result<String> {
    let len = read_u8(reader)? as usize;
    let bytes = read_bytes(reader, len)?;
    String::from_utf8(bytes)
        .map_err(|e| FormatError::ShapeError(format!("invalid UTF-8 in column name: {}", e)))
}

fn validate_for_write(table: &Table) -> Result<()> {
    if table.num_columns() > u16::MAX as usize {
        return Err(FormatError::ShapeError(format!(
            "{} columns exceed the directory limit of {}",
            table.num_columns(),
            u16::MAX
        )));
    }
    if table.row_count() > u32::MAX as usize {
        return Err(FormatError::ShapeError(format!(
            "{} rows exceed the row count limit of {}",
            table.row_count(),
            u32::MAX
        )));
    }
    for column in table.columns() {
        if column.name().len() > MAX_NAME_LEN {
            return Err(FormatError::NameTooLong(column.name().to_string()));
        }
    }
    Ok(())
}

/// A float column holding both null and NaN is ambiguous in spirit: nulls
/// travel in the bitmap while NaN stays a value. Advise once per encode.
fn warn_mixed_nulls(table: &Table) {
    for column in table.columns() {
        if !column.logical_type().is_float() || !column.has_nulls() {
            continue;
        }
        let has_nan = column
            .values()
            .iter()
            .any(|v| matches!(v, Value::Double(d) if d.is_nan()));
        if has_nan {
            log::warn!(
                "column '{}' mixes null and NaN; nulls are encoded in the bitmap, NaN is kept as a value",
                column.name()
            );
            return;
        }
    }
}
