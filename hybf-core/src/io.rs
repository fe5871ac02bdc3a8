// Byte-level I/O primitives for the hybf wire format.
//
// Framing integers (header fields, lengths, counts) are big-endian; bulk
// numeric payloads are little-endian. Reads that run out of input fail
// with `Truncated`.

use std::io::{Read, Write};

use crate::error::Result;

pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> Result<()> {
    writer.write_all(&[value])?;
    Ok(())
}

pub fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn write_u16_be<W: Write>(writer: &mut W, value: u16) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

pub fn read_u16_be<R: Read>(reader: &mut R) -> Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

pub fn write_u32_be<W: Write>(writer: &mut W, value: u32) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

pub fn read_u32_be<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

pub fn write_u64_be<W: Write>(writer: &mut W, value: u64) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

pub fn read_u64_be<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

pub fn write_i64_be<W: Write>(writer: &mut W, value: i64) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

pub fn read_i64_be<R: Read>(reader: &mut R) -> Result<i64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(i64::from_be_bytes(buf))
}

pub fn write_f64_be<W: Write>(writer: &mut W, value: f64) -> Result<()> {
    writer.write_all(&value.to_bits().to_be_bytes())?;
    Ok(())
}

pub fn read_f64_be<R: Read>(reader: &mut R) -> Result<f64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(f64::from_bits(u64::from_be_bytes(buf)))
}

pub fn write_bytes<W: Write>(writer: &mut W, data: &[u8]) -> Result<()> {
    writer.write_all(data)?;
    Ok(())
}

pub fn read_bytes<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Write a null bitmap of `⌈len/8⌉` bytes. Bit `i` (LSB-first within each
/// byte) is set iff `nulls[i]` is true.
pub fn write_null_bitmap<W: Write>(writer: &mut W, nulls: &[bool]) -> Result<()> {
    let mut bitmap = vec![0u8; (nulls.len() + 7) / 8];
    for (i, &is_null) in nulls.iter().enumerate() {
        if is_null {
            bitmap[i / 8] |= 1 << (i % 8);
        }
    }
    writer.write_all(&bitmap)?;
    Ok(())
}

/// Read a null bitmap covering `row_count` rows back into per-row flags.
pub fn read_null_bitmap<R: Read>(reader: &mut R, row_count: usize) -> Result<Vec<bool>> {
    let bitmap = read_bytes(reader, (row_count + 7) / 8)?;
    Ok((0..row_count)
        .map(|i| bitmap[i / 8] & (1 << (i % 8)) != 0)
        .collect())
}
