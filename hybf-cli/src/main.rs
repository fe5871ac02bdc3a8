use clap::{Parser, Subcommand};
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use hybf_core::binary;
use hybf_core::data::{Encoding, FormatType, LogicalType, Value};
use hybf_core::io::{read_bytes, read_u16_be, read_u32_be, read_u8};
use hybf_core::table::{Column, Table};

#[derive(Parser)]
#[command(name = "hybf")]
#[command(about = "A hybrid binary format for tabular data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON table document into a hybf file
    Encode {
        /// Input JSON table
        input: PathBuf,

        /// Output hybf file
        output: PathBuf,
    },
    /// Decode a hybf file back into a JSON table document
    Decode {
        /// Input hybf file
        input: PathBuf,

        /// Output JSON table
        output: PathBuf,
    },
    /// Show container, schema, and per-column encodings of a hybf file
    Info {
        /// Input hybf file
        file: PathBuf,
    },
}

#[derive(Serialize, Deserialize, Debug)]
struct JsonTable {
    columns: Vec<JsonColumn>,
}

#[derive(Serialize, Deserialize, Debug)]
struct JsonColumn {
    name: String,
    #[serde(rename = "type")]
    logical_type: LogicalType,
    values: Vec<serde_json::Value>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Encode { input, output } => encode_file(input, output),
        Commands::Decode { input, output } => decode_file(input, output),
        Commands::Info { file } => show_info(file),
    }
}

fn encode_file(input: &PathBuf, output: &PathBuf) -> Result<()> {
    let json_content = fs::read_to_string(input)?;
    let json_table: JsonTable = serde_json::from_str(&json_content)?;

    let table = table_from_json(&json_table)?;
    let bytes = binary::encode(&table)?;
    fs::write(output, &bytes)?;

    println!(
        "Encoded {} columns x {} rows into {} ({} bytes)",
        table.num_columns(),
        table.row_count(),
        output.display(),
        bytes.len()
    );
    Ok(())
}

fn decode_file(input: &PathBuf, output: &PathBuf) -> Result<()> {
    let bytes = fs::read(input)?;
    let table = binary::decode(&bytes)?;

    let json_table = table_to_json(&table);
    fs::write(output, serde_json::to_string_pretty(&json_table)?)?;

    println!(
        "Decoded {} columns x {} rows into {}",
        table.num_columns(),
        table.row_count(),
        output.display()
    );
    Ok(())
}

fn show_info(file: &PathBuf) -> Result<()> {
    let bytes = fs::read(file)?;
    println!("File info for: {}", file.display());
    println!("  size: {} bytes", bytes.len());

    let info = inspect(&bytes)?;
    let container = match info.format {
        FormatType::Minimal => "minimal",
        FormatType::Compressed => "compressed",
    };
    println!("  container: {}", container);
    println!("  rows: {}", info.row_count);
    println!("  columns:");
    for column in &info.columns {
        match column.encoding {
            Some(encoding) => println!(
                "    {} ({:?}, {})",
                column.name,
                column.logical_type,
                encoding_name(encoding)
            ),
            None => println!("    {} ({:?})", column.name, column.logical_type),
        }
    }
    Ok(())
}

struct FileInfo {
    format: FormatType,
    row_count: u32,
    columns: Vec<ColumnInfo>,
}

struct ColumnInfo {
    name: String,
    logical_type: LogicalType,
    /// Only the compressed container records per-column encodings.
    encoding: Option<Encoding>,
}

/// Walk the header and column directory without materializing the table.
fn inspect(bytes: &[u8]) -> Result<FileInfo> {
    let mut reader = std::io::Cursor::new(bytes);

    let magic = read_bytes(&mut reader, 4)?;
    if magic != binary::MAGIC {
        return Err(eyre::eyre!("not a hybf file"));
    }
    let version = read_u8(&mut reader)?;
    if version != binary::VERSION {
        return Err(eyre::eyre!("unsupported version {}", version));
    }
    let format = FormatType::from_code(read_u8(&mut reader)?)
        .ok_or_else(|| eyre::eyre!("unknown container format"))?;
    let num_columns = read_u16_be(&mut reader)? as usize;

    let mut columns = Vec::with_capacity(num_columns);
    for _ in 0..num_columns {
        let code = read_u8(&mut reader)?;
        let logical_type = LogicalType::from_code(code)
            .ok_or_else(|| eyre::eyre!("unknown logical type code {}", code))?;
        let name_len = read_u8(&mut reader)? as usize;
        let name = String::from_utf8(read_bytes(&mut reader, name_len)?)?;
        if format == FormatType::Minimal {
            read_u8(&mut reader)?; // nullable flag
        }
        columns.push(ColumnInfo {
            name,
            logical_type,
            encoding: None,
        });
    }
    let row_count = read_u32_be(&mut reader)?;

    if format == FormatType::Compressed {
        for column in &mut columns {
            let tag = read_u8(&mut reader)?;
            column.encoding = Encoding::from_tag(tag);
            let payload_len = read_u32_be(&mut reader)? as usize;
            read_bytes(&mut reader, payload_len)?;
        }
    }

    Ok(FileInfo {
        format,
        row_count,
        columns,
    })
}

fn encoding_name(encoding: Encoding) -> &'static str {
    match encoding {
        Encoding::Raw => "raw",
        Encoding::Rle => "run-length",
        Encoding::Dictionary => "dictionary",
        Encoding::SingleValue => "single-value",
        Encoding::Null => "null",
    }
}

fn table_from_json(json_table: &JsonTable) -> Result<Table> {
    let mut columns = Vec::with_capacity(json_table.columns.len());
    for json_column in &json_table.columns {
        let mut values = Vec::with_capacity(json_column.values.len());
        for value in &json_column.values {
            values.push(value_from_json(json_column.logical_type, value)?);
        }
        columns.push(Column::new(
            json_column.name.clone(),
            json_column.logical_type,
            values,
        )?);
    }
    Ok(Table::new(columns)?)
}

fn value_from_json(logical_type: LogicalType, value: &serde_json::Value) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let converted = match logical_type {
        LogicalType::Int32 | LogicalType::Int64 => value.as_i64().map(Value::Int),
        LogicalType::Float32 | LogicalType::Float64 => value.as_f64().map(Value::Double),
        LogicalType::String => value.as_str().map(|s| Value::String(s.to_string())),
        LogicalType::Boolean => value.as_bool().map(Value::Bool),
    };
    converted.ok_or_else(|| eyre::eyre!("value {} does not fit type {:?}", value, logical_type))
}

fn table_to_json(table: &Table) -> JsonTable {
    let columns = table
        .columns()
        .iter()
        .map(|column| JsonColumn {
            name: column.name().to_string(),
            logical_type: column.logical_type(),
            values: column.values().iter().map(value_to_json).collect(),
        })
        .collect();
    JsonTable { columns }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Int(n) => serde_json::json!(n),
        Value::Double(d) if d.is_finite() => serde_json::json!(d),
        // JSON has no infinities or NaN; render them as strings
        Value::Double(d) => serde_json::json!(d.to_string()),
        Value::Bool(b) => serde_json::json!(b),
        Value::String(s) => serde_json::json!(s),
    }
}
