// End-to-end scenarios over literal tables, checked byte-for-byte against
// the wire layout.

mod common;

use std::io::Cursor;

use common::table_bit_eq;
use hybf_core::binary;
use hybf_core::data::{LogicalType, Value};
use hybf_core::table::{Column, Table};

fn strings(values: &[&str]) -> Vec<Value> {
    values.iter().map(|s| Value::String(s.to_string())).collect()
}

/// Tiny mixed table lands in the minimal container.
#[test]
fn test_s1_minimal_tiny_mixed_table() {
    let table = Table::new(vec![
        Column::new(
            "int_col",
            LogicalType::Int32,
            vec![Value::Int(1), Value::Int(2)],
        )
        .unwrap(),
        Column::new(
            "float_col",
            LogicalType::Float64,
            vec![Value::Double(1.1), Value::Double(2.2)],
        )
        .unwrap(),
        Column::new("str_col", LogicalType::String, strings(&["a", "b"])).unwrap(),
        Column::new(
            "bool_col",
            LogicalType::Boolean,
            vec![Value::Bool(true), Value::Bool(false)],
        )
        .unwrap(),
        Column::new("null_col", LogicalType::Float64, vec![Value::Null, Value::Null]).unwrap(),
    ])
    .unwrap();

    let bytes = binary::encode(&table).unwrap();

    assert_eq!(&bytes[0..4], b"HYBF");
    assert_eq!(bytes[4], 1, "version");
    assert_eq!(bytes[5], 1, "minimal container");
    assert_eq!(u16::from_be_bytes([bytes[6], bytes[7]]), 5, "num_columns");

    // int_col directory entry: INT32, non-nullable
    assert_eq!(bytes[8], 1);
    assert_eq!(bytes[9], 7);
    assert_eq!(&bytes[10..17], b"int_col");
    assert_eq!(bytes[17], 0);

    // null_col directory entry: FLOAT64, nullable
    assert_eq!(bytes[51], 4);
    assert_eq!(bytes[52], 8);
    assert_eq!(&bytes[53..61], b"null_col");
    assert_eq!(bytes[61], 1, "null_col is nullable");

    assert_eq!(&bytes[62..66], &[0, 0, 0, 2], "row_count");

    // int_col stores as INT32: two 4-byte little-endian values
    assert_eq!(&bytes[66..74], &[1, 0, 0, 0, 2, 0, 0, 0]);

    // null_col payload is one bitmap byte with both rows null, no values
    assert_eq!(bytes[bytes.len() - 1], 0b0000_0011);
    assert_eq!(bytes.len(), 97);

    let restored = binary::decode(&bytes).unwrap();
    assert!(table_bit_eq(&table, &restored));
}

/// A constant column compresses to SINGLE_VALUE.
#[test]
fn test_s2_compressed_constant_column() {
    let table = Table::new(vec![Column::new(
        "const",
        LogicalType::String,
        strings(&vec!["x"; 1000]),
    )
    .unwrap()])
    .unwrap();

    let bytes = binary::encode(&table).unwrap();

    assert_eq!(bytes[5], 2, "compressed container");
    assert_eq!(u16::from_be_bytes([bytes[6], bytes[7]]), 1);
    assert_eq!(bytes[8], 5, "STRING type code");
    assert_eq!(&bytes[10..15], b"const");
    assert_eq!(&bytes[15..19], &[0, 0, 0x03, 0xE8], "row_count 1000");

    assert_eq!(bytes[19], 4, "SINGLE_VALUE tag");
    assert_eq!(&bytes[20..24], &[0, 0, 0, 7], "payload length");
    // value_tag=3 (string), length 1, 'x', then u32 1000
    assert_eq!(&bytes[24..31], &[3, 1, b'x', 0, 0, 0x03, 0xE8]);
    assert_eq!(bytes.len(), 31);

    let restored = binary::decode(&bytes).unwrap();
    assert!(table_bit_eq(&table, &restored));
}

/// Low-cardinality strings dictionary-encode with two-bit indices.
#[test]
fn test_s3_compressed_dictionary() {
    let categories = ["cat_a", "cat_b", "cat_c"];
    let values: Vec<Value> = (0..1000)
        .map(|i| Value::String(categories[i % 3].to_string()))
        .collect();
    let table =
        Table::new(vec![Column::new("cats", LogicalType::String, values).unwrap()]).unwrap();

    let bytes = binary::encode(&table).unwrap();

    assert_eq!(bytes[5], 2, "compressed container");
    assert_eq!(bytes[18], 3, "DICTIONARY tag");
    let payload_len = u32::from_be_bytes([bytes[19], bytes[20], bytes[21], bytes[22]]) as usize;
    // 3 metadata bytes + three 6-byte entries + ⌈1000·2/8⌉ index bytes
    assert_eq!(payload_len, 3 + 18 + 250);

    let payload = &bytes[23..23 + payload_len];
    assert_eq!(&payload[0..2], &[0, 3], "dict_size");
    assert_eq!(payload[2], 2, "bits_per_index");
    assert_eq!(&payload[3..5], &[5, b'c']);

    let restored = binary::decode(&bytes).unwrap();
    assert!(table_bit_eq(&table, &restored));
}

/// Repetitive numerics run-length encode.
#[test]
fn test_s4_compressed_rle_numeric() {
    let values: Vec<Value> = (0..1000).map(|i| Value::Int(i / 100)).collect();
    let table = Table::new(vec![Column::new("runs", LogicalType::Int64, values).unwrap()]).unwrap();

    let bytes = binary::encode(&table).unwrap();

    assert_eq!(bytes[5], 2, "compressed container");
    assert_eq!(bytes[18], 2, "RLE tag");
    let payload = &bytes[23..];
    assert_eq!(&payload[0..4], &[0, 0, 0, 10], "run_count");

    // Ten records of {tag=1, i64 value, u32 length=100}
    for run in 0..10u8 {
        let record = &payload[4 + run as usize * 13..4 + (run as usize + 1) * 13];
        assert_eq!(record[0], 1, "integer value tag");
        assert_eq!(
            i64::from_be_bytes(record[1..9].try_into().unwrap()),
            run as i64
        );
        assert_eq!(&record[9..13], &[0, 0, 0, 100], "run length");
    }

    let restored = binary::decode(&bytes).unwrap();
    assert!(table_bit_eq(&table, &restored));
}

/// An all-null column stores nothing but its length.
#[test]
fn test_s5_compressed_all_null_column() {
    let table = Table::new(vec![Column::new(
        "nulls",
        LogicalType::String,
        vec![Value::Null; 1000],
    )
    .unwrap()])
    .unwrap();

    let bytes = binary::encode(&table).unwrap();

    assert_eq!(bytes[5], 2, "compressed container");
    assert_eq!(bytes[19], 5, "NULL tag");
    assert_eq!(&bytes[20..24], &[0, 0, 0, 4], "payload length");
    assert_eq!(&bytes[24..28], &[0, 0, 0x03, 0xE8], "stored row count");
    assert_eq!(bytes.len(), 28);

    let restored = binary::decode(&bytes).unwrap();
    assert_eq!(restored.column(0).unwrap().values(), &vec![Value::Null; 1000][..]);
}

/// Edge cases the compressed container must carry exactly: empty strings,
/// multi-byte UTF-8, and IEEE-754 specials.
#[test]
fn test_s6_compressed_edge_cases() {
    let table = Table::new(vec![
        Column::new(
            "empty_strings",
            LogicalType::String,
            strings(&["", "normal", ""]),
        )
        .unwrap(),
        Column::new("unicode", LogicalType::String, strings(&["Hello", "世界", "🌍"])).unwrap(),
        Column::new(
            "special_nums",
            LogicalType::Float64,
            vec![
                Value::Double(f64::INFINITY),
                Value::Double(f64::NEG_INFINITY),
                Value::Double(f64::NAN),
            ],
        )
        .unwrap(),
    ])
    .unwrap();

    let mut bytes = Vec::new();
    binary::write_compressed(&table, &mut bytes).unwrap();
    let restored = binary::read_compressed(&mut Cursor::new(bytes)).unwrap();

    let empties = restored.column_by_name("empty_strings").unwrap();
    assert_eq!(
        empties.values(),
        &strings(&["", "normal", ""])[..],
        "empty strings stay empty, not null"
    );

    let unicode = restored.column_by_name("unicode").unwrap();
    match (&unicode.values()[1], &unicode.values()[2]) {
        (Value::String(cjk), Value::String(globe)) => {
            assert_eq!(cjk, "世界");
            assert_eq!(cjk.len(), 6, "UTF-8 byte length preserved");
            assert_eq!(globe, "🌍");
            assert_eq!(globe.len(), 4);
        }
        other => panic!("expected strings, got {:?}", other),
    }

    let specials = restored.column_by_name("special_nums").unwrap();
    match specials.values() {
        [Value::Double(pos), Value::Double(neg), Value::Double(nan)] => {
            assert_eq!(pos.to_bits(), f64::INFINITY.to_bits());
            assert_eq!(neg.to_bits(), f64::NEG_INFINITY.to_bits());
            assert_eq!(nan.to_bits(), f64::NAN.to_bits());
        }
        other => panic!("expected three doubles, got {:?}", other),
    }
}

/// Documented minimal-container limitation: a zero length prefix doubles
/// as the null sentinel, so empty strings decode as null there.
#[test]
fn test_minimal_container_empty_string_degrades_to_null() {
    let table = Table::new(vec![Column::new(
        "s",
        LogicalType::String,
        strings(&["", "a"]),
    )
    .unwrap()])
    .unwrap();

    let mut bytes = Vec::new();
    binary::write_minimal(&table, &mut bytes).unwrap();
    let restored = binary::read_minimal(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(
        restored.column(0).unwrap().values(),
        &[Value::Null, Value::String("a".to_string())]
    );
}
