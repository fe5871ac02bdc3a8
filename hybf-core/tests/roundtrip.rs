// Property-based round-trip tests for hybf

mod common;

use std::io::Cursor;

use common::*;
use hybf_core::analyze::analyze;
use hybf_core::binary;
use hybf_core::data::{LogicalType, Value};
use hybf_core::encoding::{read_values_le, write_values_le};
use hybf_core::select::{select, SelectorConfig};
use hybf_core::table::Column;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// decode(encode(T)) == T through the container factory.
    #[test]
    fn test_factory_roundtrip(table in arb_table()) {
        let bytes = binary::encode(&table)?;
        let restored = binary::decode(&bytes)?;
        prop_assert!(table_bit_eq(&table, &restored));
    }

    /// The minimal container round-trips any table it can express.
    #[test]
    fn test_minimal_roundtrip(table in arb_table()) {
        let mut bytes = Vec::new();
        binary::write_minimal(&table, &mut bytes)?;
        let restored = binary::read_minimal(&mut Cursor::new(bytes))?;
        prop_assert!(table_bit_eq(&table, &restored));
    }

    /// The compressed container round-trips any table.
    #[test]
    fn test_compressed_roundtrip(table in arb_table()) {
        let mut bytes = Vec::new();
        binary::write_compressed(&table, &mut bytes)?;
        let restored = binary::read_compressed(&mut Cursor::new(bytes))?;
        prop_assert!(table_bit_eq(&table, &restored));
    }

    /// Every emitted stream opens with the magic, version 1, then a known
    /// format type byte.
    #[test]
    fn test_header_prefix(table in arb_table()) {
        let bytes = binary::encode(&table)?;
        prop_assert_eq!(&bytes[0..4], b"HYBF");
        prop_assert_eq!(bytes[4], 1);
        prop_assert!(bytes[5] == 1 || bytes[5] == 2);
    }

    /// The factory picks the minimal container exactly when the estimator
    /// says the table fits the threshold.
    #[test]
    fn test_container_selection_monotonicity(table in arb_table()) {
        let bytes = binary::encode(&table)?;
        let expect_minimal = binary::estimated_size(&table) <= binary::SIZE_THRESHOLD;
        prop_assert_eq!(bytes[5] == 1, expect_minimal);
    }

    /// Selecting twice yields the same encoding.
    #[test]
    fn test_selection_idempotence(table in arb_table()) {
        let config = SelectorConfig::default();
        for column in table.columns() {
            prop_assert_eq!(select(&config, column), select(&config, column));
        }
    }

    /// Narrowed integer storage loses nothing: packing through the
    /// analyzer's width and widening again reproduces every value.
    #[test]
    fn test_integer_narrowing_roundtrip(values in prop::collection::vec(any::<i64>(), 0..100)) {
        let cells: Vec<Value> = values.iter().map(|&n| Value::Int(n)).collect();
        let column = Column::new("n", LogicalType::Int64, cells.clone()).unwrap();
        let storage = analyze(&column).storage;

        let mut packed = Vec::new();
        write_values_le(&mut packed, storage, cells.iter())?;
        let restored = read_values_le(
            &mut Cursor::new(packed),
            storage,
            LogicalType::Int64,
            cells.len(),
        )?;
        prop_assert_eq!(restored, cells);
    }

    /// Float narrowing only ever fires when the round trip is bit-exact.
    #[test]
    fn test_float_narrowing_roundtrip(values in prop::collection::vec(any::<f64>(), 1..100)) {
        let cells: Vec<Value> = values.iter().map(|&f| Value::Double(f)).collect();
        let column = Column::new("f", LogicalType::Float64, cells.clone()).unwrap();
        let storage = analyze(&column).storage;

        let mut packed = Vec::new();
        write_values_le(&mut packed, storage, cells.iter())?;
        let restored = read_values_le(
            &mut Cursor::new(packed),
            storage,
            LogicalType::Float64,
            cells.len(),
        )?;
        for (a, b) in cells.iter().zip(&restored) {
            prop_assert!(a.bit_eq(b), "{:?} -> {:?} through {:?}", a, b, storage);
        }
    }
}
