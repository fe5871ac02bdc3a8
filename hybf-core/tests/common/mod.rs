// Test utilities and generators for hybf property-based testing

#![allow(dead_code)]

use hybf_core::data::{LogicalType, Value};
use hybf_core::table::{Column, Table};
use proptest::prelude::*;

pub fn arb_logical_type() -> impl Strategy<Value = LogicalType> {
    prop_oneof![
        Just(LogicalType::Int32),
        Just(LogicalType::Int64),
        Just(LogicalType::Float32),
        Just(LogicalType::Float64),
        Just(LogicalType::String),
        Just(LogicalType::Boolean),
    ]
}

/// One cell of the given type, null roughly a fifth of the time.
///
/// Strings are kept non-empty because the minimal container cannot
/// distinguish an empty string from null; floats stay finite here (the
/// NaN/infinity paths have their own scenario tests).
pub fn arb_cell(logical_type: LogicalType) -> BoxedStrategy<Value> {
    let non_null = match logical_type {
        LogicalType::Int32 => any::<i32>().prop_map(|n| Value::Int(n as i64)).boxed(),
        LogicalType::Int64 => any::<i64>().prop_map(Value::Int).boxed(),
        LogicalType::Float32 => (-1.0e6f32..1.0e6f32)
            .prop_map(|f| Value::Double(f as f64))
            .boxed(),
        LogicalType::Float64 => (-1.0e12f64..1.0e12f64).prop_map(Value::Double).boxed(),
        LogicalType::String => "[a-zA-Z0-9]{1,12}".prop_map(Value::String).boxed(),
        LogicalType::Boolean => any::<bool>().prop_map(Value::Bool).boxed(),
    };
    prop_oneof![
        1 => Just(Value::Null),
        4 => non_null,
    ]
    .boxed()
}

/// Maybe one column of `rows` cells, named by position to keep table
/// names unique.
fn arb_column_slot(index: usize, rows: usize) -> impl Strategy<Value = Option<Column>> {
    prop_oneof![
        1 => Just(None),
        4 => arb_logical_type().prop_flat_map(move |ty| {
            prop::collection::vec(arb_cell(ty), rows).prop_map(move |values| {
                Some(
                    Column::new(format!("col_{}", index), ty, values)
                        .expect("generated values fit their type"),
                )
            })
        }),
    ]
}

/// A table of up to five columns sharing one row count.
pub fn arb_table() -> impl Strategy<Value = Table> {
    (0usize..30).prop_flat_map(|rows| {
        (
            arb_column_slot(0, rows),
            arb_column_slot(1, rows),
            arb_column_slot(2, rows),
            arb_column_slot(3, rows),
            arb_column_slot(4, rows),
        )
            .prop_map(|(a, b, c, d, e)| {
                let columns: Vec<Column> = [a, b, c, d, e].into_iter().flatten().collect();
                Table::new(columns).expect("generated columns are rectangular")
            })
    })
}

/// Table equality with bit-exact doubles, the comparison the round-trip
/// properties care about.
pub fn table_bit_eq(a: &Table, b: &Table) -> bool {
    a.num_columns() == b.num_columns()
        && a.columns().iter().zip(b.columns()).all(|(x, y)| {
            x.name() == y.name()
                && x.logical_type() == y.logical_type()
                && x.len() == y.len()
                && x.values().iter().zip(y.values()).all(|(v, w)| v.bit_eq(w))
        })
}
