use dxdb_core::{ColumnType, Value};
use proptest::prelude::*;
use std::cmp::Ordering;

fn scalar(column_type: ColumnType) -> BoxedStrategy<Value> {
    match column_type {
        ColumnType::Boolean => any::<bool>().prop_map(Value::Boolean).boxed(),
        ColumnType::Date => any::<i64>().prop_map(Value::Date).boxed(),
        ColumnType::Double => any::<f64>().prop_map(Value::Double).boxed(),
        ColumnType::Float => any::<f32>().prop_map(Value::Float).boxed(),
        ColumnType::Integer => any::<i64>().prop_map(Value::Integer).boxed(),
        _ => "[a-zA-Z0-9éÉ ]{0,8}".prop_map(Value::String).boxed(),
    }
}

/// Values of a column type, including nulls
fn value_of(column_type: ColumnType) -> BoxedStrategy<Value> {
    let present = if column_type.is_array() {
        prop::collection::vec(scalar(column_type.element_type()), 0..4)
            .prop_map(Value::Array)
            .boxed()
    } else {
        scalar(column_type)
    };
    prop_oneof![1 => Just(Value::Null), 6 => present].boxed()
}

fn typed_pair() -> impl Strategy<Value = (ColumnType, Value, Value)> {
    prop::sample::select(ColumnType::ALL.to_vec())
        .prop_flat_map(|t| (Just(t), value_of(t), value_of(t)))
}

proptest! {
    #[test]
    fn prop_compare_is_antisymmetric((column_type, a, b) in typed_pair()) {
        prop_assert_eq!(column_type.compare(&a, &b), column_type.compare(&b, &a).reverse());
    }

    #[test]
    fn prop_compare_is_reflexive((column_type, a, _b) in typed_pair()) {
        prop_assert_eq!(column_type.compare(&a, &a), Ordering::Equal);
    }

    #[test]
    fn prop_shorter_array_sorts_first((column_type, _a, _b) in typed_pair(), seed in any::<i64>()) {
        let array_type = column_type.array_of();
        let element = match array_type.element_type() {
            ColumnType::Boolean => Value::Boolean(seed % 2 == 0),
            ColumnType::Date => Value::Date(seed),
            ColumnType::Double => Value::Double(seed as f64),
            ColumnType::Float => Value::Float(seed as f32),
            ColumnType::Integer => Value::Integer(seed),
            _ => Value::String(seed.to_string()),
        };
        let empty = Value::Array(vec![]);
        let one = Value::Array(vec![element]);
        prop_assert_eq!(array_type.compare(&empty, &one), Ordering::Less);
        prop_assert_eq!(array_type.compare(&one, &empty), Ordering::Greater);
    }
}

#[test]
fn test_empty_array_before_any_single_element() {
    let cases = [
        (ColumnType::BooleanArray, Value::Boolean(false)),
        (ColumnType::DateArray, Value::Date(i64::MIN)),
        (ColumnType::DoubleArray, Value::Double(f64::NEG_INFINITY)),
        (ColumnType::FloatArray, Value::Float(f32::MIN)),
        (ColumnType::IntegerArray, Value::Integer(i64::MIN)),
        (ColumnType::StringArray, Value::String(String::new())),
    ];
    for (column_type, element) in cases {
        let empty = Value::Array(vec![]);
        let one = Value::Array(vec![element]);
        assert_eq!(column_type.compare(&empty, &one), Ordering::Less, "{}", column_type);
    }
}

#[test]
fn test_null_sorts_first() {
    for column_type in ColumnType::ALL {
        let value = if column_type.is_array() {
            Value::Array(vec![])
        } else if column_type == ColumnType::String {
            Value::String(String::new())
        } else {
            Value::Boolean(false)
        };
        assert_eq!(column_type.compare(&Value::Null, &value), Ordering::Less);
    }
}

#[test]
fn test_parse_round_trips_canonical_names() {
    for column_type in ColumnType::ALL {
        assert_eq!(ColumnType::parse(&column_type.to_string()).unwrap(), column_type);
    }
}

#[test]
fn test_parse_aliases() {
    for alias in ["int", "INTEGER", "Number", "bigint", "long"] {
        assert_eq!(ColumnType::parse(alias).unwrap(), ColumnType::Integer, "{}", alias);
    }
    for alias in ["string", "TEXT", "varchar", "Char"] {
        assert_eq!(ColumnType::parse(alias).unwrap(), ColumnType::String, "{}", alias);
    }
    for alias in ["bool", "Boolean"] {
        assert_eq!(ColumnType::parse(alias).unwrap(), ColumnType::Boolean, "{}", alias);
    }
    assert_eq!(ColumnType::parse("timestamp").unwrap(), ColumnType::Date);
    assert_eq!(ColumnType::parse("real").unwrap(), ColumnType::Float);
    assert_eq!(ColumnType::parse("numeric").unwrap(), ColumnType::Double);
    assert!(ColumnType::parse("blob").is_err());
}
