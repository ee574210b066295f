use dxdb_api::{Database, SelectRequest};
use dxdb_core::{Error, QueryResult, Value};
use dxdb_test_utils::{cars_columns, TestDatabase};
use serde_json::json;

#[test]
fn test_cars_scenario() {
    let test_db = TestDatabase::new();
    let db = &test_db.db;

    db.create_table("cars", &cars_columns()).unwrap();
    db.insert("cars", vec![json!({"brand": "Mazda", "sedan": true})])
        .unwrap();

    assert_eq!(db.count("cars", None).unwrap(), 1);
    assert_eq!(db.count("cars", Some(r#"brand="Mazda""#.into())).unwrap(), 1);
    assert_eq!(db.count("cars", Some(r#"brand="Ford""#.into())).unwrap(), 0);

    assert_eq!(db.delete_from("cars", Some(r#"brand="Mazda""#.into())).unwrap(), 1);
    assert_eq!(db.count("cars", None).unwrap(), 0);
}

#[test]
fn test_sequence_survives_reopen() {
    let mut test_db = TestDatabase::new();
    test_db.db.create_sequence("ids").unwrap();

    let mut values = Vec::new();
    for i in 0..10 {
        if i == 5 {
            test_db = test_db.reopen();
        }
        values.push(test_db.db.next_value("ids").unwrap());
    }

    assert!(values.windows(2).all(|w| w[0] < w[1]), "{:?}", values);
    assert_eq!(values, (1..=10).collect::<Vec<i64>>());
}

#[test]
fn test_rows_survive_reopen() {
    let test_db = TestDatabase::new();
    test_db.db.create_table("cars", &cars_columns()).unwrap();
    test_db
        .db
        .insert_many(
            "cars",
            vec![
                json!({"brand": "Mazda", "sedan": true}),
                json!({"brand": "Ford", "sedan": false}),
            ],
        )
        .unwrap();

    let test_db = test_db.reopen();
    let rows = test_db
        .db
        .select(SelectRequest::from_table("cars").columns(["brand"]).order_by("brand", true))
        .unwrap();
    assert_eq!(
        rows.column_values("brand"),
        vec![Value::String("Ford".into()), Value::String("Mazda".into())]
    );
}

#[test]
fn test_non_finite_numbers_are_rejected_before_storage() {
    let test_db = TestDatabase::new();
    test_db
        .db
        .create_table("m", &[dxdb_core::ColumnSpec::new("x", "DOUBLE")])
        .unwrap();

    for input in ["NaN", "inf", "-inf"] {
        let err = test_db.db.insert_one("m", json!({ "x": input })).unwrap_err();
        assert!(matches!(err, Error::IllegalArgument(_)), "{}", input);
    }
    test_db.db.insert_one("m", json!({"x": "1.5"})).unwrap();

    let test_db = test_db.reopen();
    let rows = test_db.db.select(SelectRequest::from_table("m").columns(["x"])).unwrap();
    assert_eq!(rows.column_values("x"), vec![Value::Double(1.5)]);
}

#[test]
fn test_string_length_is_enforced() {
    let test_db = TestDatabase::new();
    test_db
        .db
        .create_table("t", &[dxdb_core::ColumnSpec::new("code", "VARCHAR(3)")])
        .unwrap();
    assert!(test_db.db.insert_one("t", json!({"code": "abc"})).is_ok());
    let err = test_db.db.insert_one("t", json!({"code": "abcd"})).unwrap_err();
    assert!(matches!(err, Error::IllegalArgument(_)));
}

#[test]
fn test_sql_session() {
    let db = Database::in_memory("shop").unwrap();
    let results = db
        .execute_script(
            "CREATE TABLE cars (brand VARCHAR(64), price INT, sedan BOOLEAN);
             CREATE INDEX by_price ON cars USING btree (price);
             INSERT INTO cars (brand, price, sedan) VALUES
                 ('Mazda', 20000, true), ('Ford', 15000, false), ('Audi', 40000, true);
             INSERT INTO cars VALUE {'brand': 'Fiat', 'price': 9000, 'sedan': false};
             UPDATE cars SET price = price - 1000 WHERE sedan = true;
             SELECT brand, price FROM cars WHERE price BETWEEN 10000 AND 30000 ORDER BY price;
             SELECT COUNT(*) AS n, MAX(price) AS top FROM cars;
             DELETE FROM cars WHERE brand LIKE 'F%';
             SHOW TABLES;
             SHOW INDICES FROM cars",
        )
        .unwrap();
    assert_eq!(results.len(), 10);

    let in_range = results[5].rows().unwrap();
    assert_eq!(
        in_range.column_values("brand"),
        vec![Value::String("Ford".into()), Value::String("Mazda".into())]
    );
    assert_eq!(
        in_range.column_values("price"),
        vec![Value::Integer(15000), Value::Integer(19000)]
    );

    let totals = results[6].rows().unwrap();
    assert_eq!(totals.get(0, "n"), Some(&Value::Integer(4)));
    assert_eq!(totals.get(0, "top"), Some(&Value::Integer(39000)));

    assert_eq!(results[7], QueryResult::Affected(2));
    assert_eq!(results[8], QueryResult::Names(vec!["cars".into()]));
    match &results[9] {
        QueryResult::Indices(indices) => assert_eq!(indices.len(), 2),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_sql_errors_are_bad_requests() {
    let db = Database::in_memory("shop").unwrap();
    let err = db.execute("SELEC brand FROM cars").unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));

    let err = db.execute("SELECT brand FROM ghost").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_sql_sequences_and_drops() {
    let db = Database::in_memory("shop").unwrap();
    db.execute("CREATE SEQUENCE ids").unwrap();
    assert_eq!(db.execute("SELECT NEXTVAL('ids')").unwrap(), QueryResult::Value(1));
    db.execute("RENAME SEQUENCE ids TO counters").unwrap();
    assert_eq!(db.execute("SELECT NEXTVAL('counters')").unwrap(), QueryResult::Value(2));

    db.execute("DROP SEQUENCE counters").unwrap();
    assert!(!db.has_sequence("counters").unwrap());
    db.execute("DROP SEQUENCE IF EXISTS counters").unwrap();
}

#[test]
fn test_describe_through_sql() {
    let db = Database::in_memory("shop").unwrap();
    db.execute("CREATE TABLE cars (brand VARCHAR(64))").unwrap();
    match db.execute("DESC cars").unwrap() {
        QueryResult::Description(description) => assert_eq!(description.name(), "cars"),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_distinct_select_ignores_primary_key() {
    let db = Database::in_memory("shop").unwrap();
    db.create_table("cars", &cars_columns()).unwrap();
    db.insert_many(
        "cars",
        vec![
            json!({"brand": "Mazda", "sedan": true}),
            json!({"brand": "Mazda", "sedan": true}),
        ],
    )
    .unwrap();

    let rows = db.select_distinct(SelectRequest::from_table("cars")).unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows.column_index("_uuid").is_none());
}
