use dxdb_core::{ColumnSpec, Condition, Error};
use dxdb_test_utils::{cars_columns, failing_database};
use serde_json::{json, Map, Value as Json};

fn object(value: Json) -> Map<String, Json> {
    value.as_object().cloned().unwrap()
}

#[test]
fn test_failed_sequence_create_is_rolled_back() {
    let (storage, db) = failing_database("shop");
    storage.fail_writes_to("_sequences.def");

    let err = db.create_sequence("s").unwrap_err();
    assert!(matches!(err, Error::InternalServerError(_)));
    assert!(!db.has_sequence("s").unwrap());

    storage.heal();
    db.create_sequence("s").unwrap();
    assert!(db.has_sequence("s").unwrap());
}

#[test]
fn test_failed_index_write_removes_new_table() {
    let (storage, db) = failing_database("shop");
    storage.fail_writes_to("_indices.def");

    let err = db.create_table("cars", &cars_columns()).unwrap_err();
    assert!(matches!(err, Error::InternalServerError(_)));
    assert!(!db.has_table("cars").unwrap());

    storage.heal();
    db.create_table("cars", &cars_columns()).unwrap();
    assert!(db.has_index("cars", "index_cars_uuid").unwrap());

    db.close();
    db.init().unwrap();
    assert_eq!(db.list_tables().unwrap(), vec!["cars"]);
}

#[test]
fn test_failed_insert_leaves_rows_unchanged() {
    let (storage, db) = failing_database("shop");
    db.create_table("cars", &cars_columns()).unwrap();
    db.insert_one("cars", &object(json!({"brand": "Mazda"}))).unwrap();

    storage.fail_writes_to(".tbl");
    let err = db
        .insert_many(
            "cars",
            &[object(json!({"brand": "Ford"})), object(json!({"brand": "Audi"}))],
        )
        .unwrap_err();
    assert!(matches!(err, Error::InternalServerError(_)));
    assert_eq!(db.count("cars", None).unwrap(), 1);
    assert_eq!(db.count("cars", Some(&Condition::equals("brand", "Ford"))).unwrap(), 0);
}

#[test]
fn test_failed_delete_restores_rows() {
    let (storage, db) = failing_database("shop");
    db.create_table("cars", &cars_columns()).unwrap();
    db.create_index("cars", "by_brand", "brand", None).unwrap();
    db.insert_many(
        "cars",
        &[object(json!({"brand": "Mazda"})), object(json!({"brand": "Ford"}))],
    )
    .unwrap();

    storage.fail_writes_to(".tbl");
    let mazda = Condition::equals("brand", "Mazda");
    assert!(db.delete_from("cars", Some(&mazda)).is_err());
    assert_eq!(db.count("cars", Some(&mazda)).unwrap(), 1);

    storage.heal();
    assert_eq!(db.delete_from("cars", Some(&mazda)).unwrap(), 1);
    assert_eq!(db.count("cars", Some(&mazda)).unwrap(), 0);
}

#[test]
fn test_failed_rename_keeps_old_name() {
    let (storage, db) = failing_database("shop");
    db.create_table("a", &[]).unwrap();

    storage.fail_writes_to("_tables.def");
    assert!(db.rename_table("a", "b").is_err());
    assert!(db.has_table("a").unwrap());
    assert!(!db.has_table("b").unwrap());
}

#[test]
fn test_failed_alter_restores_schema() {
    let (storage, db) = failing_database("shop");
    db.create_table("cars", &cars_columns()).unwrap();

    storage.fail_writes_to("_tables.def");
    assert!(db
        .alter_table_add_columns("cars", &[ColumnSpec::new("doors", "INT")])
        .is_err());

    storage.heal();
    let description = db.desc("cars").unwrap();
    let dxdb_core::Description::Table(table) = description else {
        panic!("expected a table");
    };
    assert!(table.columns.iter().all(|c| c.name != "doors"));
}

#[test]
fn test_failed_next_value_does_not_advance() {
    let (storage, db) = failing_database("shop");
    db.create_sequence("ids").unwrap();
    assert_eq!(db.next_value("ids").unwrap(), 1);

    storage.fail_writes_to(".seq");
    assert!(db.next_value("ids").is_err());

    storage.heal();
    assert_eq!(db.next_value("ids").unwrap(), 2);
}

#[test]
fn test_failed_index_changes_are_undone() {
    let (storage, db) = failing_database("shop");
    db.create_table("cars", &cars_columns()).unwrap();
    db.create_index("cars", "by_brand", "brand", None).unwrap();

    storage.fail_writes_to("_indices.def");
    assert!(db.create_index("cars", "by_sedan", "sedan", None).is_err());
    assert!(!db.has_index("cars", "by_sedan").unwrap());

    assert!(db.rename_index("cars", "by_brand", "brands").is_err());
    assert!(db.has_index("cars", "by_brand").unwrap());
    assert!(!db.has_index("cars", "brands").unwrap());

    storage.heal();
    db.create_index("cars", "by_sedan", "sedan", None).unwrap();
    db.rename_index("cars", "by_brand", "brands").unwrap();
    assert!(db.has_index("cars", "brands").unwrap());
}
