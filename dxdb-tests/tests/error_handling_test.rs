use dxdb_api::Database;
use dxdb_core::{DatabaseConfig, Error};
use dxdb_test_utils::{cars_columns, TestDatabase};
use serde_json::json;

#[test]
fn test_operations_before_init_are_illegal_state() {
    let test_db = TestDatabase::new();
    let engine = test_db.db.engine();
    engine.close();

    for err in [
        engine.create_table("cars", &[]).unwrap_err(),
        engine.create_sequence("ids").unwrap_err(),
        engine.list_tables().unwrap_err(),
        engine.next_value("ids").unwrap_err(),
    ] {
        assert_eq!(err.code(), "ILLEGAL_STATE");
        assert!(!err.is_retryable());
    }
}

#[test]
fn test_caller_mistakes_are_not_retryable() {
    let db = Database::in_memory("shop").unwrap();
    db.create_table("cars", &cars_columns()).unwrap();

    let conflict = db.create_table("cars", &[]).unwrap_err();
    assert_eq!(conflict.code(), "CONFLICT");

    let unknown_column = db.insert_one("cars", json!({"color": "red"})).unwrap_err();
    assert_eq!(unknown_column.code(), "ILLEGAL_ARGUMENT");

    let missing = db.next_value("ghost").unwrap_err();
    assert_eq!(missing.code(), "FILE_NOT_FOUND");

    let bad_sql = db.execute("DROP EVERYTHING").unwrap_err();
    assert_eq!(bad_sql.code(), "BAD_REQUEST");

    for err in [conflict, unknown_column, missing, bad_sql] {
        assert!(!err.is_retryable(), "{}", err);
    }
}

#[test]
fn test_wrong_value_type_is_illegal_argument() {
    let db = Database::in_memory("shop").unwrap();
    db.create_table("cars", &cars_columns()).unwrap();
    let err = db.insert_one("cars", json!({"sedan": "maybe"})).unwrap_err();
    assert!(matches!(err, Error::IllegalArgument(_)));
    assert_eq!(db.count("cars", None).unwrap(), 0);
}

#[test]
fn test_non_object_insert_is_rejected() {
    let db = Database::in_memory("shop").unwrap();
    db.create_table("cars", &cars_columns()).unwrap();
    let err = db.insert("cars", vec![json!(42)]).unwrap_err();
    assert!(matches!(err, Error::IllegalArgument(_)));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = DatabaseConfig::default().with_sequence_increment(0);
    assert!(matches!(
        Database::with_config("shop", None, config),
        Err(Error::IllegalArgument(_))
    ));
}

#[test]
fn test_corrupt_definition_fails_to_open() {
    let test_db = TestDatabase::named("shop");
    test_db.db.create_table("cars", &cars_columns()).unwrap();
    let uuid = test_db.db.uuid().unwrap();
    test_db.db.close();

    std::fs::write(test_db.path.join(format!("{}_tables.def", uuid)), b"{not json").unwrap();

    let reopened = Database::new("shop", Some(&test_db.path)).unwrap();
    let err = reopened.list_tables().unwrap_err();
    assert_eq!(err.code(), "INTERNAL_SERVER_ERROR");
    assert!(err.to_string().contains("failed to open database 'shop'"), "{}", err);
}

#[test]
fn test_with_context_keeps_inner_message() {
    let err = Error::Conflict("name 'cars' is taken".into()).with_context("rename 'a'");
    assert!(matches!(err, Error::InternalServerError(_)));
    assert_eq!(
        err.to_string(),
        "Internal server error: rename 'a': Conflict: name 'cars' is taken"
    );
}
