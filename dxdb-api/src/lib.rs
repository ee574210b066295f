//! High-level dxdb API
//!
//! [`Database`] wraps a [`FileSystemDatabase`] and adds what an application
//! wants on top of the engine: the database is created and loaded on first
//! use, conditions and select lists may be given as SQL text, deletes of
//! missing objects succeed, and whole SQL statements can be executed.

use dxdb_core::sql::{Connection, SqlQueryParser};
use dxdb_core::{
    Assignment, Column, ColumnSpec, Condition, DatabaseConfig, Description, Error,
    FileSystemDatabase, IndexDescription, IndexType, InsertResult, MemoryStorage, QueryResult,
    Result, ResultSet, SelectExpression, SelectOptions, SelectQuery, Storage, PRIMARY_KEY_COLUMN,
};
use serde_json::{Map, Value as Json};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub use dxdb_core::{Error as DxdbError, Value as DxdbValue};

pub mod input;
pub use input::{ConditionInput, ExpressionInput, QueryInput};

pub mod select;
pub use select::SelectRequest;

/// Swallow `FileNotFound`
fn forgiving(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

fn as_object(value: Json) -> Result<Map<String, Json>> {
    match value {
        Json::Object(object) => Ok(object),
        other => Err(Error::IllegalArgument(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// dxdb database handle
pub struct Database {
    engine: FileSystemDatabase,
}

impl Database {
    /// A database stored in `folder`, or kept in memory when there is none
    pub fn new(name: &str, folder: Option<&Path>) -> Result<Self> {
        Self::with_config(name, folder, DatabaseConfig::default())
    }

    pub fn with_config(name: &str, folder: Option<&Path>, config: DatabaseConfig) -> Result<Self> {
        let engine = match folder {
            Some(folder) => FileSystemDatabase::with_config(name, folder, config)?,
            None => FileSystemDatabase::with_storage(name, Arc::new(MemoryStorage::new()), config)?,
        };
        Ok(Self { engine })
    }

    pub fn in_memory(name: &str) -> Result<Self> {
        Self::new(name, None)
    }

    pub fn with_storage(name: &str, storage: Arc<dyn Storage>, config: DatabaseConfig) -> Result<Self> {
        let engine = FileSystemDatabase::with_storage(name, storage, config)?;
        Ok(Self { engine })
    }

    /// The engine underneath; its methods do not initialize lazily
    pub fn engine(&self) -> &FileSystemDatabase {
        &self.engine
    }

    pub fn name(&self) -> String {
        self.engine.name()
    }

    fn max_statement_length(&self) -> usize {
        self.engine.config().max_statement_length
    }

    // ----- lifecycle -----

    /// Load the database, creating it first when it does not exist yet
    ///
    /// Any failure is reported as `InternalServerError`.
    pub fn init(&self) -> Result<()> {
        if self.engine.is_initialized() {
            return Ok(());
        }
        self.bootstrap()
            .map_err(|e| e.with_context(&format!("failed to open database '{}'", self.name())))
    }

    fn bootstrap(&self) -> Result<()> {
        match self.engine.init() {
            Err(e) if e.is_not_found() => {
                match self.engine.create() {
                    Ok(()) => info!("Created new database {}", self.name()),
                    // created concurrently by another handle
                    Err(Error::Conflict(_)) => {}
                    Err(e) => return Err(e),
                }
                self.engine.init()
            }
            other => other,
        }
    }

    pub fn connect(&self) -> Result<()> {
        self.init()
    }

    pub fn open(&self) -> Result<()> {
        self.init()
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_initialized()
    }

    pub fn close(&self) {
        self.engine.close();
    }

    pub fn disconnect(&self) {
        self.close();
    }

    /// The engine, initialized
    fn ready(&self) -> Result<&FileSystemDatabase> {
        self.init()?;
        Ok(&self.engine)
    }

    pub fn uuid(&self) -> Result<String> {
        self.ready()?.uuid()
    }

    pub fn has_table(&self, name: &str) -> Result<bool> {
        self.ready()?.has_table(name)
    }

    pub fn has_sequence(&self, name: &str) -> Result<bool> {
        self.ready()?.has_sequence(name)
    }

    pub fn has_index(&self, table: &str, index: &str) -> Result<bool> {
        self.ready()?.has_index(table, index)
    }

    // ----- schema -----

    /// Build a standalone column from a type name such as `"VARCHAR(64)"`
    pub fn create_column(&self, name: &str, data_type: &str, length: Option<i64>) -> Result<Column> {
        let mut spec = ColumnSpec::new(name, data_type);
        spec.length = length;
        spec.to_column()
    }

    pub fn create_table(&self, name: &str, columns: &[ColumnSpec]) -> Result<()> {
        self.ready()?.create_table(name, columns)
    }

    pub fn add_table(&self, name: &str, columns: &[ColumnSpec]) -> Result<()> {
        self.create_table(name, columns)
    }

    pub fn create_sequence(&self, name: &str) -> Result<()> {
        self.ready()?.create_sequence(name)
    }

    pub fn add_sequence(&self, name: &str) -> Result<()> {
        self.create_sequence(name)
    }

    pub fn create_index(
        &self,
        table: &str,
        index: &str,
        column: &str,
        index_type: Option<IndexType>,
    ) -> Result<()> {
        self.ready()?.create_index(table, index, column, index_type)
    }

    pub fn add_index(
        &self,
        table: &str,
        index: &str,
        column: &str,
        index_type: Option<IndexType>,
    ) -> Result<()> {
        self.create_index(table, index, column, index_type)
    }

    /// Delete a table; a missing table is not an error
    pub fn delete_table(&self, name: &str) -> Result<()> {
        forgiving(self.ready()?.delete_table(name))
    }

    pub fn drop_table(&self, name: &str) -> Result<()> {
        self.delete_table(name)
    }

    pub fn destroy(&self, name: &str) -> Result<()> {
        self.delete_table(name)
    }

    pub fn delete_sequence(&self, name: &str) -> Result<()> {
        forgiving(self.ready()?.delete_sequence(name))
    }

    pub fn drop_sequence(&self, name: &str) -> Result<()> {
        self.delete_sequence(name)
    }

    pub fn delete_index(&self, table: &str, index: &str) -> Result<()> {
        forgiving(self.ready()?.delete_index(table, index))
    }

    pub fn drop_index(&self, table: &str, index: &str) -> Result<()> {
        self.delete_index(table, index)
    }

    pub fn drop_table_index(&self, table: &str, index: &str) -> Result<()> {
        self.delete_index(table, index)
    }

    pub fn rename_table(&self, from: &str, to: &str) -> Result<()> {
        self.ready()?.rename_table(from, to)
    }

    pub fn rename_sequence(&self, from: &str, to: &str) -> Result<()> {
        self.ready()?.rename_sequence(from, to)
    }

    pub fn rename_index(&self, table: &str, from: &str, to: &str) -> Result<()> {
        self.ready()?.rename_index(table, from, to)
    }

    /// Rename whichever table or sequence is called `from`
    pub fn rename(&self, from: &str, to: &str) -> Result<()> {
        let engine = self.ready()?;
        if engine.has_table(from)? {
            engine.rename_table(from, to)
        } else if engine.has_sequence(from)? {
            engine.rename_sequence(from, to)
        } else {
            Err(Error::FileNotFound(format!("table or sequence '{}'", from)))
        }
    }

    pub fn move_(&self, from: &str, to: &str) -> Result<()> {
        self.rename(from, to)
    }

    pub fn mv(&self, from: &str, to: &str) -> Result<()> {
        self.rename(from, to)
    }

    pub fn alter_table_add_columns(&self, table: &str, columns: &[ColumnSpec]) -> Result<()> {
        self.ready()?.alter_table_add_columns(table, columns)
    }

    pub fn alter_table_alter_columns(&self, table: &str, columns: &[ColumnSpec]) -> Result<()> {
        self.ready()?.alter_table_alter_columns(table, columns)
    }

    pub fn alter_table_drop_columns(&self, table: &str, columns: &[&str]) -> Result<()> {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        self.ready()?.alter_table_drop_columns(table, &columns)
    }

    pub fn alter_table_rename_columns(&self, table: &str, renames: &[(&str, &str)]) -> Result<()> {
        let renames: Vec<(String, String)> = renames
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        self.ready()?.alter_table_rename_columns(table, &renames)
    }

    // ----- queries -----

    fn condition(&self, condition: Option<ConditionInput>) -> Result<Option<Condition>> {
        condition
            .map(|c| c.resolve(self.max_statement_length()))
            .transpose()
    }

    fn expressions<I, E>(&self, expressions: I) -> Result<Vec<SelectExpression>>
    where
        I: IntoIterator<Item = E>,
        E: Into<ExpressionInput>,
    {
        expressions
            .into_iter()
            .map(|e| {
                let input: ExpressionInput = e.into();
                input.resolve(self.max_statement_length())
            })
            .collect()
    }

    pub fn select(&self, request: SelectRequest) -> Result<ResultSet> {
        let query = request.resolve(self.max_statement_length())?;
        self.ready()?.select(&query)
    }

    pub fn select_distinct(&self, request: SelectRequest) -> Result<ResultSet> {
        self.select(request.distinct())
    }

    pub fn select_all(&self, table: &str) -> Result<ResultSet> {
        self.ready()?.select_all(table, None, &SelectOptions::default())
    }

    pub fn select_where(&self, table: &str, condition: impl Into<ConditionInput>) -> Result<ResultSet> {
        self.select_subset(table, condition)
    }

    /// Every column of the rows matching `condition`
    pub fn select_subset(&self, table: &str, condition: impl Into<ConditionInput>) -> Result<ResultSet> {
        let condition = condition.into().resolve(self.max_statement_length())?;
        self.ready()?.select_subset(table, &condition)
    }

    pub fn select_columns<I, E>(
        &self,
        expressions: I,
        table: &str,
        condition: Option<ConditionInput>,
    ) -> Result<ResultSet>
    where
        I: IntoIterator<Item = E>,
        E: Into<ExpressionInput>,
    {
        let query = SelectQuery {
            table: table.to_string(),
            expressions: self.expressions(expressions)?,
            condition: self.condition(condition)?,
            options: SelectOptions::default(),
        };
        self.ready()?.select(&query)
    }

    /// Projection without the lone-`*` shortcut
    pub fn select_slice<I, E>(
        &self,
        table: &str,
        expressions: I,
        condition: Option<ConditionInput>,
    ) -> Result<ResultSet>
    where
        I: IntoIterator<Item = E>,
        E: Into<ExpressionInput>,
    {
        let expressions = self.expressions(expressions)?;
        let condition = self.condition(condition)?;
        self.ready()?
            .select_slice(table, &expressions, condition.as_ref(), &SelectOptions::default())
    }

    pub fn count(&self, table: &str, condition: Option<ConditionInput>) -> Result<usize> {
        let condition = self.condition(condition)?;
        self.ready()?.count(table, condition.as_ref())
    }

    // ----- rows -----

    /// Insert objects and arrays of objects
    ///
    /// Each object is one row; each array is inserted as one batch.
    pub fn insert<I>(&self, table: &str, values: I) -> Result<InsertResult>
    where
        I: IntoIterator<Item = Json>,
    {
        let mut result = InsertResult::default();
        for value in values {
            let inserted = match value {
                Json::Object(object) => self.ready()?.insert_one(table, &object)?,
                Json::Array(items) => self.insert_many(table, items)?,
                other => {
                    return Err(Error::IllegalArgument(format!(
                        "cannot insert {} into '{}'",
                        other, table
                    )))
                }
            };
            result.merge(inserted);
        }
        Ok(result)
    }

    pub fn insert_into<I>(&self, table: &str, values: I) -> Result<InsertResult>
    where
        I: IntoIterator<Item = Json>,
    {
        self.insert(table, values)
    }

    pub fn insert_one(&self, table: &str, object: Json) -> Result<InsertResult> {
        let object = as_object(object)?;
        self.ready()?.insert_one(table, &object)
    }

    pub fn insert_many(&self, table: &str, objects: Vec<Json>) -> Result<InsertResult> {
        let objects = objects
            .into_iter()
            .map(as_object)
            .collect::<Result<Vec<_>>>()?;
        self.ready()?.insert_many(table, &objects)
    }

    /// Set the columns named in `values` on the matching rows
    pub fn update(&self, table: &str, values: &Json, condition: Option<ConditionInput>) -> Result<usize> {
        let object = values.as_object().ok_or_else(|| {
            Error::IllegalArgument(format!("update values must be an object, got {}", values))
        })?;
        let condition = self.condition(condition)?;
        self.ready()?
            .update(table, &Assignment::from_object(object), condition.as_ref())
    }

    /// Update the row whose `_uuid` the object carries
    pub fn update_by_object(&self, table: &str, object: &Json) -> Result<usize> {
        let mut object = object
            .as_object()
            .cloned()
            .ok_or_else(|| Error::IllegalArgument("expected a JSON object".into()))?;
        let key = match object.remove(PRIMARY_KEY_COLUMN) {
            Some(Json::String(key)) => key,
            _ => {
                return Err(Error::IllegalArgument(format!(
                    "object must carry a string {}",
                    PRIMARY_KEY_COLUMN
                )))
            }
        };
        if object.is_empty() {
            return Ok(0);
        }
        let condition = Condition::equals(PRIMARY_KEY_COLUMN, key);
        self.ready()?
            .update(table, &Assignment::from_object(&object), Some(&condition))
    }

    pub fn delete_from(&self, table: &str, condition: Option<ConditionInput>) -> Result<usize> {
        let condition = self.condition(condition)?;
        self.ready()?.delete_from(table, condition.as_ref())
    }

    pub fn delete(&self, table: &str, condition: Option<ConditionInput>) -> Result<usize> {
        self.delete_from(table, condition)
    }

    // ----- metadata -----

    pub fn desc(&self, name: &str) -> Result<Description> {
        self.ready()?.desc(name)
    }

    pub fn next_value(&self, sequence: &str) -> Result<i64> {
        self.ready()?.next_value(sequence)
    }

    pub fn list_tables(&self) -> Result<Vec<String>> {
        self.ready()?.list_tables()
    }

    pub fn list_sequences(&self) -> Result<Vec<String>> {
        self.ready()?.list_sequences()
    }

    pub fn list_indices(&self, table: Option<&str>) -> Result<Vec<IndexDescription>> {
        self.ready()?.list_indices(table)
    }

    // ----- SQL -----

    /// Run one SQL statement
    pub fn execute(&self, query: impl Into<QueryInput>) -> Result<QueryResult> {
        let query = query.into().resolve(self.max_statement_length())?;
        self.init()?;
        query.execute(self)
    }

    pub fn query(&self, query: impl Into<QueryInput>) -> Result<QueryResult> {
        self.execute(query)
    }

    /// Run `;`-separated statements in order, stopping at the first error
    pub fn execute_script(&self, script: &str) -> Result<Vec<QueryResult>> {
        self.init()?;
        let mut parser = SqlQueryParser::new(script).with_max_length(self.max_statement_length());
        let mut results = Vec::new();
        while let Some(query) = parser.next_query()? {
            results.push(query.execute(self)?);
        }
        Ok(results)
    }
}

impl Connection for Database {
    fn create_table(&self, table: &str, columns: &[ColumnSpec]) -> Result<()> {
        Database::create_table(self, table, columns)
    }

    fn create_sequence(&self, sequence: &str) -> Result<()> {
        Database::create_sequence(self, sequence)
    }

    fn create_index(
        &self,
        table: &str,
        index: &str,
        column: &str,
        index_type: Option<IndexType>,
    ) -> Result<()> {
        Database::create_index(self, table, index, column, index_type)
    }

    fn delete_table(&self, table: &str) -> Result<()> {
        Database::delete_table(self, table)
    }

    fn delete_sequence(&self, sequence: &str) -> Result<()> {
        Database::delete_sequence(self, sequence)
    }

    fn delete_index(&self, table: &str, index: &str) -> Result<()> {
        Database::delete_index(self, table, index)
    }

    fn rename_table(&self, from: &str, to: &str) -> Result<()> {
        Database::rename_table(self, from, to)
    }

    fn rename_sequence(&self, from: &str, to: &str) -> Result<()> {
        Database::rename_sequence(self, from, to)
    }

    fn rename_index(&self, table: &str, from: &str, to: &str) -> Result<()> {
        Database::rename_index(self, table, from, to)
    }

    fn alter_table_add_columns(&self, table: &str, columns: &[ColumnSpec]) -> Result<()> {
        Database::alter_table_add_columns(self, table, columns)
    }

    fn alter_table_alter_columns(&self, table: &str, columns: &[ColumnSpec]) -> Result<()> {
        Database::alter_table_alter_columns(self, table, columns)
    }

    fn alter_table_drop_columns(&self, table: &str, columns: &[String]) -> Result<()> {
        self.ready()?.alter_table_drop_columns(table, columns)
    }

    fn alter_table_rename_columns(&self, table: &str, renames: &[(String, String)]) -> Result<()> {
        self.ready()?.alter_table_rename_columns(table, renames)
    }

    fn select_query(&self, query: &SelectQuery) -> Result<ResultSet> {
        self.ready()?.select(query)
    }

    fn insert_objects(&self, table: &str, objects: Vec<Map<String, Json>>) -> Result<InsertResult> {
        self.ready()?.insert_many(table, &objects)
    }

    fn update_rows(
        &self,
        table: &str,
        assignments: &[Assignment],
        condition: Option<&Condition>,
    ) -> Result<usize> {
        self.ready()?.update(table, assignments, condition)
    }

    fn delete_rows(&self, table: &str, condition: Option<&Condition>) -> Result<usize> {
        self.ready()?.delete_from(table, condition)
    }

    fn desc(&self, name: &str) -> Result<Description> {
        Database::desc(self, name)
    }

    fn next_value(&self, sequence: &str) -> Result<i64> {
        Database::next_value(self, sequence)
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        Database::list_tables(self)
    }

    fn list_sequences(&self) -> Result<Vec<String>> {
        Database::list_sequences(self)
    }

    fn list_indices(&self, table: Option<&str>) -> Result<Vec<IndexDescription>> {
        Database::list_indices(self, table)
    }

    fn find_index_table(&self, index: &str) -> Result<String> {
        self.ready()?.find_index_table(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxdb_core::Value;
    use serde_json::json;
    use tempfile::TempDir;

    fn cars(db: &Database) {
        db.create_table(
            "cars",
            &[
                ColumnSpec::new("brand", "STRING").with_length(64),
                ColumnSpec::new("sedan", "BOOLEAN"),
            ],
        )
        .unwrap();
    }

    #[test]
    fn test_first_use_creates_database() {
        let dir = TempDir::new().unwrap();
        let db = Database::new("shop", Some(dir.path())).unwrap();
        assert!(!db.is_initialized());

        assert!(db.list_tables().unwrap().is_empty());
        assert!(db.is_initialized());
        assert!(dir.path().join("shop.db").exists());
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        {
            let db = Database::new("shop", Some(dir.path())).unwrap();
            cars(&db);
            db.insert_one("cars", json!({"brand": "Mazda", "sedan": true})).unwrap();
            db.disconnect();
        }

        let db = Database::new("shop", Some(dir.path())).unwrap();
        assert_eq!(db.count("cars", None).unwrap(), 1);
    }

    #[test]
    fn test_init_failure_is_internal_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("shop.db"), b"not json").unwrap();

        let db = Database::new("shop", Some(dir.path())).unwrap();
        let err = db.list_tables().unwrap_err();
        assert!(matches!(err, Error::InternalServerError(_)));
        assert!(!db.is_initialized());
    }

    #[test]
    fn test_deletes_of_missing_objects_succeed() {
        let db = Database::in_memory("shop").unwrap();
        db.drop_table("ghost").unwrap();
        db.drop_sequence("ghost").unwrap();
        db.drop_index("ghost", "by_nothing").unwrap();
    }

    #[test]
    fn test_reads_of_missing_tables_fail() {
        let db = Database::in_memory("shop").unwrap();
        assert!(db.select_all("ghost").unwrap_err().is_not_found());
        assert!(db.count("ghost", None).unwrap_err().is_not_found());
    }

    #[test]
    fn test_text_conditions() {
        let db = Database::in_memory("shop").unwrap();
        cars(&db);
        db.insert_one("cars", json!({"brand": "Mazda", "sedan": true})).unwrap();

        assert_eq!(db.count("cars", Some(r#"brand="Mazda""#.into())).unwrap(), 1);
        assert_eq!(db.count("cars", Some(r#"brand="Ford""#.into())).unwrap(), 0);
        let err = db.count("cars", Some("brand ==".into())).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn test_insert_flattens_objects_and_arrays() {
        let db = Database::in_memory("shop").unwrap();
        cars(&db);

        let result = db
            .insert(
                "cars",
                vec![
                    json!({"brand": "Mazda"}),
                    json!([{"brand": "Ford"}, {"brand": "Audi"}]),
                ],
            )
            .unwrap();
        assert_eq!(result.n_inserted, 3);
        assert_eq!(result.ids.len(), 3);

        let err = db.insert("cars", vec![json!(42)]).unwrap_err();
        assert!(matches!(err, Error::IllegalArgument(_)));
    }

    #[test]
    fn test_update_by_object_targets_one_row() {
        let db = Database::in_memory("shop").unwrap();
        cars(&db);
        let result = db
            .insert_many("cars", vec![json!({"brand": "Mazda"}), json!({"brand": "Ford"})])
            .unwrap();
        let key = result.ids[0].clone();

        let updated = db
            .update_by_object("cars", &json!({"_uuid": key, "sedan": true}))
            .unwrap();
        assert_eq!(updated, 1);
        let rows = db.select_where("cars", "sedan = true").unwrap();
        assert_eq!(rows.column_values("brand"), vec![Value::String("Mazda".into())]);

        let err = db.update_by_object("cars", &json!({"sedan": true})).unwrap_err();
        assert!(matches!(err, Error::IllegalArgument(_)));
    }

    #[test]
    fn test_select_request() {
        let db = Database::in_memory("shop").unwrap();
        cars(&db);
        db.insert_many(
            "cars",
            vec![
                json!({"brand": "Mazda", "sedan": true}),
                json!({"brand": "Ford", "sedan": false}),
                json!({"brand": "Audi", "sedan": true}),
            ],
        )
        .unwrap();

        let rows = db
            .select(
                SelectRequest::from_table("cars")
                    .columns(["brand"])
                    .filter("sedan = true")
                    .order_by("brand", true),
            )
            .unwrap();
        assert_eq!(
            rows.column_values("brand"),
            vec![Value::String("Audi".into()), Value::String("Mazda".into())]
        );

        let rows = db
            .select_distinct(SelectRequest::from_table("cars").columns(["sedan"]))
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_rename_picks_table_or_sequence() {
        let db = Database::in_memory("shop").unwrap();
        db.create_table("a", &[]).unwrap();
        db.create_sequence("s").unwrap();

        db.mv("a", "b").unwrap();
        db.move_("s", "t").unwrap();
        assert!(db.has_table("b").unwrap());
        assert!(db.has_sequence("t").unwrap());
        assert!(db.rename("ghost", "x").unwrap_err().is_not_found());
    }

    #[test]
    fn test_execute_runs_one_statement() {
        let db = Database::in_memory("shop").unwrap();
        db.execute("CREATE TABLE cars (brand VARCHAR(64), sedan BOOLEAN)").unwrap();
        db.execute("INSERT INTO cars (brand, sedan) VALUES ('Mazda', true)").unwrap();

        let result = db.query("SELECT COUNT(*) AS n FROM cars").unwrap();
        let rows = result.rows().unwrap();
        assert_eq!(rows.get(0, "n"), Some(&Value::Integer(1)));

        let err = db.execute("SHOW TABLES; SHOW SEQUENCES").unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn test_execute_script_and_forgiving_drop() {
        let db = Database::in_memory("shop").unwrap();
        let results = db
            .execute_script(
                "CREATE SEQUENCE ids;
                 SELECT NEXTVAL('ids');
                 SELECT NEXTVAL('ids');
                 DROP TABLE ghost",
            )
            .unwrap();
        assert_eq!(results.len(), 4);
        assert_eq!(results[2], QueryResult::Value(2));
    }

    #[test]
    fn test_create_column_resolves_types() {
        let db = Database::in_memory("shop").unwrap();
        let column = db.create_column("brand", "varchar", Some(12)).unwrap();
        assert_eq!(column.length(), Some(12));
        assert!(matches!(
            db.create_column("brand", "blob", None),
            Err(Error::IllegalArgument(_))
        ));
    }
}
