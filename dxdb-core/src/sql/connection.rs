use crate::column::ColumnSpec;
use crate::condition::Condition;
use crate::describe::{Description, IndexDescription};
use crate::error::{Error, Result};
use crate::index::IndexType;
use crate::select::{ResultSet, SelectQuery};
use crate::table::{Assignment, InsertResult};

fn not_implemented(operation: &str) -> Error {
    Error::NotImplemented(format!("{} is not supported by this connection", operation))
}

/// Everything a parsed statement needs from the database it runs against
///
/// Every method has a default that fails with `NotImplemented`, so a
/// connection only overrides what it can actually do.
pub trait Connection {
    fn create_table(&self, _table: &str, _columns: &[ColumnSpec]) -> Result<()> {
        Err(not_implemented("create_table"))
    }

    fn create_sequence(&self, _sequence: &str) -> Result<()> {
        Err(not_implemented("create_sequence"))
    }

    fn create_index(
        &self,
        _table: &str,
        _index: &str,
        _column: &str,
        _index_type: Option<IndexType>,
    ) -> Result<()> {
        Err(not_implemented("create_index"))
    }

    fn delete_table(&self, _table: &str) -> Result<()> {
        Err(not_implemented("delete_table"))
    }

    fn delete_sequence(&self, _sequence: &str) -> Result<()> {
        Err(not_implemented("delete_sequence"))
    }

    fn delete_index(&self, _table: &str, _index: &str) -> Result<()> {
        Err(not_implemented("delete_index"))
    }

    fn rename_table(&self, _from: &str, _to: &str) -> Result<()> {
        Err(not_implemented("rename_table"))
    }

    fn rename_sequence(&self, _from: &str, _to: &str) -> Result<()> {
        Err(not_implemented("rename_sequence"))
    }

    fn rename_index(&self, _table: &str, _from: &str, _to: &str) -> Result<()> {
        Err(not_implemented("rename_index"))
    }

    fn alter_table_add_columns(&self, _table: &str, _columns: &[ColumnSpec]) -> Result<()> {
        Err(not_implemented("alter_table_add_columns"))
    }

    fn alter_table_alter_columns(&self, _table: &str, _columns: &[ColumnSpec]) -> Result<()> {
        Err(not_implemented("alter_table_alter_columns"))
    }

    fn alter_table_drop_columns(&self, _table: &str, _columns: &[String]) -> Result<()> {
        Err(not_implemented("alter_table_drop_columns"))
    }

    fn alter_table_rename_columns(&self, _table: &str, _renames: &[(String, String)]) -> Result<()> {
        Err(not_implemented("alter_table_rename_columns"))
    }

    fn select_query(&self, _query: &SelectQuery) -> Result<ResultSet> {
        Err(not_implemented("select"))
    }

    fn insert_objects(
        &self,
        _table: &str,
        _objects: Vec<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<InsertResult> {
        Err(not_implemented("insert"))
    }

    fn update_rows(
        &self,
        _table: &str,
        _assignments: &[Assignment],
        _condition: Option<&Condition>,
    ) -> Result<usize> {
        Err(not_implemented("update"))
    }

    fn delete_rows(&self, _table: &str, _condition: Option<&Condition>) -> Result<usize> {
        Err(not_implemented("delete"))
    }

    fn desc(&self, _name: &str) -> Result<Description> {
        Err(not_implemented("desc"))
    }

    fn next_value(&self, _sequence: &str) -> Result<i64> {
        Err(not_implemented("next_value"))
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        Err(not_implemented("list_tables"))
    }

    fn list_sequences(&self) -> Result<Vec<String>> {
        Err(not_implemented("list_sequences"))
    }

    fn list_indices(&self, _table: Option<&str>) -> Result<Vec<IndexDescription>> {
        Err(not_implemented("list_indices"))
    }

    /// Name of the table owning an index, when the statement left it out
    fn find_index_table(&self, _index: &str) -> Result<String> {
        Err(not_implemented("find_index_table"))
    }
}
