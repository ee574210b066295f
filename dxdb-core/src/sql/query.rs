/// Parsed SQL statements and their execution against a [`Connection`]
use super::connection::Connection;
use crate::column::{ColumnSpec, PRIMARY_KEY_COLUMN};
use crate::condition::{Condition, SqlLiteral};
use crate::describe::{Description, IndexDescription};
use crate::error::{Error, Result};
use crate::index::IndexType;
use crate::select::{ResultSet, SelectQuery};
use crate::table::{Assignment, InsertResult};
use serde_json::{Map, Value as Json};
use std::fmt;
use tracing::debug;

/// One action of an ALTER TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub enum AlterAction {
    AddColumn(ColumnSpec),
    AlterColumn(ColumnSpec),
    DropColumn(String),
    RenameColumn { from: String, to: String },
    RenameTable(String),
}

/// Rows of an INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub enum InsertValues {
    /// `VALUES (..), (..)`; an empty column list means "the table's columns"
    Positional {
        columns: Vec<String>,
        rows: Vec<Vec<Json>>,
    },
    /// `VALUE {..}` or `VALUES [{..}, ..]`
    Objects(Vec<Map<String, Json>>),
}

/// An index named in a statement, optionally qualified by its table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReference {
    pub table: Option<String>,
    pub index: String,
}

impl IndexReference {
    /// Split `table.index`
    pub fn parse(name: &str) -> Self {
        match name.rsplit_once('.') {
            Some((table, index)) => Self {
                table: Some(table.to_string()),
                index: index.to_string(),
            },
            None => Self {
                table: None,
                index: name.to_string(),
            },
        }
    }

    fn resolve_table<C: Connection + ?Sized>(&self, connection: &C) -> Result<String> {
        match &self.table {
            Some(table) => Ok(table.clone()),
            None => connection.find_index_table(&self.index),
        }
    }
}

impl fmt::Display for IndexReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.index),
            None => write!(f, "{}", self.index),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlQuery {
    CreateTable {
        table: String,
        columns: Vec<ColumnSpec>,
    },
    CreateSequence {
        sequence: String,
    },
    CreateIndex {
        table: String,
        index: String,
        column: String,
        index_type: Option<IndexType>,
    },
    DropTable {
        tables: Vec<String>,
        if_exists: bool,
    },
    DropSequence {
        sequences: Vec<String>,
        if_exists: bool,
    },
    DropIndex {
        indices: Vec<IndexReference>,
        if_exists: bool,
    },
    AlterTable {
        table: String,
        actions: Vec<AlterAction>,
    },
    RenameTable {
        from: String,
        to: String,
    },
    RenameSequence {
        from: String,
        to: String,
    },
    RenameIndex {
        from: IndexReference,
        to: String,
    },
    Select(SelectQuery),
    NextValue {
        sequence: String,
    },
    Insert {
        table: String,
        values: InsertValues,
    },
    Update {
        table: String,
        assignments: Vec<Assignment>,
        condition: Option<Condition>,
    },
    Delete {
        table: String,
        condition: Option<Condition>,
    },
    Describe {
        name: String,
    },
    ShowTables,
    ShowSequences,
    ShowIndices {
        table: Option<String>,
    },
}

/// Outcome of executing one statement
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Done,
    Rows(ResultSet),
    Inserted(InsertResult),
    Affected(usize),
    Description(Description),
    Names(Vec<String>),
    Indices(Vec<IndexDescription>),
    Value(i64),
}

impl QueryResult {
    pub fn rows(&self) -> Option<&ResultSet> {
        match self {
            QueryResult::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            QueryResult::Done => serde_json::json!({ "ok": true }),
            QueryResult::Rows(rows) => rows.to_json(),
            QueryResult::Inserted(result) => serde_json::to_value(result).unwrap_or(Json::Null),
            QueryResult::Affected(n) => serde_json::json!({ "affected": n }),
            QueryResult::Description(description) => {
                serde_json::to_value(description).unwrap_or(Json::Null)
            }
            QueryResult::Names(names) => serde_json::json!(names),
            QueryResult::Indices(indices) => serde_json::to_value(indices).unwrap_or(Json::Null),
            QueryResult::Value(value) => serde_json::json!({ "value": value }),
        }
    }
}

/// Skip "not found" failures when the statement said IF EXISTS
fn forgive_missing(result: Result<()>, if_exists: bool) -> Result<()> {
    match result {
        Err(e) if if_exists && e.is_not_found() => Ok(()),
        other => other,
    }
}

impl SqlQuery {
    /// Run the statement against a connection
    pub fn execute<C: Connection + ?Sized>(&self, connection: &C) -> Result<QueryResult> {
        debug!("Executing {}", self);
        match self {
            SqlQuery::CreateTable { table, columns } => {
                connection.create_table(table, columns)?;
                Ok(QueryResult::Done)
            }
            SqlQuery::CreateSequence { sequence } => {
                connection.create_sequence(sequence)?;
                Ok(QueryResult::Done)
            }
            SqlQuery::CreateIndex {
                table,
                index,
                column,
                index_type,
            } => {
                connection.create_index(table, index, column, *index_type)?;
                Ok(QueryResult::Done)
            }
            SqlQuery::DropTable { tables, if_exists } => {
                for table in tables {
                    forgive_missing(connection.delete_table(table), *if_exists)?;
                }
                Ok(QueryResult::Done)
            }
            SqlQuery::DropSequence {
                sequences,
                if_exists,
            } => {
                for sequence in sequences {
                    forgive_missing(connection.delete_sequence(sequence), *if_exists)?;
                }
                Ok(QueryResult::Done)
            }
            SqlQuery::DropIndex { indices, if_exists } => {
                for reference in indices {
                    let result = reference
                        .resolve_table(connection)
                        .and_then(|table| connection.delete_index(&table, &reference.index));
                    forgive_missing(result, *if_exists)?;
                }
                Ok(QueryResult::Done)
            }
            SqlQuery::AlterTable { table, actions } => {
                let mut current = table.clone();
                for action in actions {
                    match action {
                        AlterAction::AddColumn(spec) => {
                            connection.alter_table_add_columns(&current, std::slice::from_ref(spec))?
                        }
                        AlterAction::AlterColumn(spec) => {
                            connection.alter_table_alter_columns(&current, std::slice::from_ref(spec))?
                        }
                        AlterAction::DropColumn(column) => {
                            connection.alter_table_drop_columns(&current, std::slice::from_ref(column))?
                        }
                        AlterAction::RenameColumn { from, to } => connection
                            .alter_table_rename_columns(&current, &[(from.clone(), to.clone())])?,
                        AlterAction::RenameTable(to) => {
                            connection.rename_table(&current, to)?;
                            current = to.clone();
                        }
                    }
                }
                Ok(QueryResult::Done)
            }
            SqlQuery::RenameTable { from, to } => {
                connection.rename_table(from, to)?;
                Ok(QueryResult::Done)
            }
            SqlQuery::RenameSequence { from, to } => {
                connection.rename_sequence(from, to)?;
                Ok(QueryResult::Done)
            }
            SqlQuery::RenameIndex { from, to } => {
                let table = from.resolve_table(connection)?;
                connection.rename_index(&table, &from.index, to)?;
                Ok(QueryResult::Done)
            }
            SqlQuery::Select(query) => Ok(QueryResult::Rows(connection.select_query(query)?)),
            SqlQuery::NextValue { sequence } => Ok(QueryResult::Value(connection.next_value(sequence)?)),
            SqlQuery::Insert { table, values } => {
                let objects = values.to_objects(connection, table)?;
                Ok(QueryResult::Inserted(connection.insert_objects(table, objects)?))
            }
            SqlQuery::Update {
                table,
                assignments,
                condition,
            } => Ok(QueryResult::Affected(connection.update_rows(
                table,
                assignments,
                condition.as_ref(),
            )?)),
            SqlQuery::Delete { table, condition } => Ok(QueryResult::Affected(
                connection.delete_rows(table, condition.as_ref())?,
            )),
            SqlQuery::Describe { name } => Ok(QueryResult::Description(connection.desc(name)?)),
            SqlQuery::ShowTables => Ok(QueryResult::Names(connection.list_tables()?)),
            SqlQuery::ShowSequences => Ok(QueryResult::Names(connection.list_sequences()?)),
            SqlQuery::ShowIndices { table } => {
                Ok(QueryResult::Indices(connection.list_indices(table.as_deref())?))
            }
        }
    }
}

impl InsertValues {
    /// Turn the rows into objects keyed by column name
    ///
    /// Without an explicit column list the table's own columns are used;
    /// rows that leave out exactly the `_uuid` column get it generated.
    pub fn to_objects<C: Connection + ?Sized>(
        &self,
        connection: &C,
        table: &str,
    ) -> Result<Vec<Map<String, Json>>> {
        let (columns, rows) = match self {
            InsertValues::Objects(objects) => return Ok(objects.clone()),
            InsertValues::Positional { columns, rows } => (columns, rows),
        };

        let table_columns = if columns.is_empty() {
            match connection.desc(table)? {
                Description::Table(description) => {
                    description.columns.into_iter().map(|c| c.name).collect()
                }
                Description::Sequence(_) => {
                    return Err(Error::IllegalArgument(format!("'{}' is a sequence", table)))
                }
            }
        } else {
            Vec::new()
        };

        let mut objects = Vec::with_capacity(rows.len());
        for row in rows {
            let names: Vec<&str> = if !columns.is_empty() {
                columns.iter().map(String::as_str).collect()
            } else if row.len() == table_columns.len() {
                table_columns.iter().map(String::as_str).collect()
            } else {
                table_columns
                    .iter()
                    .map(String::as_str)
                    .filter(|c| *c != PRIMARY_KEY_COLUMN)
                    .collect()
            };
            if names.len() != row.len() {
                return Err(Error::BadRequest(format!(
                    "INSERT has {} values for {} columns",
                    row.len(),
                    names.len()
                )));
            }
            objects.push(
                names
                    .into_iter()
                    .map(str::to_string)
                    .zip(row.iter().cloned())
                    .collect(),
            );
        }
        Ok(objects)
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

struct ColumnDeclaration<'a>(&'a ColumnSpec);

impl fmt::Display for ColumnDeclaration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spec = self.0;
        match spec.length {
            Some(length) if length >= 0 && !spec.data_type.contains('(') => {
                write!(f, "{} {}({})", spec.name, spec.data_type, length)
            }
            _ => write!(f, "{} {}", spec.name, spec.data_type),
        }
    }
}

impl fmt::Display for AlterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlterAction::AddColumn(spec) => write!(f, "ADD COLUMN {}", ColumnDeclaration(spec)),
            AlterAction::AlterColumn(spec) => {
                let declaration = ColumnDeclaration(spec).to_string();
                let data_type = declaration.strip_prefix(spec.name.as_str()).unwrap_or(&declaration);
                write!(f, "ALTER COLUMN {} SET DATA TYPE{}", spec.name, data_type)
            }
            AlterAction::DropColumn(column) => write!(f, "DROP COLUMN {}", column),
            AlterAction::RenameColumn { from, to } => write!(f, "RENAME COLUMN {} TO {}", from, to),
            AlterAction::RenameTable(to) => write!(f, "RENAME TO {}", to),
        }
    }
}

impl fmt::Display for SqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let if_exists = |flag: bool| if flag { "IF EXISTS " } else { "" };
        match self {
            SqlQuery::CreateTable { table, columns } => {
                write!(f, "CREATE TABLE {} (", table)?;
                let declarations: Vec<ColumnDeclaration> = columns.iter().map(ColumnDeclaration).collect();
                write_list(f, &declarations)?;
                write!(f, ")")
            }
            SqlQuery::CreateSequence { sequence } => write!(f, "CREATE SEQUENCE {}", sequence),
            SqlQuery::CreateIndex {
                table,
                index,
                column,
                index_type,
            } => {
                write!(f, "CREATE INDEX {} ON {}", index, table)?;
                match index_type {
                    Some(IndexType::Hash) => write!(f, " USING hash")?,
                    Some(IndexType::BPlusTree) => write!(f, " USING btree")?,
                    None => {}
                }
                write!(f, " ({})", column)
            }
            SqlQuery::DropTable { tables, if_exists: flag } => {
                write!(f, "DROP TABLE {}", if_exists(*flag))?;
                write_list(f, tables)
            }
            SqlQuery::DropSequence {
                sequences,
                if_exists: flag,
            } => {
                write!(f, "DROP SEQUENCE {}", if_exists(*flag))?;
                write_list(f, sequences)
            }
            SqlQuery::DropIndex { indices, if_exists: flag } => {
                write!(f, "DROP INDEX {}", if_exists(*flag))?;
                write_list(f, indices)
            }
            SqlQuery::AlterTable { table, actions } => {
                write!(f, "ALTER TABLE {} ", table)?;
                write_list(f, actions)
            }
            SqlQuery::RenameTable { from, to } => write!(f, "RENAME TABLE {} TO {}", from, to),
            SqlQuery::RenameSequence { from, to } => write!(f, "RENAME SEQUENCE {} TO {}", from, to),
            SqlQuery::RenameIndex { from, to } => write!(f, "RENAME INDEX {} TO {}", from, to),
            SqlQuery::Select(query) => write!(f, "{}", query),
            SqlQuery::NextValue { sequence } => {
                write!(f, "SELECT NEXTVAL({})", SqlLiteral(&Json::String(sequence.clone())))
            }
            SqlQuery::Insert { table, values } => {
                write!(f, "INSERT INTO {}", table)?;
                match values {
                    InsertValues::Positional { columns, rows } => {
                        if !columns.is_empty() {
                            write!(f, " (")?;
                            write_list(f, columns)?;
                            write!(f, ")")?;
                        }
                        write!(f, " VALUES ")?;
                        for (i, row) in rows.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            let literals: Vec<SqlLiteral> = row.iter().map(SqlLiteral).collect();
                            write!(f, "(")?;
                            write_list(f, &literals)?;
                            write!(f, ")")?;
                        }
                        Ok(())
                    }
                    InsertValues::Objects(objects) => match objects.as_slice() {
                        [single] => write!(f, " VALUE {}", Json::Object(single.clone())),
                        many => write!(
                            f,
                            " VALUES {}",
                            Json::Array(many.iter().cloned().map(Json::Object).collect())
                        ),
                    },
                }
            }
            SqlQuery::Update {
                table,
                assignments,
                condition,
            } => {
                write!(f, "UPDATE {} SET ", table)?;
                write_list(f, assignments)?;
                if let Some(condition) = condition {
                    write!(f, " WHERE {}", condition)?;
                }
                Ok(())
            }
            SqlQuery::Delete { table, condition } => {
                write!(f, "DELETE FROM {}", table)?;
                if let Some(condition) = condition {
                    write!(f, " WHERE {}", condition)?;
                }
                Ok(())
            }
            SqlQuery::Describe { name } => write!(f, "DESC {}", name),
            SqlQuery::ShowTables => write!(f, "SHOW TABLES"),
            SqlQuery::ShowSequences => write!(f, "SHOW SEQUENCES"),
            SqlQuery::ShowIndices { table } => match table {
                Some(table) => write!(f, "SHOW INDICES FROM {}", table),
                None => write!(f, "SHOW INDICES"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column_type::ColumnType;
    use crate::describe::{ColumnDescription, TableDescription};
    use parking_lot::Mutex;
    use serde_json::json;

    /// Records what statements ask of it
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Connection for Recorder {
        fn rename_table(&self, from: &str, to: &str) -> Result<()> {
            self.calls.lock().push(format!("rename {} {}", from, to));
            Ok(())
        }

        fn alter_table_drop_columns(&self, table: &str, columns: &[String]) -> Result<()> {
            self.calls.lock().push(format!("drop {} {}", table, columns.join(",")));
            Ok(())
        }

        fn delete_table(&self, table: &str) -> Result<()> {
            Err(Error::FileNotFound(table.to_string()))
        }

        fn desc(&self, name: &str) -> Result<Description> {
            let column = |name: &str| ColumnDescription {
                uuid: name.to_string(),
                name: name.to_string(),
                column_type: ColumnType::String,
                length: None,
            };
            Ok(Description::Table(TableDescription {
                uuid: "t".into(),
                name: name.to_string(),
                columns: vec![column("_uuid"), column("brand"), column("model")],
                indices: Vec::new(),
                row_count: 0,
            }))
        }
    }

    #[test]
    fn test_default_methods_are_not_implemented() {
        let recorder = Recorder::default();
        let err = SqlQuery::ShowTables.execute(&recorder).unwrap_err();
        assert!(matches!(err, Error::NotImplemented(_)));
    }

    #[test]
    fn test_alter_actions_follow_table_rename() {
        let recorder = Recorder::default();
        let query = SqlQuery::AlterTable {
            table: "cars".into(),
            actions: vec![
                AlterAction::RenameTable("autos".into()),
                AlterAction::DropColumn("sedan".into()),
            ],
        };
        query.execute(&recorder).unwrap();
        assert_eq!(
            *recorder.calls.lock(),
            vec!["rename cars autos".to_string(), "drop autos sedan".to_string()]
        );
    }

    #[test]
    fn test_drop_if_exists_forgives_missing() {
        let recorder = Recorder::default();
        let forgiving = SqlQuery::DropTable {
            tables: vec!["ghost".into()],
            if_exists: true,
        };
        assert_eq!(forgiving.execute(&recorder).unwrap(), QueryResult::Done);

        let strict = SqlQuery::DropTable {
            tables: vec!["ghost".into()],
            if_exists: false,
        };
        assert!(strict.execute(&recorder).unwrap_err().is_not_found());
    }

    #[test]
    fn test_positional_rows_skip_generated_key() {
        let recorder = Recorder::default();
        let values = InsertValues::Positional {
            columns: Vec::new(),
            rows: vec![vec![json!("Mazda"), json!("MX-5")]],
        };
        let objects = values.to_objects(&recorder, "cars").unwrap();
        assert_eq!(objects[0].get("brand"), Some(&json!("Mazda")));
        assert!(!objects[0].contains_key("_uuid"));
    }

    #[test]
    fn test_positional_arity_mismatch() {
        let recorder = Recorder::default();
        let values = InsertValues::Positional {
            columns: vec!["brand".into()],
            rows: vec![vec![json!("Mazda"), json!(true)]],
        };
        assert!(matches!(
            values.to_objects(&recorder, "cars"),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn test_display() {
        let query = SqlQuery::Delete {
            table: "cars".into(),
            condition: Some(Condition::equals("brand", "Mazda")),
        };
        assert_eq!(query.to_string(), "DELETE FROM cars WHERE brand = 'Mazda'");

        let query = SqlQuery::CreateIndex {
            table: "cars".into(),
            index: "by_brand".into(),
            column: "brand".into(),
            index_type: Some(IndexType::Hash),
        };
        assert_eq!(query.to_string(), "CREATE INDEX by_brand ON cars USING hash (brand)");

        let reference = IndexReference::parse("cars.by_brand");
        assert_eq!(reference.table.as_deref(), Some("cars"));
        assert_eq!(reference.to_string(), "cars.by_brand");
    }
}
