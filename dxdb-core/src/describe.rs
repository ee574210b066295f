use crate::column_type::ColumnType;
use crate::index::IndexType;
use serde::Serialize;
use std::fmt;

/// Result of DESC on a table or a sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Description {
    Table(TableDescription),
    Sequence(SequenceDescription),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescription {
    pub uuid: String,
    pub name: String,
    pub columns: Vec<ColumnDescription>,
    pub indices: Vec<IndexDescription>,
    pub row_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescription {
    pub uuid: String,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexDescription {
    pub uuid: String,
    pub name: String,
    pub table: String,
    pub column: String,
    #[serde(rename = "type")]
    pub index_type: IndexType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceDescription {
    pub uuid: String,
    pub name: String,
    pub current_value: Option<i64>,
}

impl Description {
    pub fn name(&self) -> &str {
        match self {
            Description::Table(table) => &table.name,
            Description::Sequence(sequence) => &sequence.name,
        }
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Description::Table(table) => {
                writeln!(f, "TABLE {} ({} rows)", table.name, table.row_count)?;
                for column in &table.columns {
                    match column.length {
                        Some(length) => writeln!(f, "  {} {}({})", column.name, column.column_type, length)?,
                        None => writeln!(f, "  {} {}", column.name, column.column_type)?,
                    }
                }
                for index in &table.indices {
                    writeln!(f, "  INDEX {} ON {} USING {}", index.name, index.column, index.index_type)?;
                }
                Ok(())
            }
            Description::Sequence(sequence) => match sequence.current_value {
                Some(value) => writeln!(f, "SEQUENCE {} (current value {})", sequence.name, value),
                None => writeln!(f, "SEQUENCE {} (unused)", sequence.name),
            },
        }
    }
}
