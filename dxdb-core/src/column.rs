use crate::column_type::ColumnType;
use crate::error::{Error, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the synthetic identifier column every table carries
pub const PRIMARY_KEY_COLUMN: &str = "_uuid";

/// A typed, named column
///
/// The uuid is the column's stable identity: data files key row values by
/// it, so renaming a column never rewrites rows.
#[derive(Debug, Clone)]
pub struct Column {
    uuid: String,
    name: String,
    column_type: ColumnType,
    length: Option<usize>,
}

impl Column {
    pub fn new(
        uuid: impl Into<String>,
        name: impl Into<String>,
        column_type: ColumnType,
        length: Option<usize>,
    ) -> Result<Self> {
        let uuid = uuid.into().trim().to_string();
        let name = name.into().trim().to_string();

        if uuid.is_empty() {
            return Err(Error::IllegalArgument("column uuid must not be empty".into()));
        }
        validate_name(&name)?;

        let length = if column_type.supports_length() { length } else { None };
        Ok(Self {
            uuid,
            name,
            column_type,
            length,
        })
    }

    /// New column with a freshly generated uuid
    pub fn create(name: impl Into<String>, column_type: ColumnType, length: Option<usize>) -> Result<Self> {
        Self::new(Uuid::new_v4().to_string(), name, column_type, length)
    }

    /// The `_uuid` STRING column
    pub fn primary_key() -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            name: PRIMARY_KEY_COLUMN.to_string(),
            column_type: ColumnType::String,
            length: None,
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn length(&self) -> Option<usize> {
        self.length
    }

    pub fn is_primary_key(&self) -> bool {
        self.name == PRIMARY_KEY_COLUMN
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        validate_name(&name)?;
        self.name = name;
        Ok(())
    }

    /// Same identity, new type and length
    pub(crate) fn retyped(&self, column_type: ColumnType, length: Option<usize>) -> Column {
        Column {
            uuid: self.uuid.clone(),
            name: self.name.clone(),
            column_type,
            length: if column_type.supports_length() { length } else { None },
        }
    }

    /// Coerce JSON input to this column's type, enforcing the length limit
    pub fn coerce(&self, input: &serde_json::Value) -> Result<Value> {
        let value = self.column_type.coerce(input).map_err(|e| match e {
            Error::IllegalArgument(msg) => {
                Error::IllegalArgument(format!("column '{}': {}", self.name, msg))
            }
            other => other,
        })?;
        self.check_length(&value)?;
        Ok(value)
    }

    fn check_length(&self, value: &Value) -> Result<()> {
        let Some(limit) = self.length else {
            return Ok(());
        };
        let too_long = |s: &str| s.chars().count() > limit;
        let exceeded = match value {
            Value::String(s) => too_long(s),
            Value::Array(items) => items.iter().filter_map(Value::as_str).any(too_long),
            _ => false,
        };
        if exceeded {
            return Err(Error::IllegalArgument(format!(
                "value for column '{}' exceeds length {}",
                self.name, limit
            )));
        }
        Ok(())
    }

    pub fn definition(&self) -> ColumnDefinition {
        ColumnDefinition {
            uuid: self.uuid.clone(),
            name: self.name.clone(),
            column_type: self.column_type,
            length: self.length.map(|l| l as i64),
        }
    }

    pub fn from_definition(definition: &ColumnDefinition) -> Result<Self> {
        let length = definition
            .length
            .filter(|l| *l >= 0)
            .map(|l| l as usize);
        Self::new(
            definition.uuid.clone(),
            definition.name.clone(),
            definition.column_type,
            length,
        )
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.column_type == other.column_type && self.name == other.name
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::IllegalArgument("column name must not be empty".into()));
    }
    Ok(())
}

/// On-disk form of a column inside the tables definition file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnDefinition {
    pub uuid: String,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
}

/// Caller-facing column declaration: a name, a type name and a length
///
/// `data_type` may carry its own length, as in `VARCHAR(64)`; an explicit
/// `length` wins. Negative lengths mean unbounded.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: String,
    pub length: Option<i64>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            length: None,
        }
    }

    pub fn with_length(mut self, length: i64) -> Self {
        self.length = Some(length);
        self
    }

    /// Resolve the declared type into a new column
    pub fn to_column(&self) -> Result<Column> {
        let (column_type, declared) = ColumnType::parse_declaration(&self.data_type)?;
        let length = match self.length {
            Some(l) if l < 0 => None,
            Some(l) => Some(l as usize),
            None => declared,
        };
        Column::create(self.name.trim(), column_type, length)
    }

    /// Resolve the declared type, keeping an existing column's identity
    pub(crate) fn to_column_like(&self, existing: &Column) -> Result<Column> {
        let column = self.to_column()?;
        Ok(existing.retyped(column.column_type(), column.length()))
    }
}
