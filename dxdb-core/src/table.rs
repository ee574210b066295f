/// Tables: typed columns, rows and the indices over them
///
/// Rows live in memory keyed by an insertion-ordered row id. Every table
/// carries the `_uuid` STRING column; its value is unique and read-only.
/// Mutations hand back what they replaced so the database can undo them
/// when persisting the data file fails.
use crate::column::{Column, ColumnDefinition, ColumnSpec, PRIMARY_KEY_COLUMN};
use crate::condition::{BoundCondition, Condition, SqlLiteral};
use crate::describe::{ColumnDescription, IndexDescription, TableDescription};
use crate::error::{Error, Result};
use crate::index::{IndexDefinition, IndexType, RowId, TableIndex};
use crate::value::{Row, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

/// On-disk form of a table inside the tables definition file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub uuid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnDefinition>,
}

/// Identifiers of inserted rows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub ids: Vec<String>,
    pub n_inserted: usize,
}

impl InsertResult {
    pub fn merge(&mut self, other: InsertResult) {
        self.n_inserted += other.n_inserted;
        self.ids.extend(other.ids);
    }
}

/// Right-hand side of an UPDATE assignment
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateValue {
    /// col = literal
    Set(serde_json::Value),
    /// col = col + literal
    Add(serde_json::Value),
    /// col = col - literal
    Subtract(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: UpdateValue,
}

impl Assignment {
    pub fn set(column: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            column: column.into(),
            value: UpdateValue::Set(value.into()),
        }
    }

    pub fn add(column: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            column: column.into(),
            value: UpdateValue::Add(value.into()),
        }
    }

    pub fn subtract(column: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            column: column.into(),
            value: UpdateValue::Subtract(value.into()),
        }
    }

    /// One literal assignment per key of a JSON object
    pub fn from_object(object: &serde_json::Map<String, serde_json::Value>) -> Vec<Assignment> {
        object
            .iter()
            .map(|(column, value)| Assignment::set(column.clone(), value.clone()))
            .collect()
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            UpdateValue::Set(v) => write!(f, "{} = {}", self.column, SqlLiteral(v)),
            UpdateValue::Add(v) => write!(f, "{} = {} + {}", self.column, self.column, SqlLiteral(v)),
            UpdateValue::Subtract(v) => {
                write!(f, "{} = {} - {}", self.column, self.column, SqlLiteral(v))
            }
        }
    }
}

enum BoundUpdate {
    Set(Value),
    Add(Value),
    Subtract(Value),
}

impl BoundUpdate {
    fn apply(&self, current: &Value, column: &str) -> Result<Value> {
        let (operand, subtract) = match self {
            BoundUpdate::Set(value) => return Ok(value.clone()),
            BoundUpdate::Add(operand) => (operand, false),
            BoundUpdate::Subtract(operand) => (operand, true),
        };
        let overflow = || Error::IllegalArgument(format!("arithmetic overflow in column '{}'", column));

        match (current, operand) {
            (Value::Null, _) => Ok(Value::Null),
            (Value::Integer(a), Value::Integer(b)) => {
                let result = if subtract { a.checked_sub(*b) } else { a.checked_add(*b) };
                result.map(Value::Integer).ok_or_else(overflow)
            }
            (Value::Double(a), Value::Double(b)) => {
                Ok(Value::Double(if subtract { a - b } else { a + b }))
            }
            (Value::Float(a), Value::Float(b)) => {
                Ok(Value::Float(if subtract { a - b } else { a + b }))
            }
            _ => Err(Error::IllegalArgument(format!(
                "cannot apply arithmetic to column '{}'",
                column
            ))),
        }
    }
}

/// Rows added by an insert, for undo
pub(crate) struct InsertOutcome {
    pub result: InsertResult,
    pub row_ids: Vec<RowId>,
}

#[derive(Debug, Clone)]
pub struct Table {
    uuid: String,
    name: String,
    columns: Vec<Column>,
    rows: BTreeMap<RowId, Row>,
    primary_keys: HashMap<String, RowId>,
    next_row_id: RowId,
    indices: Vec<TableIndex>,
}

impl Table {
    pub fn new(uuid: impl Into<String>, name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let uuid = uuid.into();
        let name = name.into();

        if uuid.trim().is_empty() {
            return Err(Error::IllegalArgument("table uuid must not be empty".into()));
        }
        if name.trim().is_empty() {
            return Err(Error::IllegalArgument("table name must not be empty".into()));
        }
        if !columns.iter().any(Column::is_primary_key) {
            return Err(Error::IllegalArgument(format!(
                "table '{}' has no {} column",
                name, PRIMARY_KEY_COLUMN
            )));
        }

        {
            let mut names = HashSet::new();
            let mut uuids = HashSet::new();
            for column in &columns {
                if !names.insert(column.name()) {
                    return Err(Error::IllegalArgument(format!(
                        "duplicate column '{}' in table '{}'",
                        column.name(),
                        name
                    )));
                }
                if !uuids.insert(column.uuid()) {
                    return Err(Error::IllegalArgument(format!(
                        "duplicate column uuid '{}' in table '{}'",
                        column.uuid(),
                        name
                    )));
                }
            }
        }

        Ok(Self {
            uuid,
            name,
            columns,
            rows: BTreeMap::new(),
            primary_keys: HashMap::new(),
            next_row_id: 0,
            indices: Vec::new(),
        })
    }

    /// Rebuild a table from its definition; a missing `_uuid` column is added
    pub fn from_definition(definition: &TableDefinition) -> Result<Self> {
        let mut columns = definition
            .columns
            .iter()
            .map(Column::from_definition)
            .collect::<Result<Vec<_>>>()?;
        if !columns.iter().any(Column::is_primary_key) {
            columns.insert(0, Column::primary_key());
        }
        Self::new(definition.uuid.clone(), definition.name.clone(), columns)
    }

    pub fn definition(&self) -> TableDefinition {
        TableDefinition {
            uuid: self.uuid.clone(),
            name: self.name.clone(),
            columns: self.columns.iter().map(Column::definition).collect(),
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Name of the data file holding this table's rows
    pub fn data_file(&self) -> String {
        format!("{}.tbl", self.uuid)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_by_uuid(&self, uuid: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.uuid() == uuid)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.rows.get(&id)
    }

    /// Row holding the given `_uuid`
    pub fn row_by_key(&self, key: &str) -> Option<&Row> {
        self.primary_keys.get(key).and_then(|id| self.rows.get(id))
    }

    // ----- rows -----

    /// Ids of the rows matching the condition, in insertion order
    pub fn matching_rows(&self, condition: Option<&Condition>) -> Result<Vec<RowId>> {
        let Some(condition) = condition else {
            return Ok(self.rows.keys().copied().collect());
        };
        let bound = condition.bind(self)?;

        let candidates: Vec<RowId> = match self.plan(&bound) {
            Some(ids) => ids.into_iter().collect(),
            None => self.rows.keys().copied().collect(),
        };

        Ok(candidates
            .into_iter()
            .filter(|id| self.rows.get(id).is_some_and(|row| bound.matches(row)))
            .collect())
    }

    /// Candidate rows from the first index able to answer a probe
    fn plan(&self, bound: &BoundCondition) -> Option<BTreeSet<RowId>> {
        for (column_name, probe) in bound.index_probes() {
            let Some(column) = self.column(column_name) else {
                continue;
            };
            for index in self.indices.iter().filter(|i| i.column_uuid() == column.uuid()) {
                if let Some(ids) = index.lookup(&probe) {
                    debug!(
                        "Index {} narrowed scan of {} to {} rows",
                        index.name(),
                        self.name,
                        ids.len()
                    );
                    return Some(ids);
                }
            }
        }
        None
    }

    /// Validate, coerce and add rows; all of them or none
    pub(crate) fn insert_rows(
        &mut self,
        objects: &[serde_json::Map<String, serde_json::Value>],
    ) -> Result<InsertOutcome> {
        let mut prepared = Vec::with_capacity(objects.len());
        let mut batch_keys = HashSet::new();

        for object in objects {
            if let Some(unknown) = object.keys().find(|key| self.column(key).is_none()) {
                return Err(Error::IllegalArgument(format!(
                    "unknown column '{}' in table '{}'",
                    unknown, self.name
                )));
            }

            let mut row = Row::with_capacity(self.columns.len());
            for column in &self.columns {
                let value = match object.get(column.name()) {
                    Some(input) => column.coerce(input)?,
                    None => Value::Null,
                };
                row.insert(column.name().to_string(), value);
            }

            let key = match row.get(PRIMARY_KEY_COLUMN) {
                Some(Value::String(key)) if !key.is_empty() => key.clone(),
                _ => Uuid::new_v4().to_string(),
            };
            if self.primary_keys.contains_key(&key) || !batch_keys.insert(key.clone()) {
                return Err(Error::Conflict(format!(
                    "duplicate {} '{}' in table '{}'",
                    PRIMARY_KEY_COLUMN, key, self.name
                )));
            }
            row.insert(PRIMARY_KEY_COLUMN.to_string(), Value::String(key.clone()));
            prepared.push((key, row));
        }

        let mut outcome = InsertOutcome {
            result: InsertResult::default(),
            row_ids: Vec::with_capacity(prepared.len()),
        };
        for (key, row) in prepared {
            let id = self.next_row_id;
            self.next_row_id += 1;
            self.put_row(id, row);
            outcome.result.ids.push(key);
            outcome.row_ids.push(id);
        }
        outcome.result.n_inserted = outcome.row_ids.len();
        Ok(outcome)
    }

    /// Apply assignments to the matching rows, returning their previous versions
    pub(crate) fn update_matching(
        &mut self,
        assignments: &[Assignment],
        condition: Option<&Condition>,
    ) -> Result<Vec<(RowId, Row)>> {
        let updates = self.bind_assignments(assignments)?;
        let ids = self.matching_rows(condition)?;

        let mut replacements = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(current) = self.rows.get(&id) else {
                continue;
            };
            let mut next = current.clone();
            for (column, update) in &updates {
                let value = next.get(column).unwrap_or(&Value::Null);
                let value = update.apply(value, column)?;
                next.insert(column.clone(), value);
            }
            replacements.push((id, next));
        }

        let mut previous = Vec::with_capacity(replacements.len());
        for (id, next) in replacements {
            if let Some(old) = self.take_row(id) {
                previous.push((id, old));
            }
            self.put_row(id, next);
        }
        Ok(previous)
    }

    fn bind_assignments(&self, assignments: &[Assignment]) -> Result<Vec<(String, BoundUpdate)>> {
        assignments
            .iter()
            .map(|assignment| {
                let column = self.column(&assignment.column).ok_or_else(|| {
                    Error::IllegalArgument(format!(
                        "unknown column '{}' in table '{}'",
                        assignment.column, self.name
                    ))
                })?;
                if column.is_primary_key() {
                    return Err(Error::IllegalArgument(format!(
                        "column {} is read-only",
                        PRIMARY_KEY_COLUMN
                    )));
                }

                let update = match &assignment.value {
                    UpdateValue::Set(input) => BoundUpdate::Set(column.coerce(input)?),
                    UpdateValue::Add(input) | UpdateValue::Subtract(input) => {
                        if !column.column_type().is_numeric() {
                            return Err(Error::IllegalArgument(format!(
                                "column '{}' of type {} does not support arithmetic",
                                column.name(),
                                column.column_type()
                            )));
                        }
                        let operand = column.coerce(input)?;
                        if operand.is_null() {
                            return Err(Error::IllegalArgument(format!(
                                "arithmetic on column '{}' needs a value",
                                column.name()
                            )));
                        }
                        if matches!(assignment.value, UpdateValue::Add(_)) {
                            BoundUpdate::Add(operand)
                        } else {
                            BoundUpdate::Subtract(operand)
                        }
                    }
                };
                Ok((column.name().to_string(), update))
            })
            .collect()
    }

    /// Remove the matching rows, returning them
    pub(crate) fn delete_matching(&mut self, condition: Option<&Condition>) -> Result<Vec<(RowId, Row)>> {
        let ids = self.matching_rows(condition)?;
        Ok(self.remove_rows(&ids))
    }

    pub(crate) fn remove_rows(&mut self, ids: &[RowId]) -> Vec<(RowId, Row)> {
        ids.iter()
            .filter_map(|id| self.take_row(*id).map(|row| (*id, row)))
            .collect()
    }

    /// Put rows back under their original ids, replacing current versions
    pub(crate) fn restore_rows(&mut self, rows: Vec<(RowId, Row)>) {
        for (id, row) in rows {
            self.take_row(id);
            self.put_row(id, row);
        }
    }

    fn put_row(&mut self, id: RowId, row: Row) {
        for index in self.indices.iter_mut() {
            let key = index_key(&self.columns, index, &row);
            index.insert(key, id);
        }
        if let Some(Value::String(key)) = row.get(PRIMARY_KEY_COLUMN) {
            self.primary_keys.insert(key.clone(), id);
        }
        self.next_row_id = self.next_row_id.max(id + 1);
        self.rows.insert(id, row);
    }

    fn take_row(&mut self, id: RowId) -> Option<Row> {
        let row = self.rows.remove(&id)?;
        for index in self.indices.iter_mut() {
            let key = index_key(&self.columns, index, &row);
            index.remove(&key, id);
        }
        if let Some(Value::String(key)) = row.get(PRIMARY_KEY_COLUMN) {
            self.primary_keys.remove(key);
        }
        Some(row)
    }

    // ----- data file -----

    /// Rows as stored on disk: one object per row keyed by column uuid
    pub(crate) fn encode_rows(&self, pretty: bool) -> Result<Vec<u8>> {
        let records: Vec<serde_json::Map<String, serde_json::Value>> = self
            .rows
            .values()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|column| {
                        let value = row.get(column.name()).unwrap_or(&Value::Null);
                        (column.uuid().to_string(), value.to_json())
                    })
                    .collect()
            })
            .collect();

        let data = if pretty {
            serde_json::to_vec_pretty(&records)?
        } else {
            serde_json::to_vec(&records)?
        };
        Ok(data)
    }

    pub(crate) fn load_rows(&mut self, data: &[u8]) -> Result<()> {
        let records: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_slice(data)?;

        for record in records {
            let mut row = Row::with_capacity(self.columns.len());
            for column in &self.columns {
                let value = match record.get(column.uuid()) {
                    Some(input) => column.column_type().coerce(input).map_err(|e| {
                        Error::Corruption(format!(
                            "table '{}' column '{}': {}",
                            self.name,
                            column.name(),
                            e
                        ))
                    })?,
                    None => Value::Null,
                };
                row.insert(column.name().to_string(), value);
            }

            match row.get(PRIMARY_KEY_COLUMN) {
                Some(Value::String(key)) if !self.primary_keys.contains_key(key) => {}
                _ => {
                    return Err(Error::Corruption(format!(
                        "table '{}' holds a row with a missing or duplicate {}",
                        self.name, PRIMARY_KEY_COLUMN
                    )))
                }
            }

            let id = self.next_row_id;
            self.put_row(id, row);
        }
        Ok(())
    }

    // ----- schema -----

    pub(crate) fn add_column(&mut self, column: Column) -> Result<()> {
        if self.column(column.name()).is_some() {
            return Err(Error::Conflict(format!(
                "column '{}' already exists in table '{}'",
                column.name(),
                self.name
            )));
        }
        if self.column_by_uuid(column.uuid()).is_some() {
            return Err(Error::Conflict(format!(
                "column uuid '{}' already exists in table '{}'",
                column.uuid(),
                self.name
            )));
        }

        for row in self.rows.values_mut() {
            row.insert(column.name().to_string(), Value::Null);
        }
        self.columns.push(column);
        Ok(())
    }

    /// Change a column's type, converting stored values
    ///
    /// Values that do not convert become NULL.
    pub(crate) fn alter_column(&mut self, spec: &ColumnSpec) -> Result<()> {
        let position = self.user_column_position(&spec.name)?;
        let altered = spec.to_column_like(&self.columns[position])?;

        let name = altered.name().to_string();
        for row in self.rows.values_mut() {
            let Some(value) = row.get_mut(&name) else {
                continue;
            };
            if let Some(converted) = convert_value(value, &altered) {
                *value = converted;
            } else {
                warn!(
                    "Value {} of {}.{} does not convert to {}, storing null",
                    value,
                    self.name,
                    name,
                    altered.column_type()
                );
                *value = Value::Null;
            }
        }

        self.columns[position] = altered;
        self.refresh_indices();
        Ok(())
    }

    /// Remove a column and every index over it
    pub(crate) fn drop_column(&mut self, name: &str) -> Result<()> {
        let position = self.user_column_position(name)?;
        let column = self.columns.remove(position);

        let before = self.indices.len();
        self.indices.retain(|index| index.column_uuid() != column.uuid());
        if self.indices.len() != before {
            debug!(
                "Dropped {} index(es) over {}.{}",
                before - self.indices.len(),
                self.name,
                name
            );
        }

        for row in self.rows.values_mut() {
            row.remove(name);
        }
        Ok(())
    }

    pub(crate) fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        let position = self.user_column_position(from)?;
        if self.column(to).is_some() {
            return Err(Error::Conflict(format!(
                "column '{}' already exists in table '{}'",
                to, self.name
            )));
        }

        self.columns[position].set_name(to)?;
        for row in self.rows.values_mut() {
            if let Some(value) = row.remove(from) {
                row.insert(to.to_string(), value);
            }
        }
        Ok(())
    }

    fn user_column_position(&self, name: &str) -> Result<usize> {
        let position = self
            .columns
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| {
                Error::IllegalArgument(format!("unknown column '{}' in table '{}'", name, self.name))
            })?;
        if self.columns[position].is_primary_key() {
            return Err(Error::IllegalArgument(format!(
                "column {} cannot be altered",
                PRIMARY_KEY_COLUMN
            )));
        }
        Ok(position)
    }

    // ----- indices -----

    pub fn indices(&self) -> &[TableIndex] {
        &self.indices
    }

    pub fn index(&self, name: &str) -> Option<&TableIndex> {
        self.indices.iter().find(|i| i.name() == name)
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.index(name).is_some()
    }

    /// Create and populate an index over the named column
    pub(crate) fn create_index(
        &mut self,
        uuid: impl Into<String>,
        name: &str,
        column_name: &str,
        index_type: IndexType,
    ) -> Result<()> {
        let column = self.column(column_name).ok_or_else(|| {
            Error::IllegalArgument(format!(
                "unknown column '{}' in table '{}'",
                column_name, self.name
            ))
        })?;
        let definition = IndexDefinition {
            uuid: uuid.into(),
            name: name.to_string(),
            table_uuid: self.uuid.clone(),
            column_uuid: column.uuid().to_string(),
            index_type,
        };
        self.attach_index(definition)
    }

    /// Create and populate an index from its stored definition
    pub(crate) fn attach_index(&mut self, definition: IndexDefinition) -> Result<()> {
        if definition.name.trim().is_empty() {
            return Err(Error::IllegalArgument("index name must not be empty".into()));
        }
        if self.has_index(&definition.name) {
            return Err(Error::Conflict(format!(
                "index '{}' already exists on table '{}'",
                definition.name, self.name
            )));
        }
        if self.column_by_uuid(&definition.column_uuid).is_none() {
            return Err(Error::IllegalArgument(format!(
                "index '{}' refers to an unknown column of table '{}'",
                definition.name, self.name
            )));
        }

        let mut index = TableIndex::new(definition);
        populate(&self.columns, &self.rows, &mut index);
        self.indices.push(index);
        Ok(())
    }

    pub(crate) fn remove_index(&mut self, name: &str) -> Result<TableIndex> {
        let position = self
            .indices
            .iter()
            .position(|i| i.name() == name)
            .ok_or_else(|| {
                Error::FileNotFound(format!("index '{}' on table '{}'", name, self.name))
            })?;
        Ok(self.indices.remove(position))
    }

    pub(crate) fn restore_index(&mut self, index: TableIndex) {
        self.indices.push(index);
    }

    pub(crate) fn rename_index(&mut self, from: &str, to: &str) -> Result<()> {
        if self.has_index(to) {
            return Err(Error::Conflict(format!(
                "index '{}' already exists on table '{}'",
                to, self.name
            )));
        }
        let index = self
            .indices
            .iter_mut()
            .find(|i| i.name() == from)
            .ok_or_else(|| Error::FileNotFound(format!("index '{}' on table '{}'", from, self.name)))?;
        index.set_name(to);
        Ok(())
    }

    /// Rebuild one index from the rows
    pub fn refresh_index(&mut self, name: &str) -> Result<()> {
        let index = self
            .indices
            .iter_mut()
            .find(|i| i.name() == name)
            .ok_or_else(|| Error::FileNotFound(format!("index '{}' on table '{}'", name, self.name)))?;
        populate(&self.columns, &self.rows, index);
        Ok(())
    }

    /// Rebuild every index from the rows
    pub fn refresh_indices(&mut self) {
        for index in self.indices.iter_mut() {
            populate(&self.columns, &self.rows, index);
        }
    }

    /// Release in-memory index entries
    pub(crate) fn close(&mut self) {
        for index in self.indices.iter_mut() {
            index.clear();
        }
    }

    // ----- descriptions -----

    pub fn index_descriptions(&self) -> Vec<IndexDescription> {
        self.indices
            .iter()
            .map(|index| IndexDescription {
                uuid: index.uuid().to_string(),
                name: index.name().to_string(),
                table: self.name.clone(),
                column: self
                    .column_by_uuid(index.column_uuid())
                    .map(|c| c.name().to_string())
                    .unwrap_or_default(),
                index_type: index.index_type(),
            })
            .collect()
    }

    pub fn describe(&self) -> TableDescription {
        TableDescription {
            uuid: self.uuid.clone(),
            name: self.name.clone(),
            columns: self
                .columns
                .iter()
                .map(|column| ColumnDescription {
                    uuid: column.uuid().to_string(),
                    name: column.name().to_string(),
                    column_type: column.column_type(),
                    length: column.length(),
                })
                .collect(),
            indices: self.index_descriptions(),
            row_count: self.rows.len(),
        }
    }
}

fn index_key(columns: &[Column], index: &TableIndex, row: &Row) -> Value {
    columns
        .iter()
        .find(|c| c.uuid() == index.column_uuid())
        .and_then(|c| row.get(c.name()))
        .cloned()
        .unwrap_or(Value::Null)
}

fn populate(columns: &[Column], rows: &BTreeMap<RowId, Row>, index: &mut TableIndex) {
    index.clear();
    for (id, row) in rows {
        let key = index_key(columns, index, row);
        index.insert(key, *id);
    }
}

fn convert_value(value: &Value, column: &Column) -> Option<Value> {
    if value.is_null() {
        return Some(Value::Null);
    }
    let input = match (column.column_type(), value) {
        (crate::ColumnType::String, Value::Array(_)) => return None,
        (crate::ColumnType::String, other) => serde_json::Value::String(other.to_string()),
        (_, other) => other.to_json(),
    };
    column.coerce(&input).ok()
}
