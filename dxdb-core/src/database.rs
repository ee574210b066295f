/// The database: a catalog of tables and sequences persisted as JSON files
///
/// Layout inside the storage:
///
/// - `<name>.db` holds `{uuid, name}` and is the only file named after the
///   database; renaming the database rewrites just this file.
/// - `<uuid>_tables.def`, `<uuid>_sequences.def` and `<uuid>_indices.def`
///   hold the definitions.
/// - `<table uuid>.tbl` holds a table's rows and `<sequence uuid>.seq` a
///   sequence's counter.
///
/// Every schema or row change takes the catalog write lock, mutates memory,
/// writes the affected files and undoes the in-memory change if a write
/// fails. Writes replace whole files.
use crate::column::{Column, ColumnSpec, PRIMARY_KEY_COLUMN};
use crate::condition::Condition;
use crate::config::DatabaseConfig;
use crate::describe::{Description, IndexDescription};
use crate::error::{Error, Result};
use crate::index::{IndexDefinition, IndexType};
use crate::select::{self, ResultSet, SelectExpression, SelectOptions, SelectQuery};
use crate::sequence::{Sequence, SequenceDefinition};
use crate::sql::Connection;
use crate::storage::{read_json, write_json, DirectoryStorage, Storage};
use crate::table::{Assignment, InsertResult, Table, TableDefinition};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFINITION_SUFFIX: &str = ".db";
pub const TABLES_SUFFIX: &str = "_tables.def";
pub const SEQUENCES_SUFFIX: &str = "_sequences.def";
pub const INDICES_SUFFIX: &str = "_indices.def";

/// Root file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DatabaseDefinition {
    uuid: String,
    name: String,
}

struct Catalog {
    uuid: String,
    tables: HashMap<String, Table>,
    table_names: HashMap<String, String>,
    sequences: HashMap<String, Sequence>,
    sequence_names: HashMap<String, String>,
}

impl Catalog {
    fn new(uuid: String) -> Self {
        Self {
            uuid,
            tables: HashMap::new(),
            table_names: HashMap::new(),
            sequences: HashMap::new(),
            sequence_names: HashMap::new(),
        }
    }

    fn tables_file(&self) -> String {
        format!("{}{}", self.uuid, TABLES_SUFFIX)
    }

    fn sequences_file(&self) -> String {
        format!("{}{}", self.uuid, SEQUENCES_SUFFIX)
    }

    fn indices_file(&self) -> String {
        format!("{}{}", self.uuid, INDICES_SUFFIX)
    }

    /// Tables and sequences share one namespace
    fn name_taken(&self, name: &str) -> bool {
        self.table_names.contains_key(name) || self.sequence_names.contains_key(name)
    }

    fn ensure_free(&self, name: &str) -> Result<()> {
        if self.table_names.contains_key(name) {
            return Err(Error::Conflict(format!("table '{}' already exists", name)));
        }
        if self.sequence_names.contains_key(name) {
            return Err(Error::Conflict(format!("sequence '{}' already exists", name)));
        }
        Ok(())
    }

    fn table(&self, name: &str) -> Result<&Table> {
        self.table_names
            .get(name)
            .and_then(|uuid| self.tables.get(uuid))
            .ok_or_else(|| Error::FileNotFound(format!("table '{}'", name)))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.table_names
            .get(name)
            .and_then(|uuid| self.tables.get_mut(uuid))
            .ok_or_else(|| Error::FileNotFound(format!("table '{}'", name)))
    }

    fn sequence(&self, name: &str) -> Result<&Sequence> {
        self.sequence_names
            .get(name)
            .and_then(|uuid| self.sequences.get(uuid))
            .ok_or_else(|| Error::FileNotFound(format!("sequence '{}'", name)))
    }

    fn sequence_mut(&mut self, name: &str) -> Result<&mut Sequence> {
        self.sequence_names
            .get(name)
            .and_then(|uuid| self.sequences.get_mut(uuid))
            .ok_or_else(|| Error::FileNotFound(format!("sequence '{}'", name)))
    }

    fn add_table(&mut self, table: Table) {
        self.table_names
            .insert(table.name().to_string(), table.uuid().to_string());
        self.tables.insert(table.uuid().to_string(), table);
    }

    fn take_table(&mut self, name: &str) -> Option<Table> {
        let uuid = self.table_names.remove(name)?;
        self.tables.remove(&uuid)
    }

    fn add_sequence(&mut self, sequence: Sequence) {
        self.sequence_names
            .insert(sequence.name().to_string(), sequence.uuid().to_string());
        self.sequences.insert(sequence.uuid().to_string(), sequence);
    }

    fn take_sequence(&mut self, name: &str) -> Option<Sequence> {
        let uuid = self.sequence_names.remove(name)?;
        self.sequences.remove(&uuid)
    }

    fn sorted_tables(&self) -> Vec<&Table> {
        let mut tables: Vec<&Table> = self.tables.values().collect();
        tables.sort_by(|a, b| a.name().cmp(b.name()));
        tables
    }

    fn table_definitions(&self) -> Vec<TableDefinition> {
        self.sorted_tables().into_iter().map(Table::definition).collect()
    }

    fn sequence_definitions(&self) -> Vec<SequenceDefinition> {
        let mut definitions: Vec<SequenceDefinition> =
            self.sequences.values().map(Sequence::definition).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Index definitions are derived from the tables that own them
    fn index_definitions(&self) -> Vec<IndexDefinition> {
        self.sorted_tables()
            .into_iter()
            .flat_map(|table| table.indices().iter().map(|index| index.definition().clone()))
            .collect()
    }
}

struct Inner {
    name: String,
    catalog: Option<Catalog>,
}

/// A database stored as files in a [`Storage`]
pub struct FileSystemDatabase {
    storage: Arc<dyn Storage>,
    config: DatabaseConfig,
    inner: RwLock<Inner>,
}

fn not_initialized() -> Error {
    Error::IllegalState("database is not initialized".into())
}

fn checked_name(kind: &str, name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::IllegalArgument(format!("{} name must not be empty", kind)));
    }
    Ok(name.to_string())
}

/// Storage failures become `InternalServerError`; caller errors pass through
fn persist_error(error: Error, context: &str) -> Error {
    match error {
        Error::Io(_) | Error::Corruption(_) | Error::InternalServerError(_) => {
            error.with_context(context)
        }
        other => other,
    }
}

impl FileSystemDatabase {
    /// A database whose files live in `folder`
    pub fn new(name: &str, folder: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(name, folder, DatabaseConfig::default())
    }

    pub fn with_config(name: &str, folder: impl AsRef<Path>, config: DatabaseConfig) -> Result<Self> {
        let storage = DirectoryStorage::new(folder).with_sync(config.sync_writes);
        Self::with_storage(name, Arc::new(storage), config)
    }

    pub fn with_storage(name: &str, storage: Arc<dyn Storage>, config: DatabaseConfig) -> Result<Self> {
        config.validate().map_err(Error::IllegalArgument)?;
        let name = checked_name("database", name)?;
        Ok(Self {
            storage,
            config,
            inner: RwLock::new(Inner { name, catalog: None }),
        })
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    fn root_file(name: &str) -> String {
        format!("{}{}", name, DEFINITION_SUFFIX)
    }

    fn with_catalog<T>(&self, f: impl FnOnce(&Catalog) -> Result<T>) -> Result<T> {
        let inner = self.inner.read();
        let catalog = inner.catalog.as_ref().ok_or_else(not_initialized)?;
        f(catalog)
    }

    fn with_catalog_mut<T>(&self, f: impl FnOnce(&mut Catalog) -> Result<T>) -> Result<T> {
        let mut inner = self.inner.write();
        let catalog = inner.catalog.as_mut().ok_or_else(not_initialized)?;
        f(catalog)
    }

    fn write_tables(&self, catalog: &Catalog) -> Result<()> {
        write_json(
            self.storage.as_ref(),
            &catalog.tables_file(),
            &catalog.table_definitions(),
            self.config.pretty_definitions,
        )
    }

    fn write_sequences(&self, catalog: &Catalog) -> Result<()> {
        write_json(
            self.storage.as_ref(),
            &catalog.sequences_file(),
            &catalog.sequence_definitions(),
            self.config.pretty_definitions,
        )
    }

    fn write_indices(&self, catalog: &Catalog) -> Result<()> {
        write_json(
            self.storage.as_ref(),
            &catalog.indices_file(),
            &catalog.index_definitions(),
            self.config.pretty_definitions,
        )
    }

    fn write_schema(&self, catalog: &Catalog) -> Result<()> {
        self.write_tables(catalog)?;
        self.write_indices(catalog)
    }

    fn write_rows(&self, table: &Table) -> Result<()> {
        let data = table.encode_rows(false)?;
        self.storage.write(&table.data_file(), &data)
    }

    /// Rewrite the schema files after an undo; failures are only logged
    fn compensate(&self, catalog: &Catalog) {
        if let Err(e) = self.write_schema(catalog) {
            warn!("Failed to restore definition files after a rollback: {}", e);
        }
    }

    // ----- lifecycle -----

    /// Write the root file of a brand-new database
    pub fn create(&self) -> Result<()> {
        let inner = self.inner.write();
        let root = Self::root_file(&inner.name);
        if self.storage.exists(&root)? {
            return Err(Error::Conflict(format!("database '{}' already exists", inner.name)));
        }

        let definition = DatabaseDefinition {
            uuid: Uuid::new_v4().to_string(),
            name: inner.name.clone(),
        };
        write_json(self.storage.as_ref(), &root, &definition, self.config.pretty_definitions)
            .map_err(|e| persist_error(e, "create database"))?;

        info!(
            "Created database {} ({}) in {}",
            definition.name,
            definition.uuid,
            self.storage.location()
        );
        Ok(())
    }

    /// Load the catalog; calling it again once loaded does nothing
    pub fn init(&self) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.catalog.is_some() {
            return Ok(());
        }

        let root = Self::root_file(&inner.name);
        let definition: DatabaseDefinition = read_json(self.storage.as_ref(), &root)?
            .ok_or_else(|| Error::FileNotFound(format!("database '{}'", inner.name)))?;

        let mut catalog = Catalog::new(definition.uuid);
        self.load_tables(&mut catalog)?;
        self.load_sequences(&mut catalog)?;
        self.load_indices(&mut catalog)?;

        info!(
            "Opened database {} with {} tables and {} sequences",
            inner.name,
            catalog.tables.len(),
            catalog.sequences.len()
        );
        inner.catalog = Some(catalog);
        Ok(())
    }

    fn load_tables(&self, catalog: &mut Catalog) -> Result<()> {
        let definitions: Vec<TableDefinition> =
            read_json(self.storage.as_ref(), &catalog.tables_file())?.unwrap_or_default();

        for definition in definitions {
            if catalog.name_taken(&definition.name) {
                return Err(Error::Corruption(format!(
                    "name '{}' is defined twice",
                    definition.name
                )));
            }
            let mut table = Table::from_definition(&definition)?;
            if let Some(data) = self.storage.read(&table.data_file())? {
                table.load_rows(&data)?;
            }
            debug!("Loaded table {} with {} rows", table.name(), table.len());
            catalog.add_table(table);
        }
        Ok(())
    }

    fn load_sequences(&self, catalog: &mut Catalog) -> Result<()> {
        let definitions: Vec<SequenceDefinition> =
            read_json(self.storage.as_ref(), &catalog.sequences_file())?.unwrap_or_default();

        for definition in definitions {
            if catalog.name_taken(&definition.name) {
                return Err(Error::Corruption(format!(
                    "name '{}' is defined twice",
                    definition.name
                )));
            }
            let mut sequence = Sequence::from_definition(
                &definition,
                self.config.sequence_start,
                self.config.sequence_increment,
            );
            sequence.init(self.storage.as_ref())?;
            catalog.add_sequence(sequence);
        }
        Ok(())
    }

    fn load_indices(&self, catalog: &mut Catalog) -> Result<()> {
        let definitions: Vec<IndexDefinition> =
            read_json(self.storage.as_ref(), &catalog.indices_file())?.unwrap_or_default();

        for definition in definitions {
            match catalog.tables.get_mut(&definition.table_uuid) {
                Some(table) => table.attach_index(definition)?,
                None => warn!(
                    "Skipping index {} of unknown table {}",
                    definition.name, definition.table_uuid
                ),
            }
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.read().catalog.is_some()
    }

    /// Drop the in-memory catalog; `init` loads it again
    pub fn close(&self) {
        let mut inner = self.inner.write();
        if let Some(mut catalog) = inner.catalog.take() {
            for table in catalog.tables.values_mut() {
                table.close();
            }
            info!("Closed database {}", inner.name);
        }
    }

    pub fn uuid(&self) -> Result<String> {
        self.with_catalog(|catalog| Ok(catalog.uuid.clone()))
    }

    pub fn name(&self) -> String {
        self.inner.read().name.clone()
    }

    /// Rename the database by moving its root file
    pub fn set_name(&self, name: &str) -> Result<()> {
        let name = checked_name("database", name)?;
        let mut inner = self.inner.write();
        let uuid = inner.catalog.as_ref().ok_or_else(not_initialized)?.uuid.clone();
        if name == inner.name {
            return Ok(());
        }

        let target = Self::root_file(&name);
        if self.storage.exists(&target)? {
            return Err(Error::Conflict(format!("database '{}' already exists", name)));
        }
        let definition = DatabaseDefinition {
            uuid,
            name: name.clone(),
        };
        write_json(self.storage.as_ref(), &target, &definition, self.config.pretty_definitions)
            .map_err(|e| persist_error(e, "rename database"))?;

        if let Err(e) = self.storage.remove(&Self::root_file(&inner.name)) {
            if let Err(undo) = self.storage.remove(&target) {
                warn!("Failed to remove {} after a failed rename: {}", target, undo);
            }
            return Err(persist_error(e, "rename database"));
        }

        info!("Renamed database {} to {}", inner.name, name);
        inner.name = name;
        Ok(())
    }

    // ----- existence -----

    pub fn has_table(&self, name: &str) -> Result<bool> {
        self.with_catalog(|catalog| Ok(catalog.table_names.contains_key(name)))
    }

    pub fn has_sequence(&self, name: &str) -> Result<bool> {
        self.with_catalog(|catalog| Ok(catalog.sequence_names.contains_key(name)))
    }

    pub fn has_index(&self, table: &str, index: &str) -> Result<bool> {
        self.with_catalog(|catalog| {
            Ok(catalog
                .table(table)
                .map(|t| t.has_index(index))
                .unwrap_or(false))
        })
    }

    // ----- create -----

    /// Create a table; it always gets a `_uuid` column and a hash index on it
    ///
    /// The table and its index are created together: if the index cannot be
    /// persisted the table is removed again.
    pub fn create_table(&self, name: &str, columns: &[ColumnSpec]) -> Result<()> {
        let name = checked_name("table", name)?;
        let mut built = vec![Column::primary_key()];
        for spec in columns {
            if spec.name.trim() == PRIMARY_KEY_COLUMN {
                continue;
            }
            built.push(spec.to_column()?);
        }
        let mut table = Table::new(Uuid::new_v4().to_string(), name.clone(), built)?;
        table.create_index(
            Uuid::new_v4().to_string(),
            &format!("index_{}_uuid", name),
            PRIMARY_KEY_COLUMN,
            IndexType::Hash,
        )?;

        self.with_catalog_mut(|catalog| {
            catalog.ensure_free(&name)?;
            catalog.add_table(table);

            if let Err(e) = self.write_tables(catalog) {
                catalog.take_table(&name);
                return Err(persist_error(e, &format!("create table '{}'", name)));
            }
            if let Err(e) = self.write_indices(catalog) {
                catalog.take_table(&name);
                self.compensate(catalog);
                return Err(persist_error(e, &format!("create table '{}'", name)));
            }

            info!("Created table {}", name);
            Ok(())
        })
    }

    pub fn create_sequence(&self, name: &str) -> Result<()> {
        let name = checked_name("sequence", name)?;
        let sequence = Sequence::new(
            Uuid::new_v4().to_string(),
            name.clone(),
            self.config.sequence_start,
            self.config.sequence_increment,
        );

        self.with_catalog_mut(|catalog| {
            catalog.ensure_free(&name)?;
            catalog.add_sequence(sequence);

            if let Err(e) = self.write_sequences(catalog) {
                catalog.take_sequence(&name);
                return Err(persist_error(e, &format!("create sequence '{}'", name)));
            }

            info!("Created sequence {}", name);
            Ok(())
        })
    }

    /// Create and build an index; without a type the configured default is used
    pub fn create_index(
        &self,
        table: &str,
        index: &str,
        column: &str,
        index_type: Option<IndexType>,
    ) -> Result<()> {
        let index = checked_name("index", index)?;
        let index_type = index_type.unwrap_or(self.config.default_index_type);

        self.with_catalog_mut(|catalog| {
            catalog
                .table_mut(table)?
                .create_index(Uuid::new_v4().to_string(), &index, column, index_type)?;

            if let Err(e) = self.write_indices(catalog) {
                if let Ok(owner) = catalog.table_mut(table) {
                    if let Err(undo) = owner.remove_index(&index) {
                        warn!("Failed to drop index {} after a failed write: {}", index, undo);
                    }
                }
                return Err(persist_error(e, &format!("create index '{}'", index)));
            }

            info!("Created {} index {} on {}.{}", index_type, index, table, column);
            Ok(())
        })
    }

    // ----- delete -----

    /// Remove a table, its indices and its data file
    pub fn delete_table(&self, name: &str) -> Result<()> {
        self.with_catalog_mut(|catalog| {
            let mut table = catalog
                .take_table(name)
                .ok_or_else(|| Error::FileNotFound(format!("table '{}'", name)))?;

            if let Err(e) = self.write_tables(catalog) {
                catalog.add_table(table);
                return Err(persist_error(e, &format!("delete table '{}'", name)));
            }
            if let Err(e) = self.write_indices(catalog) {
                catalog.add_table(table);
                self.compensate(catalog);
                return Err(persist_error(e, &format!("delete table '{}'", name)));
            }

            table.close();
            if let Err(e) = self.storage.remove(&table.data_file()) {
                warn!("Failed to remove data file of table {}: {}", name, e);
            }
            info!("Deleted table {}", name);
            Ok(())
        })
    }

    pub fn delete_sequence(&self, name: &str) -> Result<()> {
        self.with_catalog_mut(|catalog| {
            let sequence = catalog
                .take_sequence(name)
                .ok_or_else(|| Error::FileNotFound(format!("sequence '{}'", name)))?;

            if let Err(e) = self.write_sequences(catalog) {
                catalog.add_sequence(sequence);
                return Err(persist_error(e, &format!("delete sequence '{}'", name)));
            }

            if let Err(e) = self.storage.remove(&sequence.counter_file()) {
                warn!("Failed to remove counter file of sequence {}: {}", name, e);
            }
            info!("Deleted sequence {}", name);
            Ok(())
        })
    }

    pub fn delete_index(&self, table: &str, index: &str) -> Result<()> {
        self.with_catalog_mut(|catalog| {
            let removed = catalog.table_mut(table)?.remove_index(index)?;

            if let Err(e) = self.write_indices(catalog) {
                if let Ok(owner) = catalog.table_mut(table) {
                    owner.restore_index(removed);
                }
                return Err(persist_error(e, &format!("delete index '{}'", index)));
            }

            info!("Deleted index {} of {}", index, table);
            Ok(())
        })
    }

    // ----- rename -----

    pub fn rename_table(&self, from: &str, to: &str) -> Result<()> {
        let to = checked_name("table", to)?;
        self.with_catalog_mut(|catalog| {
            catalog.ensure_free(&to)?;
            let mut table = catalog
                .take_table(from)
                .ok_or_else(|| Error::FileNotFound(format!("table '{}'", from)))?;
            table.set_name(to.clone());
            catalog.add_table(table);

            if let Err(e) = self.write_tables(catalog) {
                if let Some(mut table) = catalog.take_table(&to) {
                    table.set_name(from);
                    catalog.add_table(table);
                }
                return Err(persist_error(e, &format!("rename table '{}'", from)));
            }

            info!("Renamed table {} to {}", from, to);
            Ok(())
        })
    }

    pub fn rename_sequence(&self, from: &str, to: &str) -> Result<()> {
        let to = checked_name("sequence", to)?;
        self.with_catalog_mut(|catalog| {
            catalog.ensure_free(&to)?;
            let mut sequence = catalog
                .take_sequence(from)
                .ok_or_else(|| Error::FileNotFound(format!("sequence '{}'", from)))?;
            sequence.set_name(to.clone());
            catalog.add_sequence(sequence);

            if let Err(e) = self.write_sequences(catalog) {
                if let Some(mut sequence) = catalog.take_sequence(&to) {
                    sequence.set_name(from);
                    catalog.add_sequence(sequence);
                }
                return Err(persist_error(e, &format!("rename sequence '{}'", from)));
            }

            info!("Renamed sequence {} to {}", from, to);
            Ok(())
        })
    }

    pub fn rename_index(&self, table: &str, from: &str, to: &str) -> Result<()> {
        let to = checked_name("index", to)?;
        self.with_catalog_mut(|catalog| {
            catalog.table_mut(table)?.rename_index(from, &to)?;

            if let Err(e) = self.write_indices(catalog) {
                if let Ok(owner) = catalog.table_mut(table) {
                    if let Err(undo) = owner.rename_index(&to, from) {
                        warn!("Failed to restore index name {} on {}: {}", from, table, undo);
                    }
                }
                return Err(persist_error(e, &format!("rename index '{}'", from)));
            }

            info!("Renamed index {} of {} to {}", from, table, to);
            Ok(())
        })
    }

    // ----- alter -----

    /// Apply a schema change to one table and persist it
    ///
    /// `change` returns how many items it applied. On any failure the table
    /// is restored from a snapshot.
    fn alter_table<F>(&self, name: &str, rewrite_rows: bool, change: F) -> Result<()>
    where
        F: FnOnce(&mut Table) -> Result<usize>,
    {
        self.with_catalog_mut(|catalog| {
            let table = catalog.table_mut(name)?;
            let snapshot = table.clone();

            let applied = match change(table) {
                Ok(applied) => applied,
                Err(e) => {
                    *table = snapshot;
                    return Err(e);
                }
            };
            if applied == 0 {
                return Ok(());
            }

            let persisted = self.write_schema(catalog).and_then(|_| {
                if rewrite_rows {
                    self.write_rows(catalog.table(name)?)
                } else {
                    Ok(())
                }
            });
            if let Err(e) = persisted {
                catalog.add_table(snapshot);
                self.compensate(catalog);
                return Err(persist_error(e, &format!("alter table '{}'", name)));
            }

            info!("Altered table {} ({} changes)", name, applied);
            Ok(())
        })
    }

    /// Add columns; specs that do not resolve or collide are skipped
    pub fn alter_table_add_columns(&self, table: &str, columns: &[ColumnSpec]) -> Result<()> {
        let mut built = Vec::with_capacity(columns.len());
        for spec in columns {
            match spec.to_column() {
                Ok(column) => built.push(column),
                Err(e) => warn!("Skipping column {} of {}: {}", spec.name, table, e),
            }
        }

        self.alter_table(table, false, |t| {
            let mut applied = 0;
            for column in built {
                let column_name = column.name().to_string();
                match t.add_column(column) {
                    Ok(()) => applied += 1,
                    Err(e) => warn!("Skipping column {} of {}: {}", column_name, table, e),
                }
            }
            Ok(applied)
        })
    }

    /// Change column types; specs that do not apply are skipped
    pub fn alter_table_alter_columns(&self, table: &str, columns: &[ColumnSpec]) -> Result<()> {
        self.alter_table(table, true, |t| {
            let mut applied = 0;
            for spec in columns {
                match t.alter_column(spec) {
                    Ok(()) => applied += 1,
                    Err(e) => warn!("Skipping column {} of {}: {}", spec.name, table, e),
                }
            }
            Ok(applied)
        })
    }

    /// Drop columns and the indices over them; all or nothing
    pub fn alter_table_drop_columns(&self, table: &str, columns: &[String]) -> Result<()> {
        self.alter_table(table, false, |t| {
            for column in columns {
                t.drop_column(column)?;
            }
            Ok(columns.len())
        })
    }

    /// Rename columns; all or nothing
    pub fn alter_table_rename_columns(&self, table: &str, renames: &[(String, String)]) -> Result<()> {
        self.alter_table(table, false, |t| {
            for (from, to) in renames {
                t.rename_column(from, to.trim())?;
            }
            Ok(renames.len())
        })
    }

    // ----- queries -----

    pub fn select(&self, query: &SelectQuery) -> Result<ResultSet> {
        if query.selects_all_columns() {
            self.select_all(&query.table, query.condition.as_ref(), &query.options)
        } else {
            self.select_slice(
                &query.table,
                &query.expressions,
                query.condition.as_ref(),
                &query.options,
            )
        }
    }

    pub fn select_all(
        &self,
        table: &str,
        condition: Option<&Condition>,
        options: &SelectOptions,
    ) -> Result<ResultSet> {
        self.with_catalog(|catalog| select::select_all(catalog.table(table)?, condition, options))
    }

    /// Every column of the rows matching a condition
    pub fn select_subset(&self, table: &str, condition: &Condition) -> Result<ResultSet> {
        self.select_all(table, Some(condition), &SelectOptions::default())
    }

    pub fn select_slice(
        &self,
        table: &str,
        expressions: &[SelectExpression],
        condition: Option<&Condition>,
        options: &SelectOptions,
    ) -> Result<ResultSet> {
        self.with_catalog(|catalog| {
            select::select_slice(catalog.table(table)?, expressions, condition, options)
        })
    }

    pub fn count(&self, table: &str, condition: Option<&Condition>) -> Result<usize> {
        self.with_catalog(|catalog| Ok(catalog.table(table)?.matching_rows(condition)?.len()))
    }

    // ----- rows -----

    pub fn insert_one(&self, table: &str, object: &Map<String, Json>) -> Result<InsertResult> {
        self.insert_many(table, std::slice::from_ref(object))
    }

    /// Insert rows; either all of them are stored or none
    pub fn insert_many(&self, table: &str, objects: &[Map<String, Json>]) -> Result<InsertResult> {
        self.with_catalog_mut(|catalog| {
            let target = catalog.table_mut(table)?;
            let outcome = target.insert_rows(objects)?;

            if let Err(e) = self.write_rows(target) {
                target.remove_rows(&outcome.row_ids);
                return Err(persist_error(e, &format!("insert into '{}'", table)));
            }

            debug!("Inserted {} rows into {}", outcome.result.n_inserted, table);
            Ok(outcome.result)
        })
    }

    /// Apply assignments to the matching rows, returning how many changed
    pub fn update(
        &self,
        table: &str,
        assignments: &[Assignment],
        condition: Option<&Condition>,
    ) -> Result<usize> {
        self.with_catalog_mut(|catalog| {
            let target = catalog.table_mut(table)?;
            let previous = target.update_matching(assignments, condition)?;
            if previous.is_empty() {
                return Ok(0);
            }

            let updated = previous.len();
            if let Err(e) = self.write_rows(target) {
                target.restore_rows(previous);
                return Err(persist_error(e, &format!("update '{}'", table)));
            }

            debug!("Updated {} rows of {}", updated, table);
            Ok(updated)
        })
    }

    /// Remove the matching rows, returning how many were removed
    pub fn delete_from(&self, table: &str, condition: Option<&Condition>) -> Result<usize> {
        self.with_catalog_mut(|catalog| {
            let target = catalog.table_mut(table)?;
            let removed = target.delete_matching(condition)?;
            if removed.is_empty() {
                return Ok(0);
            }

            let count = removed.len();
            if let Err(e) = self.write_rows(target) {
                target.restore_rows(removed);
                return Err(persist_error(e, &format!("delete from '{}'", table)));
            }

            debug!("Deleted {} rows from {}", count, table);
            Ok(count)
        })
    }

    // ----- metadata -----

    pub fn desc(&self, name: &str) -> Result<Description> {
        self.with_catalog(|catalog| {
            if let Ok(table) = catalog.table(name) {
                return Ok(Description::Table(table.describe()));
            }
            if let Ok(sequence) = catalog.sequence(name) {
                return Ok(Description::Sequence(sequence.describe()));
            }
            Err(Error::FileNotFound(format!("table or sequence '{}'", name)))
        })
    }

    pub fn next_value(&self, sequence: &str) -> Result<i64> {
        self.with_catalog_mut(|catalog| {
            catalog
                .sequence_mut(sequence)?
                .next_value(self.storage.as_ref())
                .map_err(|e| persist_error(e, &format!("next value of '{}'", sequence)))
        })
    }

    pub fn list_tables(&self) -> Result<Vec<String>> {
        self.with_catalog(|catalog| {
            let mut names: Vec<String> = catalog.table_names.keys().cloned().collect();
            names.sort();
            Ok(names)
        })
    }

    pub fn list_sequences(&self) -> Result<Vec<String>> {
        self.with_catalog(|catalog| {
            let mut names: Vec<String> = catalog.sequence_names.keys().cloned().collect();
            names.sort();
            Ok(names)
        })
    }

    /// Indices of one table, or of every table
    pub fn list_indices(&self, table: Option<&str>) -> Result<Vec<IndexDescription>> {
        self.with_catalog(|catalog| match table {
            Some(name) => Ok(catalog.table(name)?.index_descriptions()),
            None => Ok(catalog
                .sorted_tables()
                .into_iter()
                .flat_map(Table::index_descriptions)
                .collect()),
        })
    }

    /// The table owning an index name; `Conflict` when several tables have one
    pub fn find_index_table(&self, index: &str) -> Result<String> {
        self.with_catalog(|catalog| {
            let owners: Vec<&str> = catalog
                .sorted_tables()
                .into_iter()
                .filter(|table| table.has_index(index))
                .map(|table| table.name())
                .collect();
            match owners.as_slice() {
                [] => Err(Error::FileNotFound(format!("index '{}'", index))),
                [owner] => Ok(owner.to_string()),
                _ => Err(Error::Conflict(format!(
                    "index '{}' exists on tables {}; qualify it with a table name",
                    index,
                    owners.join(", ")
                ))),
            }
        })
    }

    pub fn refresh_index(&self, table: &str, index: &str) -> Result<()> {
        self.with_catalog_mut(|catalog| catalog.table_mut(table)?.refresh_index(index))
    }

    pub fn refresh_indices(&self, table: &str) -> Result<()> {
        self.with_catalog_mut(|catalog| {
            catalog.table_mut(table)?.refresh_indices();
            Ok(())
        })
    }
}

impl Connection for FileSystemDatabase {
    fn create_table(&self, table: &str, columns: &[ColumnSpec]) -> Result<()> {
        FileSystemDatabase::create_table(self, table, columns)
    }

    fn create_sequence(&self, sequence: &str) -> Result<()> {
        FileSystemDatabase::create_sequence(self, sequence)
    }

    fn create_index(
        &self,
        table: &str,
        index: &str,
        column: &str,
        index_type: Option<IndexType>,
    ) -> Result<()> {
        FileSystemDatabase::create_index(self, table, index, column, index_type)
    }

    fn delete_table(&self, table: &str) -> Result<()> {
        FileSystemDatabase::delete_table(self, table)
    }

    fn delete_sequence(&self, sequence: &str) -> Result<()> {
        FileSystemDatabase::delete_sequence(self, sequence)
    }

    fn delete_index(&self, table: &str, index: &str) -> Result<()> {
        FileSystemDatabase::delete_index(self, table, index)
    }

    fn rename_table(&self, from: &str, to: &str) -> Result<()> {
        FileSystemDatabase::rename_table(self, from, to)
    }

    fn rename_sequence(&self, from: &str, to: &str) -> Result<()> {
        FileSystemDatabase::rename_sequence(self, from, to)
    }

    fn rename_index(&self, table: &str, from: &str, to: &str) -> Result<()> {
        FileSystemDatabase::rename_index(self, table, from, to)
    }

    fn alter_table_add_columns(&self, table: &str, columns: &[ColumnSpec]) -> Result<()> {
        FileSystemDatabase::alter_table_add_columns(self, table, columns)
    }

    fn alter_table_alter_columns(&self, table: &str, columns: &[ColumnSpec]) -> Result<()> {
        FileSystemDatabase::alter_table_alter_columns(self, table, columns)
    }

    fn alter_table_drop_columns(&self, table: &str, columns: &[String]) -> Result<()> {
        FileSystemDatabase::alter_table_drop_columns(self, table, columns)
    }

    fn alter_table_rename_columns(&self, table: &str, renames: &[(String, String)]) -> Result<()> {
        FileSystemDatabase::alter_table_rename_columns(self, table, renames)
    }

    fn select_query(&self, query: &SelectQuery) -> Result<ResultSet> {
        self.select(query)
    }

    fn insert_objects(&self, table: &str, objects: Vec<Map<String, Json>>) -> Result<InsertResult> {
        self.insert_many(table, &objects)
    }

    fn update_rows(
        &self,
        table: &str,
        assignments: &[Assignment],
        condition: Option<&Condition>,
    ) -> Result<usize> {
        self.update(table, assignments, condition)
    }

    fn delete_rows(&self, table: &str, condition: Option<&Condition>) -> Result<usize> {
        self.delete_from(table, condition)
    }

    fn desc(&self, name: &str) -> Result<Description> {
        FileSystemDatabase::desc(self, name)
    }

    fn next_value(&self, sequence: &str) -> Result<i64> {
        FileSystemDatabase::next_value(self, sequence)
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        FileSystemDatabase::list_tables(self)
    }

    fn list_sequences(&self) -> Result<Vec<String>> {
        FileSystemDatabase::list_sequences(self)
    }

    fn list_indices(&self, table: Option<&str>) -> Result<Vec<IndexDescription>> {
        FileSystemDatabase::list_indices(self, table)
    }

    fn find_index_table(&self, index: &str) -> Result<String> {
        FileSystemDatabase::find_index_table(self, index)
    }
}
