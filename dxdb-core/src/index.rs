/// Secondary indices over a single column
///
/// A hash index answers equality and IN probes. A b+tree index keeps keys
/// ordered and also answers range probes. Both map a key to the set of row
/// ids holding it; the table rechecks every candidate against the full
/// condition, so an index only ever narrows a scan.
use crate::error::{Error, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::ops::Bound;

/// Row identifier, assigned in insertion order
pub type RowId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IndexType {
    #[serde(rename = "hash")]
    Hash,
    #[default]
    #[serde(rename = "b+tree")]
    BPlusTree,
}

impl IndexType {
    pub fn parse(name: &str) -> Result<IndexType> {
        match name.trim().to_lowercase().as_str() {
            "hash" => Ok(IndexType::Hash),
            "b+tree" | "btree" | "b-tree" | "bplustree" | "bptree" => Ok(IndexType::BPlusTree),
            other => Err(Error::IllegalArgument(format!("unknown index type '{}'", other))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IndexType::Hash => "hash",
            IndexType::BPlusTree => "b+tree",
        }
    }

    pub fn supports_range(self) -> bool {
        matches!(self, IndexType::BPlusTree)
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-disk form of an index inside the indices definition file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub uuid: String,
    pub name: String,
    #[serde(rename = "tableUUID")]
    pub table_uuid: String,
    #[serde(rename = "columnUUID")]
    pub column_uuid: String,
    #[serde(rename = "type", default)]
    pub index_type: IndexType,
}

/// Probe an index can answer
#[derive(Debug, Clone, PartialEq)]
pub enum IndexLookup {
    /// Rows whose key equals any of the values
    Equal(Vec<Value>),
    /// Rows whose key falls inside the bounds
    Range { lower: Bound<Value>, upper: Bound<Value> },
}

impl IndexLookup {
    pub fn is_equality(&self) -> bool {
        matches!(self, IndexLookup::Equal(_))
    }
}

#[derive(Debug, Clone)]
enum Entries {
    Hash(HashMap<Value, BTreeSet<RowId>>),
    Ordered(BTreeMap<Value, BTreeSet<RowId>>),
}

/// In-memory index over one column of one table
#[derive(Debug, Clone)]
pub struct TableIndex {
    definition: IndexDefinition,
    entries: Entries,
}

impl TableIndex {
    pub fn new(definition: IndexDefinition) -> Self {
        let entries = match definition.index_type {
            IndexType::Hash => Entries::Hash(HashMap::new()),
            IndexType::BPlusTree => Entries::Ordered(BTreeMap::new()),
        };
        Self {
            definition,
            entries,
        }
    }

    pub fn uuid(&self) -> &str {
        &self.definition.uuid
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn table_uuid(&self) -> &str {
        &self.definition.table_uuid
    }

    pub fn column_uuid(&self) -> &str {
        &self.definition.column_uuid
    }

    pub fn index_type(&self) -> IndexType {
        self.definition.index_type
    }

    pub fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.definition.name = name.into();
    }

    /// Number of distinct keys
    pub fn key_count(&self) -> usize {
        match &self.entries {
            Entries::Hash(map) => map.len(),
            Entries::Ordered(map) => map.len(),
        }
    }

    pub(crate) fn insert(&mut self, key: Value, row: RowId) {
        match &mut self.entries {
            Entries::Hash(map) => {
                map.entry(key).or_default().insert(row);
            }
            Entries::Ordered(map) => {
                map.entry(key).or_default().insert(row);
            }
        }
    }

    pub(crate) fn remove(&mut self, key: &Value, row: RowId) {
        let emptied = match &mut self.entries {
            Entries::Hash(map) => map.get_mut(key).map(|rows| {
                rows.remove(&row);
                rows.is_empty()
            }),
            Entries::Ordered(map) => map.get_mut(key).map(|rows| {
                rows.remove(&row);
                rows.is_empty()
            }),
        };
        if emptied == Some(true) {
            match &mut self.entries {
                Entries::Hash(map) => {
                    map.remove(key);
                }
                Entries::Ordered(map) => {
                    map.remove(key);
                }
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        match &mut self.entries {
            Entries::Hash(map) => map.clear(),
            Entries::Ordered(map) => map.clear(),
        }
    }

    /// Rows matching the probe, or None when this index cannot answer it
    pub fn lookup(&self, probe: &IndexLookup) -> Option<BTreeSet<RowId>> {
        match (&self.entries, probe) {
            (Entries::Hash(map), IndexLookup::Equal(keys)) => Some(
                keys.iter()
                    .filter_map(|key| map.get(key))
                    .flatten()
                    .copied()
                    .collect(),
            ),
            (Entries::Ordered(map), IndexLookup::Equal(keys)) => Some(
                keys.iter()
                    .filter_map(|key| map.get(key))
                    .flatten()
                    .copied()
                    .collect(),
            ),
            (Entries::Ordered(map), IndexLookup::Range { lower, upper }) => {
                if range_is_empty(lower, upper) {
                    return Some(BTreeSet::new());
                }
                Some(
                    map.range((lower.clone(), upper.clone()))
                        .flat_map(|(_, rows)| rows.iter().copied())
                        .collect(),
                )
            }
            (Entries::Hash(_), IndexLookup::Range { .. }) => None,
        }
    }
}

// BTreeMap::range panics on inverted bounds
fn range_is_empty(lower: &Bound<Value>, upper: &Bound<Value>) -> bool {
    let (low, low_inclusive) = match lower {
        Bound::Included(v) => (v, true),
        Bound::Excluded(v) => (v, false),
        Bound::Unbounded => return false,
    };
    let (high, high_inclusive) = match upper {
        Bound::Included(v) => (v, true),
        Bound::Excluded(v) => (v, false),
        Bound::Unbounded => return false,
    };
    low > high || (low == high && !(low_inclusive && high_inclusive))
}
