/// Persistent monotonic counters
///
/// The counter file holds the last value handed out. A new value is
/// written before it is returned, so a reopened database never repeats one.
use crate::describe::SequenceDescription;
use crate::error::{Error, Result};
use crate::storage::{read_json, write_json, Storage};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// On-disk form of a sequence inside the sequences definition file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceDefinition {
    pub uuid: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CounterState {
    value: i64,
}

#[derive(Debug, Clone)]
pub struct Sequence {
    uuid: String,
    name: String,
    start: i64,
    increment: i64,
    current: Option<i64>,
}

impl Sequence {
    pub fn new(uuid: impl Into<String>, name: impl Into<String>, start: i64, increment: i64) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            start,
            increment,
            current: None,
        }
    }

    pub fn from_definition(definition: &SequenceDefinition, start: i64, increment: i64) -> Self {
        Self::new(definition.uuid.clone(), definition.name.clone(), start, increment)
    }

    pub fn definition(&self) -> SequenceDefinition {
        SequenceDefinition {
            uuid: self.uuid.clone(),
            name: self.name.clone(),
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

    /// Last value handed out, if any
    pub fn current(&self) -> Option<i64> {
        self.current
    }

    pub fn counter_file(&self) -> String {
        format!("{}.seq", self.uuid)
    }

    /// Load the counter; a missing counter file means the sequence is unused
    pub fn init(&mut self, storage: &dyn Storage) -> Result<()> {
        let state: Option<CounterState> = read_json(storage, &self.counter_file())?;
        self.current = state.map(|s| s.value);
        Ok(())
    }

    /// Persist and return the next value
    pub fn next_value(&mut self, storage: &dyn Storage) -> Result<i64> {
        let next = match self.current {
            None => self.start,
            Some(current) => current.checked_add(self.increment).ok_or_else(|| {
                Error::IllegalState(format!("sequence '{}' is exhausted", self.name))
            })?,
        };

        write_json(storage, &self.counter_file(), &CounterState { value: next }, false)?;
        self.current = Some(next);

        trace!("Sequence {} advanced to {}", self.name, next);
        Ok(next)
    }

    pub fn describe(&self) -> SequenceDescription {
        SequenceDescription {
            uuid: self.uuid.clone(),
            name: self.name.clone(),
            current_value: self.current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_values_are_monotonic() {
        let storage = MemoryStorage::new();
        let mut sequence = Sequence::new("s1", "ids", 1, 1);
        assert_eq!(sequence.next_value(&storage).unwrap(), 1);
        assert_eq!(sequence.next_value(&storage).unwrap(), 2);
        assert_eq!(sequence.current(), Some(2));
    }

    #[test]
    fn test_counter_survives_reload() {
        let storage = MemoryStorage::new();
        let mut sequence = Sequence::new("s1", "ids", 10, 5);
        sequence.next_value(&storage).unwrap();
        sequence.next_value(&storage).unwrap();

        let mut reloaded = Sequence::new("s1", "ids", 10, 5);
        reloaded.init(&storage).unwrap();
        assert_eq!(reloaded.current(), Some(15));
        assert_eq!(reloaded.next_value(&storage).unwrap(), 20);
    }

    #[test]
    fn test_counter_file_format() {
        let storage = MemoryStorage::new();
        let mut sequence = Sequence::new("s1", "ids", 1, 1);
        sequence.next_value(&storage).unwrap();
        let data = storage.read("s1.seq").unwrap().unwrap();
        assert_eq!(String::from_utf8(data).unwrap(), r#"{"value":1}"#);
    }

    #[test]
    fn test_exhaustion_is_illegal_state() {
        let storage = MemoryStorage::new();
        let mut sequence = Sequence::new("s1", "ids", i64::MAX, 1);
        sequence.next_value(&storage).unwrap();
        assert!(matches!(
            sequence.next_value(&storage),
            Err(Error::IllegalState(_))
        ));
    }
}
