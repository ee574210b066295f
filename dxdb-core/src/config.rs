use crate::index::IndexType;

/// Database configuration for persistence and schema defaults
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Pretty-print JSON definition files
    pub pretty_definitions: bool,

    /// fsync every file before it replaces the previous version
    pub sync_writes: bool,

    /// Index type used when a caller does not name one
    pub default_index_type: IndexType,

    /// Longest SQL text accepted by the parsers (in bytes)
    pub max_statement_length: usize,

    /// First value handed out by a fresh sequence
    pub sequence_start: i64,

    /// Step between consecutive sequence values
    pub sequence_increment: i64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            pretty_definitions: true,
            sync_writes: true,
            default_index_type: IndexType::BPlusTree,
            max_statement_length: crate::sql::DEFAULT_MAX_STATEMENT_LENGTH,
            sequence_start: 1,
            sequence_increment: 1,
        }
    }
}

impl DatabaseConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Write compact (single-line) JSON definition files
    pub fn with_compact_definitions(mut self) -> Self {
        self.pretty_definitions = false;
        self
    }

    /// Enable or disable fsync before each file replacement
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Set the index type used when none is requested
    pub fn with_default_index_type(mut self, index_type: IndexType) -> Self {
        self.default_index_type = index_type;
        self
    }

    /// Set the maximum accepted SQL statement length
    pub fn with_max_statement_length(mut self, length: usize) -> Self {
        self.max_statement_length = length;
        self
    }

    /// Set the first value of new sequences
    pub fn with_sequence_start(mut self, start: i64) -> Self {
        self.sequence_start = start;
        self
    }

    /// Set the sequence step
    pub fn with_sequence_increment(mut self, increment: i64) -> Self {
        self.sequence_increment = increment;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.max_statement_length == 0 {
            return Err("max_statement_length must be greater than 0".to_string());
        }

        if self.sequence_increment == 0 {
            return Err("sequence_increment must not be 0".to_string());
        }

        Ok(())
    }
}
