//! dxdb core: a small embedded relational database
//!
//! Tables with typed columns, hash and ordered secondary indices and
//! persistent sequences, stored as JSON definition and data files. Queries
//! are built from [`Condition`] and [`SelectExpression`] values or parsed
//! from SQL text by the parsers in [`sql`].

pub mod column;
pub mod column_type;
pub mod condition;
pub mod config;
pub mod database;
pub mod describe;
pub mod error;
pub mod index;
pub mod select;
pub mod sequence;
pub mod sql;
pub mod storage;
pub mod table;
pub mod value;

pub use column::{Column, ColumnSpec, PRIMARY_KEY_COLUMN};
pub use column_type::ColumnType;
pub use condition::{CompareOp, Condition};
pub use config::DatabaseConfig;
pub use database::FileSystemDatabase;
pub use describe::{
    ColumnDescription, Description, IndexDescription, SequenceDescription, TableDescription,
};
pub use error::{Error, Result};
pub use index::{IndexType, RowId};
pub use select::{
    AggregateFunction, OrderBy, ResultSet, ScalarFunction, SelectExpression, SelectOptions,
    SelectQuery,
};
pub use sequence::Sequence;
pub use sql::{
    Connection, QueryResult, SqlConditionParser, SqlQuery, SqlQueryParser,
    SqlSelectExpressionParser,
};
pub use storage::{DirectoryStorage, MemoryStorage, Storage};
pub use table::{Assignment, InsertResult, Table, UpdateValue};
pub use value::{Row, Value};
