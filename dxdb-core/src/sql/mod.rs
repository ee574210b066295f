//! SQL surface: text parsers, parsed statements and the connection they run on

pub mod connection;
pub mod parser;
pub mod query;

pub use connection::Connection;
pub use parser::{
    split_statements, SqlConditionParser, SqlQueryParser, SqlSelectExpressionParser,
    DEFAULT_MAX_STATEMENT_LENGTH,
};
pub use query::{AlterAction, IndexReference, InsertValues, QueryResult, SqlQuery};
