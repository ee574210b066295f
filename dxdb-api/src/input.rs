//! Inputs that may arrive either parsed or as SQL text

use dxdb_core::sql::{SqlConditionParser, SqlQueryParser, SqlSelectExpressionParser};
use dxdb_core::{Condition, Error, Result, SelectExpression, SqlQuery};

/// A WHERE condition: `"brand = 'Mazda'"` or a built [`Condition`]
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionInput {
    Parsed(Condition),
    Text(String),
}

impl ConditionInput {
    /// Exactly one condition; unparseable text is a `BadRequest`
    pub fn resolve(self, max_length: usize) -> Result<Condition> {
        match self {
            ConditionInput::Parsed(condition) => Ok(condition),
            ConditionInput::Text(text) => {
                let mut parser = SqlConditionParser::new(text.as_str()).with_max_length(max_length);
                let condition = parser
                    .next_condition()?
                    .ok_or_else(|| Error::BadRequest("empty condition".into()))?;
                if parser.next_condition()?.is_some() {
                    return Err(Error::BadRequest(format!(
                        "expected a single condition in '{}'",
                        text
                    )));
                }
                Ok(condition)
            }
        }
    }
}

impl From<Condition> for ConditionInput {
    fn from(condition: Condition) -> Self {
        ConditionInput::Parsed(condition)
    }
}

impl From<&str> for ConditionInput {
    fn from(text: &str) -> Self {
        ConditionInput::Text(text.to_string())
    }
}

impl From<String> for ConditionInput {
    fn from(text: String) -> Self {
        ConditionInput::Text(text)
    }
}

/// One SELECT list item: `"UPPER(brand) AS b"` or a built [`SelectExpression`]
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionInput {
    Parsed(SelectExpression),
    Text(String),
}

impl ExpressionInput {
    pub fn resolve(self, max_length: usize) -> Result<SelectExpression> {
        match self {
            ExpressionInput::Parsed(expression) => Ok(expression),
            ExpressionInput::Text(text) => {
                let mut parser =
                    SqlSelectExpressionParser::new(text.as_str()).with_max_length(max_length);
                let expression = parser
                    .next_select_expression()?
                    .ok_or_else(|| Error::BadRequest("empty select expression".into()))?;
                if parser.next_select_expression()?.is_some() {
                    return Err(Error::BadRequest(format!(
                        "expected a single select expression in '{}'",
                        text
                    )));
                }
                Ok(expression)
            }
        }
    }
}

impl From<SelectExpression> for ExpressionInput {
    fn from(expression: SelectExpression) -> Self {
        ExpressionInput::Parsed(expression)
    }
}

impl From<&str> for ExpressionInput {
    fn from(text: &str) -> Self {
        ExpressionInput::Text(text.to_string())
    }
}

impl From<String> for ExpressionInput {
    fn from(text: String) -> Self {
        ExpressionInput::Text(text)
    }
}

/// A statement: SQL text or a parsed [`SqlQuery`]
#[derive(Debug, Clone, PartialEq)]
pub enum QueryInput {
    Parsed(SqlQuery),
    Text(String),
}

impl QueryInput {
    pub fn resolve(self, max_length: usize) -> Result<SqlQuery> {
        match self {
            QueryInput::Parsed(query) => Ok(query),
            QueryInput::Text(text) => {
                let mut parser = SqlQueryParser::new(text.as_str()).with_max_length(max_length);
                let query = parser
                    .next_query()?
                    .ok_or_else(|| Error::BadRequest("empty statement".into()))?;
                if parser.next_query()?.is_some() {
                    return Err(Error::BadRequest(
                        "expected a single statement; use execute_script for several".into(),
                    ));
                }
                Ok(query)
            }
        }
    }
}

impl From<SqlQuery> for QueryInput {
    fn from(query: SqlQuery) -> Self {
        QueryInput::Parsed(query)
    }
}

impl From<&str> for QueryInput {
    fn from(text: &str) -> Self {
        QueryInput::Text(text.to_string())
    }
}

impl From<String> for QueryInput {
    fn from(text: String) -> Self {
        QueryInput::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxdb_core::sql::DEFAULT_MAX_STATEMENT_LENGTH as MAX;

    #[test]
    fn test_condition_text_is_parsed() {
        let parsed = ConditionInput::from("brand = 'Mazda'").resolve(MAX).unwrap();
        assert_eq!(parsed, Condition::equals("brand", "Mazda"));
    }

    #[test]
    fn test_bad_condition_is_bad_request() {
        let err = ConditionInput::from("brand = = 1").resolve(MAX).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        let err = ConditionInput::from("   ").resolve(MAX).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn test_expression_must_be_single() {
        let expression = ExpressionInput::from("brand").resolve(MAX).unwrap();
        assert_eq!(expression, SelectExpression::column("brand"));

        let err = ExpressionInput::from("brand, sedan").resolve(MAX).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn test_query_must_be_single() {
        assert!(QueryInput::from("SHOW TABLES").resolve(MAX).is_ok());
        let err = QueryInput::from("SHOW TABLES; SHOW SEQUENCES").resolve(MAX).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn test_length_limit_applies_to_text() {
        let err = QueryInput::from("SHOW TABLES").resolve(4).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }
}
