use crate::input::{ConditionInput, ExpressionInput};
use dxdb_core::{OrderBy, Result, SelectExpression, SelectOptions, SelectQuery};

/// Builder for SELECT requests
///
/// # Example
///
/// ```ignore
/// let request = SelectRequest::from_table("cars")
///     .columns(["brand", "COUNT(*) AS n"])
///     .filter("sedan = true")
///     .order_by("brand", true)
///     .limit(10);
/// ```
#[derive(Debug, Clone)]
pub struct SelectRequest {
    table: String,
    expressions: Vec<ExpressionInput>,
    condition: Option<ConditionInput>,
    options: SelectOptions,
}

impl SelectRequest {
    /// Every column of every row of `table`
    pub fn from_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            expressions: Vec::new(),
            condition: None,
            options: SelectOptions::default(),
        }
    }

    pub fn columns<I, E>(mut self, expressions: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ExpressionInput>,
    {
        self.expressions.extend(expressions.into_iter().map(Into::into));
        self
    }

    pub fn filter(mut self, condition: impl Into<ConditionInput>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.options.distinct = true;
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        let order = if ascending {
            OrderBy::asc(column)
        } else {
            OrderBy::desc(column)
        };
        self.options.order_by.push(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.options.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.options.offset = Some(offset);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Parse any text inputs into a query
    pub(crate) fn resolve(self, max_length: usize) -> Result<SelectQuery> {
        let mut expressions = self
            .expressions
            .into_iter()
            .map(|expression| expression.resolve(max_length))
            .collect::<Result<Vec<SelectExpression>>>()?;
        if expressions.is_empty() {
            expressions.push(SelectExpression::Wildcard);
        }
        let condition = self
            .condition
            .map(|condition| condition.resolve(max_length))
            .transpose()?;

        Ok(SelectQuery {
            table: self.table,
            expressions,
            condition,
            options: self.options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxdb_core::sql::DEFAULT_MAX_STATEMENT_LENGTH as MAX;
    use dxdb_core::{Condition, Error};

    #[test]
    fn test_empty_request_selects_everything() {
        let query = SelectRequest::from_table("cars").resolve(MAX).unwrap();
        assert!(query.selects_all_columns());
        assert!(query.condition.is_none());
    }

    #[test]
    fn test_builder_collects_options() {
        let query = SelectRequest::from_table("cars")
            .columns(["brand", "sedan"])
            .filter("sedan = true")
            .distinct()
            .order_by("brand", false)
            .limit(5)
            .offset(1)
            .resolve(MAX)
            .unwrap();

        assert_eq!(
            query.expressions,
            vec![SelectExpression::column("brand"), SelectExpression::column("sedan")]
        );
        assert_eq!(query.condition, Some(Condition::equals("sedan", true)));
        assert!(query.options.distinct);
        assert_eq!(query.options.order_by, vec![OrderBy::desc("brand")]);
        assert_eq!(query.options.limit, Some(5));
        assert_eq!(query.options.offset, Some(1));
    }

    #[test]
    fn test_bad_expression_is_bad_request() {
        let err = SelectRequest::from_table("cars")
            .columns(["brand FROM"])
            .resolve(MAX)
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }
}
