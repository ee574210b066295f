/// Projections, aggregates and result sets
///
/// A query first filters rows through its condition, orders them, projects
/// the select expressions, removes duplicates when DISTINCT is set and
/// finally applies OFFSET and LIMIT. Aggregate queries fold every matching
/// row into a single result row and cannot mix in plain columns.
use crate::column::PRIMARY_KEY_COLUMN;
use crate::column_type::ColumnType;
use crate::condition::Condition;
use crate::error::{Error, Result};
use crate::table::Table;
use crate::value::{Row, Value};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarFunction {
    Upper,
    Lower,
    Length,
    Abs,
}

impl ScalarFunction {
    pub fn parse(name: &str) -> Option<ScalarFunction> {
        match name.to_uppercase().as_str() {
            "UPPER" | "UCASE" => Some(ScalarFunction::Upper),
            "LOWER" | "LCASE" => Some(ScalarFunction::Lower),
            "LENGTH" | "LEN" | "CHAR_LENGTH" => Some(ScalarFunction::Length),
            "ABS" => Some(ScalarFunction::Abs),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarFunction::Upper => "UPPER",
            ScalarFunction::Lower => "LOWER",
            ScalarFunction::Length => "LENGTH",
            ScalarFunction::Abs => "ABS",
        }
    }

    fn apply(self, value: &Value) -> Value {
        match (self, value) {
            (_, Value::Null) => Value::Null,
            (ScalarFunction::Upper, Value::String(s)) => Value::String(s.to_uppercase()),
            (ScalarFunction::Lower, Value::String(s)) => Value::String(s.to_lowercase()),
            (ScalarFunction::Length, Value::String(s)) => Value::Integer(s.chars().count() as i64),
            (ScalarFunction::Length, Value::Array(items)) => Value::Integer(items.len() as i64),
            (ScalarFunction::Abs, Value::Integer(i)) => Value::Integer(i.saturating_abs()),
            (ScalarFunction::Abs, Value::Double(d)) => Value::Double(d.abs()),
            (ScalarFunction::Abs, Value::Float(f)) => Value::Float(f.abs()),
            (ScalarFunction::Length, _) => Value::Null,
            (_, other) => other.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl AggregateFunction {
    pub fn parse(name: &str) -> Option<AggregateFunction> {
        match name.to_uppercase().as_str() {
            "COUNT" => Some(AggregateFunction::Count),
            "SUM" => Some(AggregateFunction::Sum),
            "MIN" => Some(AggregateFunction::Min),
            "MAX" => Some(AggregateFunction::Max),
            "AVG" => Some(AggregateFunction::Avg),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Avg => "AVG",
        }
    }
}

/// One item of a SELECT list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectExpression {
    /// `*`
    Wildcard,
    /// `col [AS alias]`
    Column {
        name: String,
        alias: Option<String>,
    },
    /// `UPPER(col) [AS alias]`
    Scalar {
        function: ScalarFunction,
        column: String,
        alias: Option<String>,
    },
    /// `COUNT([DISTINCT] col | *) [AS alias]`; `column` is None for `*`
    Aggregate {
        function: AggregateFunction,
        column: Option<String>,
        distinct: bool,
        alias: Option<String>,
    },
}

impl SelectExpression {
    pub fn column(name: impl Into<String>) -> Self {
        SelectExpression::Column {
            name: name.into(),
            alias: None,
        }
    }

    pub fn count_all() -> Self {
        SelectExpression::Aggregate {
            function: AggregateFunction::Count,
            column: None,
            distinct: false,
            alias: None,
        }
    }

    pub fn with_alias(self, alias: impl Into<String>) -> Self {
        let alias = Some(alias.into());
        match self {
            SelectExpression::Wildcard => SelectExpression::Wildcard,
            SelectExpression::Column { name, .. } => SelectExpression::Column { name, alias },
            SelectExpression::Scalar {
                function, column, ..
            } => SelectExpression::Scalar {
                function,
                column,
                alias,
            },
            SelectExpression::Aggregate {
                function,
                column,
                distinct,
                ..
            } => SelectExpression::Aggregate {
                function,
                column,
                distinct,
                alias,
            },
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, SelectExpression::Wildcard)
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, SelectExpression::Aggregate { .. })
    }

    /// Column heading in a result set
    pub fn label(&self) -> String {
        match self {
            SelectExpression::Column {
                alias: Some(alias), ..
            }
            | SelectExpression::Scalar {
                alias: Some(alias), ..
            }
            | SelectExpression::Aggregate {
                alias: Some(alias), ..
            } => alias.clone(),
            SelectExpression::Column { name, .. } => name.clone(),
            SelectExpression::Scalar {
                function, column, ..
            } => format!("{}({})", function.name(), column),
            SelectExpression::Aggregate {
                function,
                column,
                distinct,
                ..
            } => format!(
                "{}({}{})",
                function.name(),
                if *distinct { "DISTINCT " } else { "" },
                column.as_deref().unwrap_or("*")
            ),
            SelectExpression::Wildcard => "*".to_string(),
        }
    }

    fn referenced_column(&self) -> Option<&str> {
        match self {
            SelectExpression::Column { name, .. } => Some(name),
            SelectExpression::Scalar { column, .. } => Some(column),
            SelectExpression::Aggregate { column, .. } => column.as_deref(),
            SelectExpression::Wildcard => None,
        }
    }
}

impl fmt::Display for SelectExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alias = match self {
            SelectExpression::Column { alias, .. }
            | SelectExpression::Scalar { alias, .. }
            | SelectExpression::Aggregate { alias, .. } => alias.as_deref(),
            SelectExpression::Wildcard => None,
        };
        let expression = match (self, alias) {
            (SelectExpression::Column { name, .. }, _) => name.clone(),
            (_, Some(_)) => self.clone().without_alias().label(),
            _ => self.label(),
        };
        match alias {
            Some(alias) => write!(f, "{} AS {}", expression, alias),
            None => write!(f, "{}", expression),
        }
    }
}

impl SelectExpression {
    fn without_alias(self) -> Self {
        match self {
            SelectExpression::Column { name, .. } => SelectExpression::Column { name, alias: None },
            SelectExpression::Scalar {
                function, column, ..
            } => SelectExpression::Scalar {
                function,
                column,
                alias: None,
            },
            SelectExpression::Aggregate {
                function,
                column,
                distinct,
                ..
            } => SelectExpression::Aggregate {
                function,
                column,
                distinct,
                alias: None,
            },
            SelectExpression::Wildcard => SelectExpression::Wildcard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// DISTINCT, ORDER BY, LIMIT and OFFSET
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectOptions {
    pub distinct: bool,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl SelectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// A complete SELECT against one table
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub table: String,
    pub expressions: Vec<SelectExpression>,
    pub condition: Option<Condition>,
    pub options: SelectOptions,
}

impl SelectQuery {
    pub fn all(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            expressions: vec![SelectExpression::Wildcard],
            condition: None,
            options: SelectOptions::default(),
        }
    }

    /// True when the list is empty or a lone `*`
    pub fn selects_all_columns(&self) -> bool {
        match self.expressions.as_slice() {
            [] => true,
            [only] => only.is_wildcard(),
            _ => false,
        }
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        if self.options.distinct {
            write!(f, "DISTINCT ")?;
        }
        if self.expressions.is_empty() {
            write!(f, "*")?;
        }
        for (i, expression) in self.expressions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", expression)?;
        }
        write!(f, " FROM {}", self.table)?;
        if let Some(condition) = &self.condition {
            write!(f, " WHERE {}", condition)?;
        }
        if !self.options.order_by.is_empty() {
            write!(f, " ORDER BY ")?;
            for (i, order) in self.options.order_by.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} {}", order.column, if order.ascending { "ASC" } else { "DESC" })?;
            }
        }
        if let Some(limit) = self.options.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        if let Some(offset) = self.options.offset {
            write!(f, " OFFSET {}", offset)?;
        }
        Ok(())
    }
}

/// Rows of a query result, in column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of a named column in the given row
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let position = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(position))
    }

    /// All values of one column
    pub fn column_values(&self, column: &str) -> Vec<Value> {
        match self.column_index(column) {
            Some(position) => self
                .rows
                .iter()
                .filter_map(|r| r.get(position).cloned())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Rows as JSON objects keyed by column label
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.rows
                .iter()
                .map(|row| {
                    serde_json::Value::Object(
                        self.columns
                            .iter()
                            .zip(row.iter())
                            .map(|(column, value)| (column.clone(), value.to_json()))
                            .collect(),
                    )
                })
                .collect(),
        )
    }
}

/// Every column of the matching rows
///
/// With DISTINCT the synthetic `_uuid` column is left out, otherwise no two
/// rows could ever be equal.
pub fn select_all(table: &Table, condition: Option<&Condition>, options: &SelectOptions) -> Result<ResultSet> {
    let expressions: Vec<SelectExpression> = table
        .columns()
        .iter()
        .filter(|c| !(options.distinct && c.is_primary_key()))
        .map(|c| SelectExpression::column(c.name()))
        .collect();
    project(table, &expressions, condition, options)
}

/// The given expressions over the matching rows
pub fn select_slice(
    table: &Table,
    expressions: &[SelectExpression],
    condition: Option<&Condition>,
    options: &SelectOptions,
) -> Result<ResultSet> {
    if expressions.is_empty() {
        return Err(Error::IllegalArgument("select list must not be empty".into()));
    }

    let mut expanded = Vec::with_capacity(expressions.len());
    for expression in expressions {
        if expression.is_wildcard() {
            expanded.extend(
                table
                    .columns()
                    .iter()
                    .filter(|c| !(options.distinct && c.name() == PRIMARY_KEY_COLUMN))
                    .map(|c| SelectExpression::column(c.name())),
            );
        } else {
            expanded.push(expression.clone());
        }
    }
    project(table, &expanded, condition, options)
}

fn project(
    table: &Table,
    expressions: &[SelectExpression],
    condition: Option<&Condition>,
    options: &SelectOptions,
) -> Result<ResultSet> {
    for expression in expressions {
        if let Some(column) = expression.referenced_column() {
            require_column(table, column)?;
        }
    }
    for order in &options.order_by {
        require_column(table, &order.column)?;
    }

    let aggregates = expressions.iter().filter(|e| e.is_aggregate()).count();
    if aggregates > 0 && aggregates != expressions.len() {
        return Err(Error::IllegalArgument(
            "aggregate functions cannot be mixed with plain columns".into(),
        ));
    }

    let ids = table.matching_rows(condition)?;
    let mut rows: Vec<&Row> = ids.iter().filter_map(|id| table.row(*id)).collect();
    let columns = expressions.iter().map(SelectExpression::label).collect();

    if aggregates > 0 {
        let row = expressions
            .iter()
            .map(|e| aggregate(table, e, &rows))
            .collect::<Result<Vec<_>>>()?;
        let rows = if options.offset.unwrap_or(0) > 0 || options.limit == Some(0) {
            Vec::new()
        } else {
            vec![row]
        };
        return Ok(ResultSet { columns, rows });
    }

    if !options.order_by.is_empty() {
        rows.sort_by(|a, b| compare_rows(table, &options.order_by, a, b));
    }

    let mut projected: Vec<Vec<Value>> = rows
        .iter()
        .map(|row| expressions.iter().map(|e| evaluate(e, row)).collect())
        .collect();

    if options.distinct {
        let mut seen = HashSet::new();
        projected.retain(|row| seen.insert(row.clone()));
    }

    let offset = options.offset.unwrap_or(0);
    let limit = options.limit.unwrap_or(usize::MAX);
    let rows = projected.into_iter().skip(offset).take(limit).collect();

    Ok(ResultSet { columns, rows })
}

fn require_column(table: &Table, name: &str) -> Result<()> {
    if table.column(name).is_none() {
        return Err(Error::IllegalArgument(format!(
            "unknown column '{}' in table '{}'",
            name,
            table.name()
        )));
    }
    Ok(())
}

fn compare_rows(table: &Table, order_by: &[OrderBy], a: &Row, b: &Row) -> Ordering {
    for order in order_by {
        let column_type = table
            .column(&order.column)
            .map(|c| c.column_type())
            .unwrap_or(ColumnType::String);
        let left = a.get(&order.column).unwrap_or(&Value::Null);
        let right = b.get(&order.column).unwrap_or(&Value::Null);
        let ordering = column_type.compare(left, right);
        let ordering = if order.ascending { ordering } else { ordering.reverse() };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn evaluate(expression: &SelectExpression, row: &Row) -> Value {
    match expression {
        SelectExpression::Column { name, .. } => row.get(name).cloned().unwrap_or(Value::Null),
        SelectExpression::Scalar {
            function, column, ..
        } => function.apply(row.get(column).unwrap_or(&Value::Null)),
        SelectExpression::Aggregate { .. } | SelectExpression::Wildcard => Value::Null,
    }
}

fn aggregate(table: &Table, expression: &SelectExpression, rows: &[&Row]) -> Result<Value> {
    let SelectExpression::Aggregate {
        function,
        column,
        distinct,
        ..
    } = expression
    else {
        return Ok(Value::Null);
    };

    let Some(column) = column else {
        return match function {
            AggregateFunction::Count => Ok(Value::Integer(rows.len() as i64)),
            other => Err(Error::IllegalArgument(format!(
                "{}(*) is not supported",
                other.name()
            ))),
        };
    };

    let column_type = table
        .column(column)
        .map(|c| c.column_type())
        .unwrap_or(ColumnType::String);
    let mut values: Vec<&Value> = rows
        .iter()
        .filter_map(|row| row.get(column))
        .filter(|v| !v.is_null())
        .collect();
    if *distinct {
        let mut seen = HashSet::new();
        values.retain(|v| seen.insert(*v));
    }

    match function {
        AggregateFunction::Count => Ok(Value::Integer(values.len() as i64)),
        AggregateFunction::Min => Ok(values
            .into_iter()
            .min_by(|a, b| column_type.compare(a, b))
            .cloned()
            .unwrap_or(Value::Null)),
        AggregateFunction::Max => Ok(values
            .into_iter()
            .max_by(|a, b| column_type.compare(a, b))
            .cloned()
            .unwrap_or(Value::Null)),
        AggregateFunction::Sum | AggregateFunction::Avg => {
            if !column_type.is_numeric() {
                return Err(Error::IllegalArgument(format!(
                    "{} requires a numeric column, '{}' is {}",
                    function.name(),
                    column,
                    column_type
                )));
            }
            if values.is_empty() {
                return Ok(Value::Null);
            }
            let count = values.len();
            if *function == AggregateFunction::Sum && column_type == ColumnType::Integer {
                let total = values
                    .iter()
                    .filter_map(|v| v.as_i64())
                    .fold(0i64, |acc, v| acc.saturating_add(v));
                return Ok(Value::Integer(total));
            }
            let total: f64 = values.iter().filter_map(|v| v.as_f64()).sum();
            if *function == AggregateFunction::Sum {
                Ok(Value::Double(total))
            } else {
                Ok(Value::Double(total / count as f64))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::condition::CompareOp;
    use serde_json::json;

    fn cars() -> Table {
        let mut table = Table::new(
            "t1",
            "cars",
            vec![
                Column::primary_key(),
                Column::create("brand", ColumnType::String, None).unwrap(),
                Column::create("year", ColumnType::Integer, None).unwrap(),
                Column::create("sedan", ColumnType::Boolean, None).unwrap(),
            ],
        )
        .unwrap();
        let rows: Vec<_> = [
            json!({"brand": "Mazda", "year": 2004, "sedan": true}),
            json!({"brand": "Kia", "year": 2010, "sedan": false}),
            json!({"brand": "Mazda", "year": 2020, "sedan": true}),
            json!({"brand": "BMW", "sedan": false}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();
        table.insert_rows(&rows).unwrap();
        table
    }

    #[test]
    fn test_select_all_includes_uuid() {
        let table = cars();
        let result = select_all(&table, None, &SelectOptions::default()).unwrap();
        assert_eq!(result.columns, vec!["_uuid", "brand", "year", "sedan"]);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_distinct_projection() {
        let table = cars();
        let result = select_slice(
            &table,
            &[SelectExpression::column("brand")],
            None,
            &SelectOptions::new().distinct(),
        )
        .unwrap();
        assert_eq!(
            result.column_values("brand"),
            vec![Value::string("Mazda"), Value::string("Kia"), Value::string("BMW")]
        );
    }

    #[test]
    fn test_order_limit_offset() {
        let table = cars();
        let options = SelectOptions::new()
            .order_by(OrderBy::desc("year"))
            .offset(1)
            .limit(2);
        let result = select_slice(&table, &[SelectExpression::column("year")], None, &options).unwrap();
        assert_eq!(
            result.column_values("year"),
            vec![Value::Integer(2010), Value::Integer(2004)]
        );
    }

    #[test]
    fn test_scalar_functions_and_aliases() {
        let table = cars();
        let condition = Condition::equals("brand", "Kia");
        let result = select_slice(
            &table,
            &[
                SelectExpression::Scalar {
                    function: ScalarFunction::Upper,
                    column: "brand".into(),
                    alias: Some("make".into()),
                },
                SelectExpression::Scalar {
                    function: ScalarFunction::Length,
                    column: "brand".into(),
                    alias: None,
                },
            ],
            Some(&condition),
            &SelectOptions::default(),
        )
        .unwrap();
        assert_eq!(result.columns, vec!["make", "LENGTH(brand)"]);
        assert_eq!(result.rows, vec![vec![Value::string("KIA"), Value::Integer(3)]]);
    }

    #[test]
    fn test_aggregates() {
        let table = cars();
        let result = select_slice(
            &table,
            &[
                SelectExpression::count_all(),
                SelectExpression::Aggregate {
                    function: AggregateFunction::Count,
                    column: Some("year".into()),
                    distinct: false,
                    alias: None,
                },
                SelectExpression::Aggregate {
                    function: AggregateFunction::Max,
                    column: Some("year".into()),
                    distinct: false,
                    alias: Some("newest".into()),
                },
                SelectExpression::Aggregate {
                    function: AggregateFunction::Count,
                    column: Some("brand".into()),
                    distinct: true,
                    alias: None,
                },
            ],
            None,
            &SelectOptions::default(),
        )
        .unwrap();
        assert_eq!(
            result.rows,
            vec![vec![
                Value::Integer(4),
                Value::Integer(3),
                Value::Integer(2020),
                Value::Integer(3)
            ]]
        );
        assert_eq!(result.get(0, "newest"), Some(&Value::Integer(2020)));
    }

    #[test]
    fn test_sum_and_avg() {
        let table = cars();
        let condition = Condition::compare("year", CompareOp::GreaterThan, 2000);
        let result = select_slice(
            &table,
            &[
                SelectExpression::Aggregate {
                    function: AggregateFunction::Sum,
                    column: Some("year".into()),
                    distinct: false,
                    alias: None,
                },
                SelectExpression::Aggregate {
                    function: AggregateFunction::Avg,
                    column: Some("year".into()),
                    distinct: false,
                    alias: None,
                },
            ],
            Some(&condition),
            &SelectOptions::default(),
        )
        .unwrap();
        assert_eq!(result.rows[0][0], Value::Integer(6034));
        assert_eq!(result.rows[0][1], Value::Double(6034.0 / 3.0));
    }

    #[test]
    fn test_mixed_aggregates_rejected() {
        let table = cars();
        let err = select_slice(
            &table,
            &[SelectExpression::column("brand"), SelectExpression::count_all()],
            None,
            &SelectOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::IllegalArgument(_)));
    }

    #[test]
    fn test_unknown_columns_rejected() {
        let table = cars();
        assert!(select_slice(
            &table,
            &[SelectExpression::column("color")],
            None,
            &SelectOptions::default()
        )
        .is_err());
        assert!(select_all(
            &table,
            None,
            &SelectOptions::new().order_by(OrderBy::asc("color"))
        )
        .is_err());
    }

    #[test]
    fn test_display() {
        let query = SelectQuery {
            table: "cars".into(),
            expressions: vec![
                SelectExpression::column("brand").with_alias("make"),
                SelectExpression::count_all(),
            ],
            condition: Some(Condition::equals("sedan", true)),
            options: SelectOptions::new().distinct().limit(5),
        };
        assert_eq!(
            query.to_string(),
            "SELECT DISTINCT brand AS make, COUNT(*) FROM cars WHERE sedan = TRUE LIMIT 5"
        );
    }
}
