/// Row filter conditions
///
/// A `Condition` names columns and carries JSON literals. Before it is
/// evaluated against a table it is bound: columns are resolved and literals
/// are coerced to the column types once. The bound form evaluates rows and
/// tells the table which index probes could narrow the scan.
///
/// Comparisons against NULL are false; use IS NULL.
use crate::column_type::ColumnType;
use crate::error::{Error, Result};
use crate::index::IndexLookup;
use crate::table::Table;
use crate::value::{Row, Value};
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Bound;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// =
    Equal,
    /// <>
    NotEqual,
    /// <
    LessThan,
    /// <=
    LessThanOrEqual,
    /// >
    GreaterThan,
    /// >=
    GreaterThanOrEqual,
}

impl CompareOp {
    /// Operator with its operands swapped (`5 < x` is `x > 5`)
    pub fn flipped(self) -> CompareOp {
        match self {
            CompareOp::LessThan => CompareOp::GreaterThan,
            CompareOp::LessThanOrEqual => CompareOp::GreaterThanOrEqual,
            CompareOp::GreaterThan => CompareOp::LessThan,
            CompareOp::GreaterThanOrEqual => CompareOp::LessThanOrEqual,
            other => other,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Equal => "=",
            CompareOp::NotEqual => "<>",
            CompareOp::LessThan => "<",
            CompareOp::LessThanOrEqual => "<=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterThanOrEqual => ">=",
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Equal => ordering == Ordering::Equal,
            CompareOp::NotEqual => ordering != Ordering::Equal,
            CompareOp::LessThan => ordering == Ordering::Less,
            CompareOp::LessThanOrEqual => ordering != Ordering::Greater,
            CompareOp::GreaterThan => ordering == Ordering::Greater,
            CompareOp::GreaterThanOrEqual => ordering != Ordering::Less,
        }
    }
}

/// Filter over the rows of one table
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        column: String,
        op: CompareOp,
        value: serde_json::Value,
    },
    In {
        column: String,
        values: Vec<serde_json::Value>,
        negated: bool,
    },
    Between {
        column: String,
        low: serde_json::Value,
        high: serde_json::Value,
        negated: bool,
    },
    Like {
        column: String,
        pattern: String,
        negated: bool,
        case_insensitive: bool,
    },
    IsNull {
        column: String,
        negated: bool,
    },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
    Constant(bool),
}

impl Condition {
    pub fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<serde_json::Value>) -> Self {
        Condition::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn equals(column: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::compare(column, CompareOp::Equal, value)
    }

    pub fn and(self, other: Condition) -> Self {
        Condition::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Condition) -> Self {
        Condition::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Condition::Not(Box::new(self))
    }

    /// Resolve columns against the table and coerce literals
    pub(crate) fn bind(&self, table: &Table) -> Result<BoundCondition> {
        let column_type = |name: &str| -> Result<ColumnType> {
            table
                .column(name)
                .map(|c| c.column_type())
                .ok_or_else(|| {
                    Error::IllegalArgument(format!(
                        "unknown column '{}' in table '{}'",
                        name,
                        table.name()
                    ))
                })
        };

        let bound = match self {
            Condition::Compare { column, op, value } => {
                let column_type = column_type(column)?;
                BoundCondition::Compare {
                    column: column.clone(),
                    column_type,
                    op: *op,
                    value: column_type.coerce(value)?,
                }
            }
            Condition::In {
                column,
                values,
                negated,
            } => {
                let column_type = column_type(column)?;
                BoundCondition::In {
                    column: column.clone(),
                    values: values
                        .iter()
                        .map(|v| column_type.coerce(v))
                        .collect::<Result<Vec<_>>>()?,
                    negated: *negated,
                }
            }
            Condition::Between {
                column,
                low,
                high,
                negated,
            } => {
                let column_type = column_type(column)?;
                BoundCondition::Between {
                    column: column.clone(),
                    column_type,
                    low: column_type.coerce(low)?,
                    high: column_type.coerce(high)?,
                    negated: *negated,
                }
            }
            Condition::Like {
                column,
                pattern,
                negated,
                case_insensitive,
            } => {
                column_type(column)?;
                BoundCondition::Like {
                    column: column.clone(),
                    regex: like_regex(pattern, *case_insensitive)?,
                    negated: *negated,
                }
            }
            Condition::IsNull { column, negated } => {
                column_type(column)?;
                BoundCondition::IsNull {
                    column: column.clone(),
                    negated: *negated,
                }
            }
            Condition::And(left, right) => BoundCondition::And(
                Box::new(left.bind(table)?),
                Box::new(right.bind(table)?),
            ),
            Condition::Or(left, right) => BoundCondition::Or(
                Box::new(left.bind(table)?),
                Box::new(right.bind(table)?),
            ),
            Condition::Not(inner) => BoundCondition::Not(Box::new(inner.bind(table)?)),
            Condition::Constant(b) => BoundCondition::Constant(*b),
        };
        Ok(bound)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Compare { column, op, value } => {
                write!(f, "{} {} {}", column, op.symbol(), SqlLiteral(value))
            }
            Condition::In {
                column,
                values,
                negated,
            } => {
                write!(f, "{} {}IN (", column, if *negated { "NOT " } else { "" })?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", SqlLiteral(value))?;
                }
                write!(f, ")")
            }
            Condition::Between {
                column,
                low,
                high,
                negated,
            } => write!(
                f,
                "{} {}BETWEEN {} AND {}",
                column,
                if *negated { "NOT " } else { "" },
                SqlLiteral(low),
                SqlLiteral(high)
            ),
            Condition::Like {
                column,
                pattern,
                negated,
                case_insensitive,
            } => write!(
                f,
                "{} {}{} {}",
                column,
                if *negated { "NOT " } else { "" },
                if *case_insensitive { "ILIKE" } else { "LIKE" },
                SqlLiteral(&serde_json::Value::String(pattern.clone()))
            ),
            Condition::IsNull { column, negated } => {
                write!(f, "{} IS {}NULL", column, if *negated { "NOT " } else { "" })
            }
            Condition::And(left, right) => write!(f, "({} AND {})", left, right),
            Condition::Or(left, right) => write!(f, "({} OR {})", left, right),
            Condition::Not(inner) => write!(f, "NOT {}", inner),
            Condition::Constant(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

/// JSON literal rendered as SQL
pub(crate) struct SqlLiteral<'a>(pub &'a serde_json::Value);

impl fmt::Display for SqlLiteral<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            serde_json::Value::Null => write!(f, "NULL"),
            serde_json::Value::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            serde_json::Value::Number(n) => write!(f, "{}", n),
            serde_json::Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            serde_json::Value::Array(items) => {
                write!(f, "ARRAY[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", SqlLiteral(item))?;
                }
                write!(f, "]")
            }
            serde_json::Value::Object(_) => write!(f, "'{}'", self.0.to_string().replace('\'', "''")),
        }
    }
}

/// Condition resolved against a table's columns
#[derive(Debug, Clone)]
pub(crate) enum BoundCondition {
    Compare {
        column: String,
        column_type: ColumnType,
        op: CompareOp,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    Between {
        column: String,
        column_type: ColumnType,
        low: Value,
        high: Value,
        negated: bool,
    },
    Like {
        column: String,
        regex: Regex,
        negated: bool,
    },
    IsNull {
        column: String,
        negated: bool,
    },
    And(Box<BoundCondition>, Box<BoundCondition>),
    Or(Box<BoundCondition>, Box<BoundCondition>),
    Not(Box<BoundCondition>),
    Constant(bool),
}

impl BoundCondition {
    pub(crate) fn matches(&self, row: &Row) -> bool {
        let value_of = |column: &str| row.get(column).unwrap_or(&Value::Null);

        match self {
            BoundCondition::Compare {
                column,
                column_type,
                op,
                value,
            } => {
                let current = value_of(column);
                if current.is_null() || value.is_null() {
                    return false;
                }
                op.accepts(column_type.compare(current, value))
            }
            BoundCondition::In {
                column,
                values,
                negated,
            } => {
                let current = value_of(column);
                if current.is_null() {
                    return false;
                }
                values.iter().any(|v| v == current) != *negated
            }
            BoundCondition::Between {
                column,
                column_type,
                low,
                high,
                negated,
            } => {
                let current = value_of(column);
                if current.is_null() {
                    return false;
                }
                let inside = column_type.compare(current, low) != Ordering::Less
                    && column_type.compare(current, high) != Ordering::Greater;
                inside != *negated
            }
            BoundCondition::Like {
                column,
                regex,
                negated,
            } => match value_of(column) {
                Value::Null => false,
                Value::String(s) => regex.is_match(s) != *negated,
                other => regex.is_match(&other.to_string()) != *negated,
            },
            BoundCondition::IsNull { column, negated } => value_of(column).is_null() != *negated,
            BoundCondition::And(left, right) => left.matches(row) && right.matches(row),
            BoundCondition::Or(left, right) => left.matches(row) || right.matches(row),
            BoundCondition::Not(inner) => !inner.matches(row),
            BoundCondition::Constant(b) => *b,
        }
    }

    /// Index probes that return a superset of the matching rows
    ///
    /// Only conjuncts qualify: every row the condition accepts must also
    /// satisfy each probe. Equality probes come first.
    pub(crate) fn index_probes(&self) -> Vec<(&str, IndexLookup)> {
        let mut probes = Vec::new();
        self.collect_probes(&mut probes);
        probes.sort_by_key(|(_, probe)| !probe.is_equality());
        probes
    }

    fn collect_probes<'a>(&'a self, probes: &mut Vec<(&'a str, IndexLookup)>) {
        match self {
            BoundCondition::Compare {
                column, op, value, ..
            } if !value.is_null() => {
                let probe = match op {
                    CompareOp::Equal => Some(IndexLookup::Equal(vec![value.clone()])),
                    CompareOp::NotEqual => None,
                    CompareOp::LessThan => Some(IndexLookup::Range {
                        lower: Bound::Unbounded,
                        upper: Bound::Excluded(value.clone()),
                    }),
                    CompareOp::LessThanOrEqual => Some(IndexLookup::Range {
                        lower: Bound::Unbounded,
                        upper: Bound::Included(value.clone()),
                    }),
                    CompareOp::GreaterThan => Some(IndexLookup::Range {
                        lower: Bound::Excluded(value.clone()),
                        upper: Bound::Unbounded,
                    }),
                    CompareOp::GreaterThanOrEqual => Some(IndexLookup::Range {
                        lower: Bound::Included(value.clone()),
                        upper: Bound::Unbounded,
                    }),
                };
                if let Some(probe) = probe {
                    probes.push((column.as_str(), probe));
                }
            }
            BoundCondition::In {
                column,
                values,
                negated: false,
            } => {
                let keys: Vec<Value> = values.iter().filter(|v| !v.is_null()).cloned().collect();
                probes.push((column.as_str(), IndexLookup::Equal(keys)));
            }
            BoundCondition::Between {
                column,
                low,
                high,
                negated: false,
                ..
            } if !low.is_null() && !high.is_null() => {
                probes.push((
                    column.as_str(),
                    IndexLookup::Range {
                        lower: Bound::Included(low.clone()),
                        upper: Bound::Included(high.clone()),
                    },
                ));
            }
            BoundCondition::And(left, right) => {
                left.collect_probes(probes);
                right.collect_probes(probes);
            }
            _ => {}
        }
    }
}

/// Translate a SQL LIKE pattern (`%`, `_`) into an anchored regex
fn like_regex(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    let mut expression = String::with_capacity(pattern.len() + 8);
    expression.push('^');
    for ch in pattern.chars() {
        match ch {
            '%' => expression.push_str(".*"),
            '_' => expression.push('.'),
            other => expression.push_str(&regex::escape(&other.to_string())),
        }
    }
    expression.push('$');

    RegexBuilder::new(&expression)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| Error::BadRequest(format!("invalid LIKE pattern '{}': {}", pattern, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use serde_json::json;

    fn cars() -> Table {
        Table::new(
            "t1",
            "cars",
            vec![
                Column::primary_key(),
                Column::create("brand", ColumnType::String, None).unwrap(),
                Column::create("year", ColumnType::Integer, None).unwrap(),
            ],
        )
        .unwrap()
    }

    fn row(brand: &str, year: i64) -> Row {
        let mut row = Row::new();
        row.insert("brand".into(), Value::string(brand));
        row.insert("year".into(), Value::Integer(year));
        row
    }

    #[test]
    fn test_compare_coerces_literals() {
        let table = cars();
        let bound = Condition::compare("year", CompareOp::GreaterThan, "2005")
            .bind(&table)
            .unwrap();
        assert!(bound.matches(&row("Mazda", 2010)));
        assert!(!bound.matches(&row("Mazda", 2004)));
    }

    #[test]
    fn test_unknown_column_is_illegal_argument() {
        let table = cars();
        let err = Condition::equals("color", "red").bind(&table).unwrap_err();
        assert!(matches!(err, Error::IllegalArgument(_)));
    }

    #[test]
    fn test_bad_literal_is_illegal_argument() {
        let table = cars();
        let err = Condition::equals("year", "soon").bind(&table).unwrap_err();
        assert!(matches!(err, Error::IllegalArgument(_)));
    }

    #[test]
    fn test_null_comparisons_are_false() {
        let table = cars();
        let mut partial = Row::new();
        partial.insert("brand".into(), Value::string("Kia"));

        let bound = Condition::compare("year", CompareOp::NotEqual, 1).bind(&table).unwrap();
        assert!(!bound.matches(&partial));

        let is_null = Condition::IsNull {
            column: "year".into(),
            negated: false,
        }
        .bind(&table)
        .unwrap();
        assert!(is_null.matches(&partial));
    }

    #[test]
    fn test_like_and_logic() {
        let table = cars();
        let condition = Condition::Like {
            column: "brand".into(),
            pattern: "ma%".into(),
            negated: false,
            case_insensitive: true,
        }
        .and(Condition::compare("year", CompareOp::LessThanOrEqual, 2010).negate());
        let bound = condition.bind(&table).unwrap();

        assert!(bound.matches(&row("Mazda", 2020)));
        assert!(!bound.matches(&row("Mazda", 2010)));
        assert!(!bound.matches(&row("Kia", 2020)));
    }

    #[test]
    fn test_like_escapes_regex_characters() {
        let regex = like_regex("a.b%", false).unwrap();
        assert!(regex.is_match("a.bc"));
        assert!(!regex.is_match("axbc"));
    }

    #[test]
    fn test_probes_only_from_conjuncts() {
        let table = cars();
        let conjunction = Condition::compare("year", CompareOp::GreaterThan, 2000)
            .and(Condition::equals("brand", "Mazda"))
            .bind(&table)
            .unwrap();
        let probes = conjunction.index_probes();
        assert_eq!(probes.len(), 2);
        assert_eq!(probes[0].0, "brand");

        let disjunction = Condition::equals("brand", "Mazda")
            .or(Condition::equals("brand", "Kia"))
            .bind(&table)
            .unwrap();
        assert!(disjunction.index_probes().is_empty());
    }

    #[test]
    fn test_display_renders_sql() {
        let condition = Condition::equals("brand", "O'Neil").and(Condition::In {
            column: "year".into(),
            values: vec![json!(2004), json!(2010)],
            negated: true,
        });
        assert_eq!(
            condition.to_string(),
            "(brand = 'O''Neil' AND year NOT IN (2004, 2010))"
        );
    }
}
