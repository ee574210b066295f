/// SQL text parsers built on sqlparser
///
/// Three parsers share one shape: construct from text, then call `next_*`
/// until it yields `None`. Text is split on `;` outside quotes and each
/// piece is parsed when it is reached. A few statements sqlparser does not
/// know (RENAME, SHOW, DESC, CREATE SEQUENCE and INSERT with JSON objects)
/// are recognised before handing the rest to sqlparser.
///
/// Every failure is a `BadRequest`.
use super::query::{AlterAction, IndexReference, InsertValues, SqlQuery};
use crate::column::ColumnSpec;
use crate::condition::{CompareOp, Condition};
use crate::error::{Error, Result};
use crate::index::IndexType;
use crate::select::{
    AggregateFunction, OrderBy, ScalarFunction, SelectExpression, SelectOptions, SelectQuery,
};
use crate::table::{Assignment, UpdateValue};
use regex::Regex;
use serde_json::{Map, Value as Json};
use sqlparser::ast::{self as sql_ast, Statement};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser as SqlParser;
use sqlparser::tokenizer::Token;
use std::collections::VecDeque;

pub const DEFAULT_MAX_STATEMENT_LENGTH: usize = 64 * 1024;

fn bad_request(message: impl Into<String>) -> Error {
    Error::BadRequest(message.into())
}

/// Split text on `;` outside of quoted strings and identifiers
pub fn split_statements(text: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        match quote {
            // JSON strings escape with a backslash
            Some('"') if escaped => escaped = false,
            Some('"') if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' || c == '`' => quote = Some(c),
            None if c == ';' => {
                pieces.push(std::mem::take(&mut current));
                continue;
            }
            None => {}
        }
        current.push(c);
    }
    pieces.push(current);

    pieces
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Pieces of the input, split lazily on first use
struct Fragments {
    text: String,
    max_length: usize,
    pending: Option<VecDeque<String>>,
}

impl Fragments {
    fn new(text: String) -> Self {
        Self {
            text,
            max_length: DEFAULT_MAX_STATEMENT_LENGTH,
            pending: None,
        }
    }

    fn next(&mut self) -> Result<Option<String>> {
        if self.pending.is_none() {
            if self.text.len() > self.max_length {
                return Err(bad_request(format!(
                    "SQL text of {} bytes exceeds the limit of {}",
                    self.text.len(),
                    self.max_length
                )));
            }
            self.pending = Some(split_statements(&self.text).into());
        }
        Ok(self.pending.as_mut().and_then(VecDeque::pop_front))
    }
}

/// Parses WHERE clauses: `brand = "Mazda" AND sedan = true`
pub struct SqlConditionParser {
    fragments: Fragments,
}

impl SqlConditionParser {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            fragments: Fragments::new(text.into()),
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.fragments.max_length = max_length;
        self
    }

    pub fn next_condition(&mut self) -> Result<Option<Condition>> {
        match self.fragments.next()? {
            Some(text) => parse_condition(&text).map(Some),
            None => Ok(None),
        }
    }

    /// Exactly one condition
    pub fn parse(text: &str) -> Result<Condition> {
        let mut parser = Self::new(text);
        let condition = parser
            .next_condition()?
            .ok_or_else(|| bad_request("empty condition"))?;
        if parser.next_condition()?.is_some() {
            return Err(bad_request("expected a single condition"));
        }
        Ok(condition)
    }
}

/// Parses SELECT lists: `brand, COUNT(*) AS n`
pub struct SqlSelectExpressionParser {
    fragments: Fragments,
    pending: VecDeque<SelectExpression>,
}

impl SqlSelectExpressionParser {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            fragments: Fragments::new(text.into()),
            pending: VecDeque::new(),
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.fragments.max_length = max_length;
        self
    }

    pub fn next_select_expression(&mut self) -> Result<Option<SelectExpression>> {
        loop {
            if let Some(expression) = self.pending.pop_front() {
                return Ok(Some(expression));
            }
            match self.fragments.next()? {
                Some(text) => self.pending.extend(parse_select_list(&text)?),
                None => return Ok(None),
            }
        }
    }

    /// Every expression of the text
    pub fn parse_all(text: &str) -> Result<Vec<SelectExpression>> {
        let mut parser = Self::new(text);
        let mut expressions = Vec::new();
        while let Some(expression) = parser.next_select_expression()? {
            expressions.push(expression);
        }
        Ok(expressions)
    }
}

/// Parses `;`-separated SQL statements
pub struct SqlQueryParser {
    fragments: Fragments,
}

impl SqlQueryParser {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            fragments: Fragments::new(text.into()),
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.fragments.max_length = max_length;
        self
    }

    pub fn next_query(&mut self) -> Result<Option<SqlQuery>> {
        match self.fragments.next()? {
            Some(text) => parse_statement(&text).map(Some),
            None => Ok(None),
        }
    }

    /// Exactly one statement
    pub fn parse(text: &str) -> Result<SqlQuery> {
        let mut parser = Self::new(text);
        let query = parser
            .next_query()?
            .ok_or_else(|| bad_request("empty statement"))?;
        if parser.next_query()?.is_some() {
            return Err(bad_request("expected a single statement"));
        }
        Ok(query)
    }
}

fn strip_keyword<'a>(text: &'a str, keyword: &str) -> &'a str {
    match (text.get(..keyword.len()), text.get(keyword.len()..)) {
        (Some(head), Some(rest))
            if head.eq_ignore_ascii_case(keyword) && rest.starts_with(char::is_whitespace) =>
        {
            rest.trim_start()
        }
        _ => text,
    }
}

fn parse_condition(text: &str) -> Result<Condition> {
    let text = strip_keyword(text.trim(), "WHERE");
    let dialect = GenericDialect {};
    let mut parser = SqlParser::new(&dialect)
        .try_with_sql(text)
        .map_err(|e| bad_request(format!("invalid condition: {}", e)))?;
    let expr = parser
        .parse_expr()
        .map_err(|e| bad_request(format!("invalid condition: {}", e)))?;
    let trailing = parser.peek_token().token;
    if trailing != Token::EOF {
        return Err(bad_request(format!("unexpected '{}' after condition", trailing)));
    }
    convert_condition(&expr)
}

fn parse_select_list(text: &str) -> Result<Vec<SelectExpression>> {
    let dialect = GenericDialect {};
    let sql = format!("SELECT {}", text);
    let statements = SqlParser::parse_sql(&dialect, &sql)
        .map_err(|e| bad_request(format!("invalid select list: {}", e)))?;

    let [Statement::Query(query)] = statements.as_slice() else {
        return Err(bad_request("expected a select list"));
    };
    let sql_ast::SetExpr::Select(select) = &*query.body else {
        return Err(bad_request("expected a select list"));
    };
    if !select.from.is_empty()
        || select.selection.is_some()
        || query.order_by.is_some()
        || query.limit.is_some()
    {
        return Err(bad_request("expected only a select list"));
    }
    if select.distinct.is_some() {
        return Err(bad_request("DISTINCT belongs to the query, not the select list"));
    }

    select.projection.iter().map(convert_select_item).collect()
}

fn parse_statement(text: &str) -> Result<SqlQuery> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let keyword = |i: usize| words.get(i).map(|w| w.to_ascii_uppercase());

    match keyword(0).as_deref() {
        Some("RENAME") => return parse_rename(&words),
        Some("SHOW") => return parse_show(&words),
        Some("DESC") | Some("DESCRIBE") => return parse_describe(&words),
        Some("CREATE") if keyword(1).as_deref() == Some("SEQUENCE") => {
            return match words.as_slice() {
                [_, _, name] => Ok(SqlQuery::CreateSequence {
                    sequence: identifier(name)?,
                }),
                _ => Err(bad_request("expected CREATE SEQUENCE <name>")),
            };
        }
        Some("INSERT") => {
            if let Some(query) = parse_insert_json(text)? {
                return Ok(query);
            }
        }
        _ => {}
    }

    let dialect = GenericDialect {};
    let statements = SqlParser::parse_sql(&dialect, text)
        .map_err(|e| bad_request(format!("SQL parse error: {}", e)))?;
    match statements.as_slice() {
        [statement] => convert_statement(statement),
        [] => Err(bad_request("empty statement")),
        _ => Err(bad_request("expected a single statement")),
    }
}

/// Strip identifier quoting and check what is left
fn identifier(word: &str) -> Result<String> {
    let name = word
        .trim_end_matches(';')
        .trim_matches(|c| matches!(c, '"' | '`' | '[' | ']'));
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '$'));
    if valid {
        Ok(name.to_string())
    } else {
        Err(bad_request(format!("invalid name '{}'", word)))
    }
}

fn parse_rename(words: &[&str]) -> Result<SqlQuery> {
    let [_, kind, from, to_keyword, to] = words else {
        return Err(bad_request("expected RENAME TABLE|SEQUENCE|INDEX <from> TO <to>"));
    };
    if !to_keyword.eq_ignore_ascii_case("TO") {
        return Err(bad_request(format!("expected TO, found '{}'", to_keyword)));
    }
    let (from, to) = (identifier(from)?, identifier(to)?);

    match kind.to_ascii_uppercase().as_str() {
        "TABLE" => Ok(SqlQuery::RenameTable { from, to }),
        "SEQUENCE" => Ok(SqlQuery::RenameSequence { from, to }),
        "INDEX" => Ok(SqlQuery::RenameIndex {
            from: IndexReference::parse(&from),
            to: IndexReference::parse(&to).index,
        }),
        other => Err(bad_request(format!("cannot rename a {}", other))),
    }
}

fn parse_show(words: &[&str]) -> Result<SqlQuery> {
    let upper: Vec<String> = words.iter().map(|w| w.to_ascii_uppercase()).collect();
    let upper: Vec<&str> = upper.iter().map(String::as_str).collect();

    match upper.as_slice() {
        [_, "TABLES"] => Ok(SqlQuery::ShowTables),
        [_, "SEQUENCES"] => Ok(SqlQuery::ShowSequences),
        [_, "INDICES" | "INDEXES"] => Ok(SqlQuery::ShowIndices { table: None }),
        [_, "INDICES" | "INDEXES", "FROM" | "IN" | "ON", _] => Ok(SqlQuery::ShowIndices {
            table: Some(identifier(words[3])?),
        }),
        _ => Err(bad_request("expected SHOW TABLES, SHOW SEQUENCES or SHOW INDICES")),
    }
}

fn parse_describe(words: &[&str]) -> Result<SqlQuery> {
    let name = match words {
        [_, name] => name,
        [_, kind, name]
            if kind.eq_ignore_ascii_case("TABLE") || kind.eq_ignore_ascii_case("SEQUENCE") =>
        {
            name
        }
        _ => return Err(bad_request("expected DESC <name>")),
    };
    Ok(SqlQuery::Describe {
        name: identifier(name)?,
    })
}

/// `INSERT INTO t VALUE {..}` and `INSERT INTO t VALUES [{..}, ..]`
///
/// Returns None for ordinary positional inserts.
fn parse_insert_json(text: &str) -> Result<Option<SqlQuery>> {
    let pattern = Regex::new(r"(?is)^\s*INSERT\s+INTO\s+(\S+)\s+VALUES?\s+(.*?)\s*$")
        .map_err(|e| Error::InternalServerError(e.to_string()))?;
    let Some(captures) = pattern.captures(text) else {
        return Ok(None);
    };
    let body = &captures[2];
    if !(body.starts_with('{') || body.starts_with('[')) {
        return Ok(None);
    }

    let json: Json = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(_) => serde_json::from_str(&body.replace('\'', "\""))
            .map_err(|e| bad_request(format!("invalid JSON in INSERT: {}", e)))?,
    };
    let objects = match json {
        Json::Object(object) => vec![object],
        Json::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Json::Object(object) => Ok(object),
                other => Err(bad_request(format!("expected a JSON object, found {}", other))),
            })
            .collect::<Result<Vec<Map<String, Json>>>>()?,
        other => return Err(bad_request(format!("expected a JSON object, found {}", other))),
    };

    Ok(Some(SqlQuery::Insert {
        table: identifier(&captures[1])?,
        values: InsertValues::Objects(objects),
    }))
}

fn convert_statement(statement: &Statement) -> Result<SqlQuery> {
    match statement {
        Statement::Query(query) => convert_query(query),
        Statement::Insert(insert) => convert_insert(insert),
        Statement::Update {
            table,
            assignments,
            from,
            selection,
            ..
        } => {
            if from.is_some() {
                return Err(bad_request("UPDATE ... FROM is not supported"));
            }
            Ok(SqlQuery::Update {
                table: table_of(table)?,
                assignments: assignments
                    .iter()
                    .map(convert_assignment)
                    .collect::<Result<Vec<_>>>()?,
                condition: selection.as_ref().map(convert_condition).transpose()?,
            })
        }
        Statement::Delete(delete) => convert_delete(delete),
        Statement::CreateTable(create) => Ok(SqlQuery::CreateTable {
            table: last_part(&create.name)?,
            columns: create.columns.iter().map(convert_column_def).collect(),
        }),
        Statement::CreateIndex(create) => convert_create_index(create),
        Statement::Drop {
            object_type,
            if_exists,
            names,
            ..
        } => {
            let if_exists = *if_exists;
            match object_type {
                sql_ast::ObjectType::Table => Ok(SqlQuery::DropTable {
                    tables: names.iter().map(last_part).collect::<Result<Vec<_>>>()?,
                    if_exists,
                }),
                sql_ast::ObjectType::Sequence => Ok(SqlQuery::DropSequence {
                    sequences: names.iter().map(last_part).collect::<Result<Vec<_>>>()?,
                    if_exists,
                }),
                sql_ast::ObjectType::Index => Ok(SqlQuery::DropIndex {
                    indices: names
                        .iter()
                        .map(|name| IndexReference::parse(&object_name(name)))
                        .collect(),
                    if_exists,
                }),
                other => Err(bad_request(format!("cannot drop a {}", other))),
            }
        }
        Statement::AlterTable {
            name, operations, ..
        } => Ok(SqlQuery::AlterTable {
            table: last_part(name)?,
            actions: operations
                .iter()
                .map(convert_alter_operation)
                .collect::<Result<Vec<_>>>()?,
        }),
        other => Err(bad_request(format!("unsupported statement: {}", other))),
    }
}

fn object_name(name: &sql_ast::ObjectName) -> String {
    name.0
        .iter()
        .map(|part| part.value.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

fn last_part(name: &sql_ast::ObjectName) -> Result<String> {
    name.0
        .last()
        .map(|part| part.value.clone())
        .ok_or_else(|| bad_request("empty name"))
}

fn table_of(table: &sql_ast::TableWithJoins) -> Result<String> {
    if !table.joins.is_empty() {
        return Err(bad_request("JOIN is not supported"));
    }
    match &table.relation {
        sql_ast::TableFactor::Table { name, .. } => last_part(name),
        _ => Err(bad_request("expected a table name")),
    }
}

fn convert_query(query: &sql_ast::Query) -> Result<SqlQuery> {
    if query.with.is_some() {
        return Err(bad_request("WITH is not supported"));
    }
    let select = match &*query.body {
        sql_ast::SetExpr::Select(select) => select,
        _ => return Err(bad_request("only plain SELECT is supported")),
    };

    if select.from.is_empty() {
        return convert_next_value(select);
    }
    if select.group_by != sql_ast::GroupByExpr::Expressions(vec![], vec![]) {
        return Err(bad_request("GROUP BY is not supported"));
    }
    if select.having.is_some() {
        return Err(bad_request("HAVING is not supported"));
    }
    let [from] = select.from.as_slice() else {
        return Err(bad_request("SELECT reads from exactly one table"));
    };
    let table = table_of(from)?;

    let distinct = match &select.distinct {
        None => false,
        Some(sql_ast::Distinct::Distinct) => true,
        Some(sql_ast::Distinct::On(_)) => return Err(bad_request("DISTINCT ON is not supported")),
    };
    let expressions = select
        .projection
        .iter()
        .map(convert_select_item)
        .collect::<Result<Vec<_>>>()?;
    let condition = select.selection.as_ref().map(convert_condition).transpose()?;

    let order_by = match &query.order_by {
        Some(order_by) => order_by
            .exprs
            .iter()
            .map(convert_order_by)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    let limit = query.limit.as_ref().map(convert_count).transpose()?;
    let offset = query
        .offset
        .as_ref()
        .map(|offset| convert_count(&offset.value))
        .transpose()?;

    Ok(SqlQuery::Select(SelectQuery {
        table,
        expressions,
        condition,
        options: SelectOptions {
            distinct,
            order_by,
            limit,
            offset,
        },
    }))
}

/// `SELECT NEXTVAL('seq')`
fn convert_next_value(select: &sql_ast::Select) -> Result<SqlQuery> {
    let missing_from = || bad_request("SELECT requires FROM");
    let [sql_ast::SelectItem::UnnamedExpr(sql_ast::Expr::Function(function))] =
        select.projection.as_slice()
    else {
        return Err(missing_from());
    };
    if !function.name.to_string().eq_ignore_ascii_case("NEXTVAL") {
        return Err(missing_from());
    }
    let sequence = match function_args(function)? {
        ([sql_ast::FunctionArg::Unnamed(sql_ast::FunctionArgExpr::Expr(expr))], false) => {
            match column_ref(expr, true) {
                Some(name) => name,
                None => match literal_value(expr)? {
                    Json::String(name) => name,
                    other => return Err(bad_request(format!("invalid sequence name {}", other))),
                },
            }
        }
        _ => return Err(bad_request("NEXTVAL takes one sequence name")),
    };
    Ok(SqlQuery::NextValue { sequence })
}

fn convert_count(expr: &sql_ast::Expr) -> Result<usize> {
    literal_value(expr)?
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| bad_request(format!("expected a non-negative integer, found {}", expr)))
}

fn convert_order_by(order: &sql_ast::OrderByExpr) -> Result<OrderBy> {
    let column = column_ref(&order.expr, true)
        .ok_or_else(|| bad_request(format!("cannot order by {}", order.expr)))?;
    Ok(OrderBy {
        column,
        ascending: order.asc.unwrap_or(true),
    })
}

fn convert_select_item(item: &sql_ast::SelectItem) -> Result<SelectExpression> {
    match item {
        sql_ast::SelectItem::Wildcard(_) | sql_ast::SelectItem::QualifiedWildcard(..) => {
            Ok(SelectExpression::Wildcard)
        }
        sql_ast::SelectItem::UnnamedExpr(expr) => convert_select_expr(expr),
        sql_ast::SelectItem::ExprWithAlias { expr, alias } => {
            Ok(convert_select_expr(expr)?.with_alias(alias.value.clone()))
        }
    }
}

fn convert_select_expr(expr: &sql_ast::Expr) -> Result<SelectExpression> {
    if let Some(column) = column_ref(expr, true) {
        return Ok(SelectExpression::column(column));
    }
    match expr {
        sql_ast::Expr::Function(function) => convert_function(function),
        sql_ast::Expr::Nested(inner) => convert_select_expr(inner),
        other => Err(bad_request(format!("unsupported select expression {}", other))),
    }
}

fn function_args(function: &sql_ast::Function) -> Result<(&[sql_ast::FunctionArg], bool)> {
    match &function.args {
        sql_ast::FunctionArguments::List(list) => Ok((
            list.args.as_slice(),
            matches!(
                list.duplicate_treatment,
                Some(sql_ast::DuplicateTreatment::Distinct)
            ),
        )),
        sql_ast::FunctionArguments::None => Ok((&[][..], false)),
        sql_ast::FunctionArguments::Subquery(_) => {
            Err(bad_request("subqueries are not supported"))
        }
    }
}

fn convert_function(function: &sql_ast::Function) -> Result<SelectExpression> {
    let name = function.name.to_string().to_ascii_uppercase();
    let (args, distinct) = function_args(function)?;
    let column_arg = |args: &[sql_ast::FunctionArg]| -> Result<String> {
        match args {
            [sql_ast::FunctionArg::Unnamed(sql_ast::FunctionArgExpr::Expr(expr))] => column_ref(expr, true)
                .ok_or_else(|| bad_request(format!("{} expects a column, found {}", name, expr))),
            _ => Err(bad_request(format!("{} expects one column", name))),
        }
    };

    if let Some(aggregate) = AggregateFunction::parse(&name) {
        let column = match args {
            [sql_ast::FunctionArg::Unnamed(sql_ast::FunctionArgExpr::Wildcard)]
                if matches!(aggregate, AggregateFunction::Count) && !distinct =>
            {
                None
            }
            _ => Some(column_arg(args)?),
        };
        return Ok(SelectExpression::Aggregate {
            function: aggregate,
            column,
            distinct,
            alias: None,
        });
    }

    if let Some(scalar) = ScalarFunction::parse(&name) {
        if distinct {
            return Err(bad_request(format!("DISTINCT is not allowed in {}", name)));
        }
        return Ok(SelectExpression::Scalar {
            function: scalar,
            column: column_arg(args)?,
            alias: None,
        });
    }

    Err(bad_request(format!("unknown function {}", name)))
}

/// A column reference; double-quoted identifiers count only when allowed
fn column_ref(expr: &sql_ast::Expr, allow_double_quotes: bool) -> Option<String> {
    match expr {
        sql_ast::Expr::Identifier(ident) if allow_double_quotes || ident.quote_style != Some('"') => {
            Some(ident.value.clone())
        }
        sql_ast::Expr::CompoundIdentifier(parts) => parts.last().map(|part| part.value.clone()),
        sql_ast::Expr::Nested(inner) => column_ref(inner, allow_double_quotes),
        _ => None,
    }
}

fn parse_number(text: &str) -> Result<Json> {
    if let Ok(integer) = text.parse::<i64>() {
        return Ok(Json::from(integer));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Json::Number)
        .ok_or_else(|| bad_request(format!("invalid number {}", text)))
}

fn negate(value: Json) -> Result<Json> {
    let Json::Number(n) = &value else {
        return Err(bad_request(format!("cannot negate {}", value)));
    };
    if let Some(integer) = n.as_i64().and_then(i64::checked_neg) {
        return Ok(Json::from(integer));
    }
    n.as_f64()
        .and_then(|f| serde_json::Number::from_f64(-f))
        .map(Json::Number)
        .ok_or_else(|| bad_request(format!("cannot negate {}", value)))
}

/// A literal as JSON; a double-quoted identifier is read as a string
fn literal_value(expr: &sql_ast::Expr) -> Result<Json> {
    match expr {
        sql_ast::Expr::Value(value) => match value {
            sql_ast::Value::Number(n, _) => parse_number(n),
            sql_ast::Value::SingleQuotedString(s)
            | sql_ast::Value::DoubleQuotedString(s)
            | sql_ast::Value::NationalStringLiteral(s)
            | sql_ast::Value::EscapedStringLiteral(s) => Ok(Json::String(s.clone())),
            sql_ast::Value::Boolean(b) => Ok(Json::Bool(*b)),
            sql_ast::Value::Null => Ok(Json::Null),
            other => Err(bad_request(format!("unsupported literal {}", other))),
        },
        sql_ast::Expr::Identifier(ident) if ident.quote_style == Some('"') => {
            Ok(Json::String(ident.value.clone()))
        }
        sql_ast::Expr::UnaryOp { op, expr } => match op {
            sql_ast::UnaryOperator::Minus => negate(literal_value(expr)?),
            sql_ast::UnaryOperator::Plus => literal_value(expr),
            _ => Err(bad_request(format!("unsupported literal {}", expr))),
        },
        sql_ast::Expr::Array(array) => Ok(Json::Array(
            array
                .elem
                .iter()
                .map(literal_value)
                .collect::<Result<Vec<_>>>()?,
        )),
        sql_ast::Expr::TypedString { value, .. } => Ok(Json::String(value.clone())),
        sql_ast::Expr::Nested(inner) => literal_value(inner),
        other => Err(bad_request(format!("expected a literal, found {}", other))),
    }
}

fn compare_op(op: &sql_ast::BinaryOperator) -> Option<CompareOp> {
    match op {
        sql_ast::BinaryOperator::Eq => Some(CompareOp::Equal),
        sql_ast::BinaryOperator::NotEq => Some(CompareOp::NotEqual),
        sql_ast::BinaryOperator::Lt => Some(CompareOp::LessThan),
        sql_ast::BinaryOperator::LtEq => Some(CompareOp::LessThanOrEqual),
        sql_ast::BinaryOperator::Gt => Some(CompareOp::GreaterThan),
        sql_ast::BinaryOperator::GtEq => Some(CompareOp::GreaterThanOrEqual),
        _ => None,
    }
}

fn condition_column(expr: &sql_ast::Expr) -> Result<String> {
    column_ref(expr, true).ok_or_else(|| bad_request(format!("expected a column, found {}", expr)))
}

fn convert_condition(expr: &sql_ast::Expr) -> Result<Condition> {
    match expr {
        sql_ast::Expr::Nested(inner) => convert_condition(inner),
        sql_ast::Expr::BinaryOp { left, op, right } => match op {
            sql_ast::BinaryOperator::And => {
                Ok(convert_condition(left)?.and(convert_condition(right)?))
            }
            sql_ast::BinaryOperator::Or => Ok(convert_condition(left)?.or(convert_condition(right)?)),
            _ => {
                let op = compare_op(op)
                    .ok_or_else(|| bad_request(format!("unsupported operator {}", op)))?;
                if let Some(column) = column_ref(left, true) {
                    Ok(Condition::compare(column, op, literal_value(right)?))
                } else if let Some(column) = column_ref(right, false) {
                    Ok(Condition::compare(column, op.flipped(), literal_value(left)?))
                } else {
                    Err(bad_request(format!("comparison needs a column: {}", expr)))
                }
            }
        },
        sql_ast::Expr::UnaryOp {
            op: sql_ast::UnaryOperator::Not,
            expr,
        } => Ok(convert_condition(expr)?.negate()),
        sql_ast::Expr::IsNull(inner) => Ok(Condition::IsNull {
            column: condition_column(inner)?,
            negated: false,
        }),
        sql_ast::Expr::IsNotNull(inner) => Ok(Condition::IsNull {
            column: condition_column(inner)?,
            negated: true,
        }),
        sql_ast::Expr::InList {
            expr,
            list,
            negated,
        } => Ok(Condition::In {
            column: condition_column(expr)?,
            values: list.iter().map(literal_value).collect::<Result<Vec<_>>>()?,
            negated: *negated,
        }),
        sql_ast::Expr::Between {
            expr,
            negated,
            low,
            high,
        } => Ok(Condition::Between {
            column: condition_column(expr)?,
            low: literal_value(low)?,
            high: literal_value(high)?,
            negated: *negated,
        }),
        sql_ast::Expr::Like {
            negated,
            expr,
            pattern,
            ..
        } => convert_like(expr, pattern, *negated, false),
        sql_ast::Expr::ILike {
            negated,
            expr,
            pattern,
            ..
        } => convert_like(expr, pattern, *negated, true),
        sql_ast::Expr::Value(sql_ast::Value::Boolean(b)) => Ok(Condition::Constant(*b)),
        other => Err(bad_request(format!("unsupported condition {}", other))),
    }
}

fn convert_like(
    expr: &sql_ast::Expr,
    pattern: &sql_ast::Expr,
    negated: bool,
    case_insensitive: bool,
) -> Result<Condition> {
    let Json::String(pattern) = literal_value(pattern)? else {
        return Err(bad_request("LIKE pattern must be a string"));
    };
    Ok(Condition::Like {
        column: condition_column(expr)?,
        pattern,
        negated,
        case_insensitive,
    })
}

fn convert_insert(insert: &sql_ast::Insert) -> Result<SqlQuery> {
    let table = last_part(&insert.table_name)?;
    let columns = insert.columns.iter().map(|c| c.value.clone()).collect();

    let source = insert
        .source
        .as_ref()
        .ok_or_else(|| bad_request("INSERT requires VALUES"))?;
    let rows = match &*source.body {
        sql_ast::SetExpr::Values(values) => values
            .rows
            .iter()
            .map(|row| row.iter().map(literal_value).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?,
        _ => return Err(bad_request("INSERT only supports VALUES")),
    };

    Ok(SqlQuery::Insert {
        table,
        values: InsertValues::Positional { columns, rows },
    })
}

fn convert_delete(delete: &sql_ast::Delete) -> Result<SqlQuery> {
    let tables = match &delete.from {
        sql_ast::FromTable::WithFromKeyword(tables) => tables,
        sql_ast::FromTable::WithoutKeyword(tables) => tables,
    };
    let [from] = tables.as_slice() else {
        return Err(bad_request("DELETE removes from exactly one table"));
    };

    Ok(SqlQuery::Delete {
        table: table_of(from)?,
        condition: delete.selection.as_ref().map(convert_condition).transpose()?,
    })
}

fn convert_assignment(assignment: &sql_ast::Assignment) -> Result<Assignment> {
    let column = match &assignment.target {
        sql_ast::AssignmentTarget::ColumnName(name) => last_part(name)?,
        sql_ast::AssignmentTarget::Tuple(_) => {
            return Err(bad_request("tuple assignments are not supported"))
        }
    };

    let value = match &assignment.value {
        sql_ast::Expr::BinaryOp { left, op, right }
            if matches!(
                op,
                sql_ast::BinaryOperator::Plus | sql_ast::BinaryOperator::Minus
            ) =>
        {
            if column_ref(left, true).as_deref() != Some(column.as_str()) {
                return Err(bad_request(format!(
                    "arithmetic in SET must start from the column '{}'",
                    column
                )));
            }
            let operand = literal_value(right)?;
            match op {
                sql_ast::BinaryOperator::Plus => UpdateValue::Add(operand),
                _ => UpdateValue::Subtract(operand),
            }
        }
        expr => UpdateValue::Set(literal_value(expr)?),
    };

    Ok(Assignment { column, value })
}

fn convert_column_def(column: &sql_ast::ColumnDef) -> ColumnSpec {
    ColumnSpec::new(column.name.value.clone(), column.data_type.to_string())
}

fn convert_create_index(create: &sql_ast::CreateIndex) -> Result<SqlQuery> {
    let index = match &create.name {
        Some(name) => last_part(name)?,
        None => return Err(bad_request("CREATE INDEX requires a name")),
    };
    let [column] = create.columns.as_slice() else {
        return Err(bad_request("an index covers exactly one column"));
    };
    let column = column_ref(&column.expr, true)
        .ok_or_else(|| bad_request(format!("cannot index {}", column.expr)))?;
    let index_type = create
        .using
        .as_ref()
        .map(|using| IndexType::parse(&using.to_string()))
        .transpose()
        .map_err(|e| bad_request(e.to_string()))?;

    Ok(SqlQuery::CreateIndex {
        table: last_part(&create.table_name)?,
        index,
        column,
        index_type,
    })
}

fn convert_alter_operation(operation: &sql_ast::AlterTableOperation) -> Result<AlterAction> {
    match operation {
        sql_ast::AlterTableOperation::AddColumn { column_def, .. } => {
            Ok(AlterAction::AddColumn(convert_column_def(column_def)))
        }
        sql_ast::AlterTableOperation::DropColumn { column_name, .. } => {
            Ok(AlterAction::DropColumn(column_name.value.clone()))
        }
        sql_ast::AlterTableOperation::RenameColumn {
            old_column_name,
            new_column_name,
        } => Ok(AlterAction::RenameColumn {
            from: old_column_name.value.clone(),
            to: new_column_name.value.clone(),
        }),
        sql_ast::AlterTableOperation::RenameTable { table_name } => {
            Ok(AlterAction::RenameTable(last_part(table_name)?))
        }
        sql_ast::AlterTableOperation::AlterColumn { column_name, op } => match op {
            sql_ast::AlterColumnOperation::SetDataType { data_type, .. } => Ok(
                AlterAction::AlterColumn(ColumnSpec::new(column_name.value.clone(), data_type.to_string())),
            ),
            other => Err(bad_request(format!("unsupported column change {}", other))),
        },
        other => Err(bad_request(format!("unsupported ALTER TABLE action {}", other))),
    }
}
