/// Column types and their comparators
///
/// Each type carries a stable numeric code, a canonical display name, a
/// parser that accepts the common SQL spellings, a total-order comparator
/// and a coercion from JSON input.
use crate::error::{Error, Result};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ColumnType {
    Boolean,
    Date,
    Double,
    Float,
    Integer,
    String,
    BooleanArray,
    DateArray,
    DoubleArray,
    FloatArray,
    IntegerArray,
    StringArray,
}

impl ColumnType {
    pub const ALL: [ColumnType; 12] = [
        ColumnType::Boolean,
        ColumnType::Date,
        ColumnType::Double,
        ColumnType::Float,
        ColumnType::Integer,
        ColumnType::String,
        ColumnType::BooleanArray,
        ColumnType::DateArray,
        ColumnType::DoubleArray,
        ColumnType::FloatArray,
        ColumnType::IntegerArray,
        ColumnType::StringArray,
    ];

    /// Stable numeric code
    pub fn code(self) -> u8 {
        match self {
            ColumnType::Boolean => 0,
            ColumnType::Date => 1,
            ColumnType::Double => 2,
            ColumnType::Float => 3,
            ColumnType::Integer => 4,
            ColumnType::String => 5,
            ColumnType::BooleanArray => 6,
            ColumnType::DateArray => 7,
            ColumnType::DoubleArray => 8,
            ColumnType::FloatArray => 9,
            ColumnType::IntegerArray => 10,
            ColumnType::StringArray => 11,
        }
    }

    pub fn from_code(code: u8) -> Option<ColumnType> {
        ColumnType::ALL.get(code as usize).copied()
    }

    /// Canonical name, also the on-disk spelling
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Date => "DATE",
            ColumnType::Double => "DOUBLE",
            ColumnType::Float => "FLOAT",
            ColumnType::Integer => "INTEGER",
            ColumnType::String => "STRING",
            ColumnType::BooleanArray => "BOOLEAN_ARRAY",
            ColumnType::DateArray => "DATE_ARRAY",
            ColumnType::DoubleArray => "DOUBLE_ARRAY",
            ColumnType::FloatArray => "FLOAT_ARRAY",
            ColumnType::IntegerArray => "INTEGER_ARRAY",
            ColumnType::StringArray => "STRING_ARRAY",
        }
    }

    pub fn is_array(self) -> bool {
        self.code() >= 6
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ColumnType::Double | ColumnType::Float | ColumnType::Integer
        )
    }

    /// Element type of an array type; scalars return themselves
    pub fn element_type(self) -> ColumnType {
        match self {
            ColumnType::BooleanArray => ColumnType::Boolean,
            ColumnType::DateArray => ColumnType::Date,
            ColumnType::DoubleArray => ColumnType::Double,
            ColumnType::FloatArray => ColumnType::Float,
            ColumnType::IntegerArray => ColumnType::Integer,
            ColumnType::StringArray => ColumnType::String,
            scalar => scalar,
        }
    }

    /// Array type holding elements of this type
    pub fn array_of(self) -> ColumnType {
        match self.element_type() {
            ColumnType::Boolean => ColumnType::BooleanArray,
            ColumnType::Date => ColumnType::DateArray,
            ColumnType::Double => ColumnType::DoubleArray,
            ColumnType::Float => ColumnType::FloatArray,
            ColumnType::Integer => ColumnType::IntegerArray,
            _ => ColumnType::StringArray,
        }
    }

    /// Only string columns carry a maximum length
    pub fn supports_length(self) -> bool {
        matches!(self, ColumnType::String | ColumnType::StringArray)
    }

    /// Parse a type name, ignoring any `(n)` parameters
    pub fn parse(name: &str) -> Result<ColumnType> {
        Self::parse_declaration(name).map(|(column_type, _)| column_type)
    }

    /// Parse a type declaration such as `VARCHAR(64)` or `ARRAY<INT>`
    ///
    /// Returns the type and, for string types, the declared length.
    pub fn parse_declaration(declaration: &str) -> Result<(ColumnType, Option<usize>)> {
        let normalized = declaration
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();

        let (element, is_array) = split_array(&normalized);
        let (base_name, length) = split_parameters(element);

        let base = scalar_alias(base_name)
            .ok_or_else(|| Error::IllegalArgument(format!("unknown column type '{}'", declaration)))?;
        let column_type = if is_array { base.array_of() } else { base };

        let length = if column_type.supports_length() { length } else { None };
        Ok((column_type, length))
    }

    /// Total-order comparison of two values of this type
    ///
    /// Null sorts before everything. Arrays compare element-wise and a
    /// shorter array with an equal prefix sorts first.
    pub fn compare(self, a: &Value, b: &Value) -> Ordering {
        match (a, b) {
            (Value::Null, Value::Null) => return Ordering::Equal,
            (Value::Null, _) => return Ordering::Less,
            (_, Value::Null) => return Ordering::Greater,
            _ => {}
        }

        if self.is_array() {
            let element = self.element_type();
            return match (a, b) {
                (Value::Array(x), Value::Array(y)) => {
                    compare_arrays(x, y, |l, r| element.compare(l, r))
                }
                _ => a.cmp(b),
            };
        }

        match (self, a, b) {
            (ColumnType::Boolean, Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
            (ColumnType::Date, Value::Date(x), Value::Date(y)) => x.cmp(y),
            (ColumnType::Double, Value::Double(x), Value::Double(y)) => x.total_cmp(y),
            (ColumnType::Float, Value::Float(x), Value::Float(y)) => x.total_cmp(y),
            (ColumnType::Integer, Value::Integer(x), Value::Integer(y)) => x.cmp(y),
            (ColumnType::String, Value::String(x), Value::String(y)) => compare_strings(x, y),
            _ => a.cmp(b),
        }
    }

    /// Convert JSON input into a value of this type
    pub fn coerce(self, input: &serde_json::Value) -> Result<Value> {
        use serde_json::Value as Json;

        if input.is_null() {
            return Ok(Value::Null);
        }

        if self.is_array() {
            let element = self.element_type();
            let items = match input {
                Json::Array(items) => items.clone(),
                Json::String(text) if text.trim_start().starts_with('[') => {
                    match serde_json::from_str::<Json>(text) {
                        Ok(Json::Array(items)) => items,
                        _ => return Err(self.mismatch(input)),
                    }
                }
                _ => return Err(self.mismatch(input)),
            };
            return items
                .iter()
                .map(|item| element.coerce(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array);
        }

        let value = match (self, input) {
            (ColumnType::Boolean, Json::Bool(b)) => Some(Value::Boolean(*b)),
            (ColumnType::Boolean, Json::Number(n)) => match n.as_i64() {
                Some(0) => Some(Value::Boolean(false)),
                Some(1) => Some(Value::Boolean(true)),
                _ => None,
            },
            (ColumnType::Boolean, Json::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "1" => Some(Value::Boolean(true)),
                "false" | "0" => Some(Value::Boolean(false)),
                _ => None,
            },

            (ColumnType::Date, Json::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(whole_number))
                .map(Value::Date),
            (ColumnType::Date, Json::String(s)) => parse_date(s).map(Value::Date),

            // NaN and infinities have no JSON form
            (ColumnType::Double, Json::Number(n)) => n.as_f64().filter(|f| f.is_finite()).map(Value::Double),
            (ColumnType::Double, Json::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Double),

            (ColumnType::Float, Json::Number(n)) => n
                .as_f64()
                .map(|f| f as f32)
                .filter(|f| f.is_finite())
                .map(Value::Float),
            (ColumnType::Float, Json::String(s)) => s
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Float),

            (ColumnType::Integer, Json::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(whole_number))
                .map(Value::Integer),
            (ColumnType::Integer, Json::String(s)) => s.trim().parse().ok().map(Value::Integer),

            (ColumnType::String, Json::String(s)) => Some(Value::String(s.clone())),
            (ColumnType::String, Json::Number(n)) => Some(Value::String(n.to_string())),
            (ColumnType::String, Json::Bool(b)) => Some(Value::String(b.to_string())),

            _ => None,
        };

        value.ok_or_else(|| self.mismatch(input))
    }

    fn mismatch(self, input: &serde_json::Value) -> Error {
        Error::IllegalArgument(format!("cannot convert {} to {}", input, self))
    }
}

/// An `f64` holding an exact `i64`
fn whole_number(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ColumnType::parse(s)
    }
}

impl From<ColumnType> for String {
    fn from(column_type: ColumnType) -> Self {
        column_type.name().to_string()
    }
}

impl TryFrom<String> for ColumnType {
    type Error = Error;

    fn try_from(name: String) -> Result<Self> {
        ColumnType::parse(&name)
    }
}

fn split_array(name: &str) -> (&str, bool) {
    if let Some(inner) = name
        .strip_prefix("ARRAY<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        return (inner.trim(), true);
    }
    if let Some(inner) = name
        .strip_prefix("ARRAY(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return (inner.trim(), true);
    }
    if let Some(inner) = name.strip_suffix("[]") {
        return (inner.trim(), true);
    }
    if let Some(inner) = name
        .strip_suffix("_ARRAY")
        .or_else(|| name.strip_suffix(" ARRAY"))
    {
        return (inner.trim(), true);
    }
    (name, false)
}

fn split_parameters(name: &str) -> (&str, Option<usize>) {
    match (name.find('('), name.ends_with(')')) {
        (Some(open), true) => {
            let parameters = &name[open + 1..name.len() - 1];
            let length = parameters
                .split(',')
                .next()
                .and_then(|first| first.trim().parse().ok());
            (name[..open].trim(), length)
        }
        _ => (name, None),
    }
}

fn scalar_alias(name: &str) -> Option<ColumnType> {
    let column_type = match name {
        "BOOLEAN" | "BOOL" | "BIT" => ColumnType::Boolean,
        "DATE" | "DATETIME" | "TIMESTAMP" | "TIME" | "TIMESTAMPTZ"
        | "TIMESTAMP WITH TIME ZONE" | "TIMESTAMP WITHOUT TIME ZONE" => ColumnType::Date,
        "DOUBLE" | "DOUBLE PRECISION" | "DECIMAL" | "DEC" | "NUMERIC" | "FLOAT8" => {
            ColumnType::Double
        }
        "FLOAT" | "REAL" | "FLOAT4" => ColumnType::Float,
        "INT" | "INTEGER" | "NUMBER" | "LONG" | "BIGINT" | "SMALLINT" | "TINYINT" | "INT2"
        | "INT4" | "INT8" | "INT64" => ColumnType::Integer,
        "STRING" | "TEXT" | "TXT" | "VARCHAR" | "VARCHARS" | "CHAR" | "CHARACTER"
        | "CHARACTER VARYING" | "NVARCHAR" => ColumnType::String,
        _ => return None,
    };
    Some(column_type)
}

/// Lexicographic array comparison; on an equal prefix the shorter array wins
pub fn compare_arrays<F>(a: &[Value], b: &[Value], compare: F) -> Ordering
where
    F: Fn(&Value, &Value) -> Ordering,
{
    for (x, y) in a.iter().zip(b.iter()) {
        match compare(x, y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Locale-aware string comparison
///
/// Accents and case are ignored at the first level, lowercase sorts before
/// uppercase at the second, and code points break any remaining tie so the
/// order stays total.
pub fn compare_strings(a: &str, b: &str) -> Ordering {
    a.chars()
        .map(primary_weight)
        .cmp(b.chars().map(primary_weight))
        .then_with(|| a.chars().map(case_weight).cmp(b.chars().map(case_weight)))
        .then_with(|| a.cmp(b))
}

fn primary_weight(ch: char) -> char {
    let base = strip_diacritic(ch);
    base.to_lowercase().next().unwrap_or(base)
}

fn case_weight(ch: char) -> u8 {
    if ch.is_uppercase() {
        1
    } else {
        0
    }
}

fn strip_diacritic(ch: char) -> char {
    match ch {
        'À'..='Å' => 'A',
        'à'..='å' => 'a',
        'Ç' => 'C',
        'ç' => 'c',
        'È'..='Ë' => 'E',
        'è'..='ë' => 'e',
        'Ì'..='Ï' => 'I',
        'ì'..='ï' => 'i',
        'Ñ' => 'N',
        'ñ' => 'n',
        'Ò'..='Ö' | 'Ø' => 'O',
        'ò'..='ö' | 'ø' => 'o',
        'Ù'..='Ü' => 'U',
        'ù'..='ü' => 'u',
        'Ý' => 'Y',
        'ý' | 'ÿ' => 'y',
        'Ā' | 'Ă' | 'Ą' => 'A',
        'ā' | 'ă' | 'ą' => 'a',
        'Ć' | 'Ĉ' | 'Ċ' | 'Č' => 'C',
        'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'Ď' | 'Đ' => 'D',
        'ď' | 'đ' => 'd',
        'Ē' | 'Ĕ' | 'Ė' | 'Ę' | 'Ě' => 'E',
        'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'Ł' => 'L',
        'ł' => 'l',
        'Ń' | 'Ň' => 'N',
        'ń' | 'ň' => 'n',
        'Ő' | 'Ō' => 'O',
        'ő' | 'ō' => 'o',
        'Ř' => 'R',
        'ř' => 'r',
        'Ś' | 'Š' | 'Ş' => 'S',
        'ś' | 'š' | 'ş' => 's',
        'Ť' | 'Ţ' => 'T',
        'ť' | 'ţ' => 't',
        'Ů' | 'Ű' | 'Ū' => 'U',
        'ů' | 'ű' | 'ū' => 'u',
        'Ź' | 'Ż' | 'Ž' => 'Z',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}

/// Parse RFC 3339, `YYYY-MM-DD[ HH:MM:SS[.fff]]` or epoch millis text
fn parse_date(text: &str) -> Option<i64> {
    let text = text.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.timestamp_millis());
    }

    for format in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ] {
        if let Ok(date) = NaiveDateTime::parse_from_str(text, format) {
            return Some(date.and_utc().timestamp_millis());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc().timestamp_millis());
    }

    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_codes_and_names() {
        for (i, column_type) in ColumnType::ALL.iter().enumerate() {
            assert_eq!(column_type.code() as usize, i);
            assert_eq!(ColumnType::from_code(i as u8), Some(*column_type));
            assert_eq!(ColumnType::parse(column_type.name()).unwrap(), *column_type);
        }
        assert_eq!(ColumnType::from_code(12), None);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(ColumnType::parse("txt").unwrap(), ColumnType::String);
        assert_eq!(ColumnType::parse("VarChar").unwrap(), ColumnType::String);
        assert_eq!(ColumnType::parse("varchars").unwrap(), ColumnType::String);
        assert_eq!(ColumnType::parse("bigint").unwrap(), ColumnType::Integer);
        assert_eq!(ColumnType::parse("bool").unwrap(), ColumnType::Boolean);
        assert_eq!(ColumnType::parse("timestamp").unwrap(), ColumnType::Date);
        assert_eq!(ColumnType::parse("double precision").unwrap(), ColumnType::Double);
        assert_eq!(ColumnType::parse("real").unwrap(), ColumnType::Float);
    }

    #[test]
    fn test_parse_array_forms() {
        assert_eq!(ColumnType::parse("ARRAY<INT>").unwrap(), ColumnType::IntegerArray);
        assert_eq!(ColumnType::parse("text[]").unwrap(), ColumnType::StringArray);
        assert_eq!(ColumnType::parse("date_array").unwrap(), ColumnType::DateArray);
        assert_eq!(ColumnType::parse("FLOAT ARRAY").unwrap(), ColumnType::FloatArray);
        assert!(ColumnType::parse("ARRAY").is_err());
    }

    #[test]
    fn test_parse_declaration_length() {
        assert_eq!(
            ColumnType::parse_declaration("VARCHAR(64)").unwrap(),
            (ColumnType::String, Some(64))
        );
        assert_eq!(
            ColumnType::parse_declaration("DECIMAL(10, 2)").unwrap(),
            (ColumnType::Double, None)
        );
        assert_eq!(
            ColumnType::parse_declaration("STRING").unwrap(),
            (ColumnType::String, None)
        );
    }

    #[test]
    fn test_parse_unknown() {
        let err = ColumnType::parse("BLOB").unwrap_err();
        assert!(matches!(err, Error::IllegalArgument(_)));
    }

    #[test]
    fn test_array_prefix_tiebreak() {
        for column_type in ColumnType::ALL.iter().filter(|t| t.is_array()) {
            let element = match column_type.element_type() {
                ColumnType::Boolean => json!(true),
                ColumnType::Date => json!(1000),
                ColumnType::Double => json!(1.5),
                ColumnType::Float => json!(2.5),
                ColumnType::Integer => json!(3),
                _ => json!("a"),
            };
            let short = column_type.coerce(&json!([element.clone()])).unwrap();
            let long = column_type
                .coerce(&json!([element.clone(), element.clone()]))
                .unwrap();
            assert_eq!(column_type.compare(&short, &long), Ordering::Less);
            assert_eq!(column_type.compare(&long, &short), Ordering::Greater);
            assert_eq!(column_type.compare(&long, &long), Ordering::Equal);
        }
    }

    #[test]
    fn test_string_collation() {
        assert_eq!(compare_strings("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_strings("a", "A"), Ordering::Less);
        assert_eq!(compare_strings("résumé", "resume"), Ordering::Greater);
        assert_eq!(compare_strings("résumé", "resumf"), Ordering::Less);
        assert_eq!(compare_strings("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_coerce_scalars() {
        assert_eq!(
            ColumnType::Integer.coerce(&json!("42")).unwrap(),
            Value::Integer(42)
        );
        assert_eq!(
            ColumnType::Integer.coerce(&json!(4.0)).unwrap(),
            Value::Integer(4)
        );
        assert!(ColumnType::Integer.coerce(&json!(4.5)).is_err());
        assert_eq!(
            ColumnType::Boolean.coerce(&json!("TRUE")).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            ColumnType::String.coerce(&json!(12)).unwrap(),
            Value::string("12")
        );
        assert_eq!(ColumnType::Double.coerce(&json!(null)).unwrap(), Value::Null);
        assert!(ColumnType::String.coerce(&json!({"a": 1})).is_err());
    }

    #[test]
    fn test_coerce_dates() {
        assert_eq!(
            ColumnType::Date.coerce(&json!("1970-01-02")).unwrap(),
            Value::Date(86_400_000)
        );
        assert_eq!(
            ColumnType::Date
                .coerce(&json!("1970-01-01T00:00:01Z"))
                .unwrap(),
            Value::Date(1000)
        );
        assert_eq!(ColumnType::Date.coerce(&json!(5)).unwrap(), Value::Date(5));
        assert!(ColumnType::Date.coerce(&json!("yesterday")).is_err());
        assert_eq!(ColumnType::Date.coerce(&json!(2.0)).unwrap(), Value::Date(2));
    }

    #[test]
    fn test_coerce_rejects_inexact_dates() {
        for input in [json!(1.5), json!(1e300), json!(-1e300)] {
            let err = ColumnType::Date.coerce(&input).unwrap_err();
            assert!(matches!(err, Error::IllegalArgument(_)), "{}", input);
        }
        assert!(ColumnType::Integer.coerce(&json!(1e300)).is_err());
    }

    #[test]
    fn test_coerce_rejects_non_finite_floats() {
        for column_type in [ColumnType::Double, ColumnType::Float] {
            for input in ["NaN", "inf", "-inf", "infinity"] {
                let err = column_type.coerce(&json!(input)).unwrap_err();
                assert!(matches!(err, Error::IllegalArgument(_)), "{} {}", column_type, input);
            }
        }
        assert!(ColumnType::Float.coerce(&json!(1e300)).is_err());
        assert_eq!(ColumnType::Double.coerce(&json!("2.5")).unwrap(), Value::Double(2.5));
        assert!(ColumnType::DoubleArray.coerce(&json!([1.0, "NaN"])).is_err());
    }

    #[test]
    fn test_coerce_arrays() {
        assert_eq!(
            ColumnType::IntegerArray.coerce(&json!([1, "2"])).unwrap(),
            Value::Array(vec![Value::Integer(1), Value::Integer(2)])
        );
        assert_eq!(
            ColumnType::StringArray.coerce(&json!("[\"a\"]")).unwrap(),
            Value::Array(vec![Value::string("a")])
        );
        assert!(ColumnType::IntegerArray.coerce(&json!(1)).is_err());
    }

    #[test]
    fn test_serde_uses_names() {
        let encoded = serde_json::to_string(&ColumnType::IntegerArray).unwrap();
        assert_eq!(encoded, "\"INTEGER_ARRAY\"");
        let decoded: ColumnType = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(decoded, ColumnType::String);
    }

    fn any_string() -> impl Strategy<Value = String> {
        "[a-zA-Zéèü ]{0,6}"
    }

    proptest! {
        #[test]
        fn prop_string_order_is_antisymmetric(a in any_string(), b in any_string()) {
            prop_assert_eq!(compare_strings(&a, &b), compare_strings(&b, &a).reverse());
            prop_assert_eq!(compare_strings(&a, &b) == Ordering::Equal, a == b);
        }

        #[test]
        fn prop_string_order_is_transitive(
            a in any_string(),
            b in any_string(),
            c in any_string(),
        ) {
            let mut sorted = vec![a, b, c];
            sorted.sort_by(|x, y| compare_strings(x, y));
            prop_assert_ne!(compare_strings(&sorted[0], &sorted[1]), Ordering::Greater);
            prop_assert_ne!(compare_strings(&sorted[1], &sorted[2]), Ordering::Greater);
            prop_assert_ne!(compare_strings(&sorted[0], &sorted[2]), Ordering::Greater);
        }

        #[test]
        fn prop_integer_order_matches_native(a in any::<i64>(), b in any::<i64>()) {
            prop_assert_eq!(
                ColumnType::Integer.compare(&Value::Integer(a), &Value::Integer(b)),
                a.cmp(&b)
            );
        }

        #[test]
        fn prop_double_order_is_total(a in any::<f64>(), b in any::<f64>()) {
            let x = Value::Double(a);
            let y = Value::Double(b);
            prop_assert_eq!(
                ColumnType::Double.compare(&x, &y),
                ColumnType::Double.compare(&y, &x).reverse()
            );
        }
    }
}
