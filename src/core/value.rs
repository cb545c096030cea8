//! Field schemas and typed values
//!
//! Converts raw INFO/FORMAT strings to typed values according to the
//! `Number` and `Type` a field declares in the meta header.

use serde::Serialize;

/// Declared cardinality of a field (`Number=`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberArity {
    /// A fixed count; `Fixed(0)` is a flag
    Fixed(usize),
    /// One value per alternate allele (`A`)
    PerAltAllele,
    /// One value per allele including the reference (`R`)
    PerAllele,
    /// One value per possible genotype (`G`)
    PerGenotype,
    /// Unknown or variable (`.`, or anything unrecognized)
    Unbounded,
}

impl NumberArity {
    /// Parse a `Number=` value; unrecognized or missing values are `Unbounded`
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("A") => NumberArity::PerAltAllele,
            Some("R") => NumberArity::PerAllele,
            Some("G") => NumberArity::PerGenotype,
            Some(n) => n
                .parse::<usize>()
                .map(NumberArity::Fixed)
                .unwrap_or(NumberArity::Unbounded),
            None => NumberArity::Unbounded,
        }
    }

    pub fn is_flag(&self) -> bool {
        matches!(self, NumberArity::Fixed(0))
    }
}

/// Declared value type of a field (`Type=`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Integer,
    Float,
    String,
    Character,
    Flag,
}

impl ValueType {
    /// Parse a `Type=` value; anything unrecognized is treated as `String`
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("Integer") => ValueType::Integer,
            Some("Float") => ValueType::Float,
            Some("Character") => ValueType::Character,
            Some("Flag") => ValueType::Flag,
            _ => ValueType::String,
        }
    }
}

/// Schema of one `##INFO` or `##FORMAT` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub id: String,
    pub number: NumberArity,
    pub value_type: ValueType,
    pub description: String,
}

impl FieldSchema {
    /// Build a schema, keeping `Number=0` and `Type=Flag` consistent:
    /// a zero-count field is always a flag.
    pub fn new(
        id: impl Into<String>,
        number: NumberArity,
        value_type: ValueType,
        description: impl Into<String>,
    ) -> Self {
        let value_type = if number.is_flag() {
            ValueType::Flag
        } else {
            value_type
        };
        Self {
            id: id.into(),
            number,
            value_type,
            description: description.into(),
        }
    }
}

/// A decoded INFO/FORMAT value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Character(char),
    /// Flag presence; holds the key name
    Flag(String),
    List(Vec<Value>),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Flag(s) => Some(s),
            _ => None,
        }
    }
}

/// Missing-value marker in VCF
pub const MISSING: &str = ".";

/// Convert a single comma-free token. Returns `None` for the missing marker.
/// Tokens that do not parse as the declared numeric type are kept as strings.
pub fn coerce_scalar(token: &str, value_type: ValueType) -> Option<Value> {
    if token == MISSING || token.is_empty() {
        return None;
    }
    let value = match value_type {
        ValueType::Integer => token
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::String(token.to_string())),
        ValueType::Float => token
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::String(token.to_string())),
        ValueType::Character => {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::Character(c),
                _ => Value::String(token.to_string()),
            }
        }
        ValueType::String | ValueType::Flag => Value::String(token.to_string()),
    };
    Some(value)
}

/// Convert a raw value that may be a comma-delimited list.
///
/// One token yields a scalar, several yield a `List` in input order with
/// missing entries dropped. `None` when nothing remains.
pub fn coerce_list(raw: &str, value_type: ValueType) -> Option<Value> {
    if !raw.contains(',') {
        return coerce_scalar(raw, value_type);
    }
    let values: Vec<Value> = raw
        .split(',')
        .filter_map(|token| coerce_scalar(token, value_type))
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(Value::List(values))
    }
}
