//! Typed argument values and path-addressed values
//!
//! A `Value` is the typed payload carried by typed command arguments. A
//! `PathValue` pairs an optional external address with such a payload; a
//! non-empty path means the value lives outside the command and is fetched
//! or stored through the resolver registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Declared type of a typed argument
///
/// `Any` means the concrete type is not known yet; it is fixed the first
/// time a typed value is assigned or requested with an explicit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Any,
    Boolean,
    Integer,
    Float,
    String,
    Json,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Any => "Any",
            ValueType::Boolean => "Boolean",
            ValueType::Integer => "Integer",
            ValueType::Float => "Float",
            ValueType::String => "String",
            ValueType::Json => "Json",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != ValueType::Any
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueType {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Any" | "" => Ok(ValueType::Any),
            "Boolean" => Ok(ValueType::Boolean),
            "Integer" => Ok(ValueType::Integer),
            "Float" => Ok(ValueType::Float),
            "String" => Ok(ValueType::String),
            "Json" => Ok(ValueType::Json),
            other => Err(ValueError::UnknownType {
                name: other.to_string(),
            }),
        }
    }
}

/// Errors produced while converting between literal and typed forms
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("invalid JSON '{text}': {reason}")]
    InvalidJson { text: String, reason: String },

    #[error("expected a {expected} value, found {found}")]
    TypeMismatch { expected: ValueType, found: String },

    #[error("unknown value type '{name}'")]
    UnknownType { name: String },
}

/// Typed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Json(serde_json::Value),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Boolean(_) => ValueType::Boolean,
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Json(_) => ValueType::Json,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn to_json_value(&self) -> serde_json::Value {
        match self {
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Json(j) => j.clone(),
        }
    }

    /// Literal JSON form of the value
    pub fn to_json(&self) -> String {
        self.to_json_value().to_string()
    }

    /// Infer a typed value from literal JSON text
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidJson` if the text is not JSON.
    pub fn infer_from_json(text: &str) -> Result<Value, ValueError> {
        let json = parse_json(text)?;
        Ok(Self::infer(json))
    }

    fn infer(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            other => Value::Json(other),
        }
    }

    /// Parse literal JSON text as a value of the given type
    ///
    /// A `String` target also accepts bare, unquoted text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not JSON or does not fit the type.
    pub fn from_json(text: &str, ty: ValueType) -> Result<Value, ValueError> {
        if ty == ValueType::String {
            if let Ok(serde_json::Value::String(s)) = serde_json::from_str(text) {
                return Ok(Value::String(s));
            }
            return Ok(Value::String(text.to_string()));
        }
        let json = parse_json(text)?;
        if ty == ValueType::Json {
            return Ok(Value::Json(json));
        }
        Self::infer(json).cast_to(ty)
    }

    /// Convert this value to another type
    ///
    /// Integers and floats convert into each other (floats only when
    /// integral); `Any` and `Json` accept everything.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::TypeMismatch` when no conversion exists.
    pub fn cast_to(&self, ty: ValueType) -> Result<Value, ValueError> {
        let mismatch = || ValueError::TypeMismatch {
            expected: ty,
            found: self.value_type().name().to_string(),
        };
        match (ty, self) {
            (ValueType::Any, v) => Ok(v.clone()),
            (t, v) if t == v.value_type() => Ok(v.clone()),
            (ValueType::Float, Value::Integer(i)) => Ok(Value::Float(*i as f64)),
            (ValueType::Integer, Value::Float(f)) if f.fract() == 0.0 => {
                Ok(Value::Integer(*f as i64))
            }
            (ValueType::Json, v) => Ok(Value::Json(v.to_json_value())),
            (ValueType::String, v) => Ok(Value::String(v.to_json())),
            _ => Err(mismatch()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

fn parse_json(text: &str) -> Result<serde_json::Value, ValueError> {
    serde_json::from_str(text).map_err(|e| ValueError::InvalidJson {
        text: text.to_string(),
        reason: e.to_string(),
    })
}

/// A value addressed by an optional external path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathValue {
    pub path: String,
    pub value: Option<Value>,
}

impl PathValue {
    /// Path-only value, to be filled by a resolver
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: None,
        }
    }

    /// Literal value without an external address
    pub fn literal(value: impl Into<Value>) -> Self {
        Self {
            path: String::new(),
            value: Some(value.into()),
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }

    pub fn value_type(&self) -> Option<ValueType> {
        self.value.as_ref().map(Value::value_type)
    }
}

/// Strip the angle brackets of a path reference
///
/// Returns `None` if `text` is not of the form `<path>`.
///
/// ```
/// use cmdstack_core::value::cast_from_path;
///
/// assert_eq!(cast_from_path("<node1.x>"), Some("node1.x"));
/// assert_eq!(cast_from_path("5.0"), None);
/// ```
pub fn cast_from_path(text: &str) -> Option<&str> {
    text.strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .filter(|t| !t.is_empty())
}

/// Wrap a path in angle brackets for display
pub fn cast_to_path(path: &str) -> String {
    format!("<{}>", path)
}
