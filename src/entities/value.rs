//! Valori dinamici - rappresentazione type-erased dei campi di un'entità

use chrono::{DateTime, Utc};
use std::fmt;

/// Storage kind of a registered property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Text,
    Timestamp,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A property value read from or written to an entity by name.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// `None` for `Null`.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ValueKind::Bool),
            Self::Int(_) => Some(ValueKind::Int),
            Self::Float(_) => Some(ValueKind::Float),
            Self::Text(_) => Some(ValueKind::Text),
            Self::Timestamp(_) => Some(ValueKind::Timestamp),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text coercion, `None` for `Null`.
    pub fn to_text(&self) -> Option<String> {
        (!self.is_null()).then(|| self.to_string())
    }

    pub(crate) fn kind_name(&self) -> String {
        self.kind().map_or_else(|| "null".to_string(), |k| k.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Timestamp(ts) => f.write_str(&ts.to_rfc3339()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A value that did not fit the kind of the field it was written to.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueError {
    pub expected: ValueKind,
    pub found: Value,
}

/// Conversion between a Rust field type and [`Value`].
///
/// Implemented for the scalar types the metadata builder accepts and for
/// `Option` of each, which marks the field nullable.
pub trait FieldValue: Sized + Send + Sync + 'static {
    const KIND: ValueKind;
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, ValueError>;
}

macro_rules! impl_field_value {
    ($ty:ty, $kind:ident, $variant:ident) => {
        impl FieldValue for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn to_value(&self) -> Value {
                Value::$variant(self.clone().into())
            }

            fn from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::$variant(inner) => Ok(inner),
                    found => Err(ValueError {
                        expected: Self::KIND,
                        found,
                    }),
                }
            }
        }
    };
}

impl_field_value!(bool, Bool, Bool);
impl_field_value!(i64, Int, Int);
impl_field_value!(f64, Float, Float);
impl_field_value!(String, Text, Text);
impl_field_value!(DateTime<Utc>, Timestamp, Timestamp);

impl FieldValue for i32 {
    const KIND: ValueKind = ValueKind::Int;

    fn to_value(&self) -> Value {
        Value::Int(i64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Int(i) => i32::try_from(i).map_err(|_| ValueError {
                expected: Self::KIND,
                found: Value::Int(i),
            }),
            found => Err(ValueError {
                expected: Self::KIND,
                found,
            }),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    const KIND: ValueKind = T::KIND;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, T::to_value)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
