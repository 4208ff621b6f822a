//! Runtime values for query arguments.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An argument value that supplies its own driver-encoded form on demand.
///
/// The binder never unwraps a [`Value::Opaque`]; the façade invokes
/// [`Valuer::sql_value`] right before binding and propagates its error
/// unchanged.
pub trait Valuer: fmt::Debug + Send + Sync {
    /// Produces the driver value for this argument.
    fn sql_value(&self) -> Result<Value, Box<dyn std::error::Error + Send + Sync>>;
}

/// A runtime SQL argument value.
///
/// Sequences of scalars trigger `IN` expansion; [`Value::Bytes`] is a scalar
/// blob, never a sequence for expansion purposes.
#[derive(Debug, Clone)]
pub enum Value {
    /// NULL
    Null,

    /// Boolean
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit float
    Float(f64),

    /// Text
    Text(String),

    /// Binary data
    Bytes(Vec<u8>),

    /// A sequence of values
    Seq(Vec<Value>),

    /// A map from string keys to values
    Map(HashMap<String, Value>),

    /// An opaque value producer, passed through to the driver untouched
    Opaque(Arc<dyn Valuer>),
}

impl Value {
    /// Returns true if this is a NULL value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for values that bind as a single driver argument.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Seq(_) | Value::Map(_))
    }

    /// Returns true for a non-byte sequence whose elements all bind as
    /// single driver arguments, the shape that drives `IN` expansion.
    pub fn is_scalar_seq(&self) -> bool {
        match self {
            Value::Seq(items) => items.iter().all(Value::is_scalar),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Int(v.into())
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Int(v.into())
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::Int(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Seq(v)
    }
}

// Vec<u8> is Bytes, so sequence conversions are per element type.
macro_rules! value_seq_from {
    ($($t:ty),+ $(,)?) => {$(
        impl From<Vec<$t>> for Value {
            fn from(v: Vec<$t>) -> Self {
                Value::Seq(v.into_iter().map(Into::into).collect())
            }
        }
    )+};
}

value_seq_from!(bool, i8, i16, i32, i64, u16, u32, f32, f64, &str, String);

impl From<HashMap<String, Value>> for Value {
    fn from(v: HashMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().collect())
    }
}

/// Builds a [`Value::Map`] from key/value pairs.
///
/// ```
/// use sqlx_rebind::{args, Value};
///
/// let arg = args! { "id" => 1, "name" => "Alice" };
/// assert!(matches!(arg, Value::Map(_)));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Value::Map(std::collections::HashMap::new())
    };
    ($($key:expr => $val:expr),+ $(,)?) => {{
        let mut m = std::collections::HashMap::new();
        $(m.insert(String::from($key), $crate::Value::from($val));)+
        $crate::Value::Map(m)
    }};
}
