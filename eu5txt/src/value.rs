//! The parsed value tree.

use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};

/// Insertion-ordered `key -> value` block contents.
pub type Mapping = IndexMap<String, Value>;

/// A node of the parsed tree.
///
/// There is no null variant: a field that is absent from the text is simply
/// absent from its [`Mapping`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A quoted string (raw, escapes kept) or a bare token that is not a
    /// number or boolean, e.g. `"Hello"`, `catholic`, `1444.11.11`.
    String(String),
    /// A bare token that parses as a whole number.
    Integer(i64),
    /// A bare token containing a `.` that parses as a number.
    Float(f64),
    /// `yes` / `no`.
    Boolean(bool),
    /// A block containing `key=value` pairs.
    Mapping(Mapping),
    /// A block of bare values, or a key that occurred more than once.
    Sequence(Vec<Value>),
}

impl Value {
    /// Short name of the variant, for log lines and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::Mapping(_) => "mapping",
            Value::Sequence(_) => "sequence",
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Mapping(_) | Value::Sequence(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the value; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up `key` when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Follows a chain of mapping keys, e.g. `["government", "ruler"]`.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        path.iter().try_fold(self, |v, key| v.get(key.as_ref()))
    }

    /// Iterates the occurrences of a possibly repeated key.
    ///
    /// A key seen once yields its single value; a key coalesced into a
    /// sequence yields each element. Note that a key holding a genuine
    /// `{ ... }` list also yields its elements.
    pub fn occurrences(&self, key: &str) -> std::slice::Iter<'_, Value> {
        let slice: &[Value] = match self.get(key) {
            Some(Value::Sequence(items)) => items,
            Some(single) => std::slice::from_ref(single),
            None => &[],
        };
        slice.iter()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Value::Mapping(m)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Mapping(m) => serializer.collect_map(m),
            Value::Sequence(items) => serializer.collect_seq(items),
        }
    }
}
