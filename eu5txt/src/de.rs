//! serde support: deserialize typed records from a parsed [`Value`] tree.
//!
//! The text format has no schema, so the deserializer is lenient where the
//! format is ambiguous:
//!
//! * a key that appears once is a scalar but a key that repeats is a
//!   sequence, so a `Vec` field accepts a single value as a one-element list;
//! * `{}` reads as an empty mapping, so a `Vec` field accepts it as empty;
//! * integers are accepted where floats or strings are expected.

use serde::de::value::{BorrowedStrDeserializer, MapAccessDeserializer};
use serde::de::{self, DeserializeSeed, IntoDeserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, forward_to_deserialize_any};
use thiserror::Error;

use crate::value::{Mapping, Value};
use std::fmt;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct Error(String);

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error(msg.to_string())
    }
}

/// Deserializes `T` from a value.
///
/// ```
/// #[derive(serde::Deserialize)]
/// struct Country {
///     gold: f64,
///     tags: Vec<String>,
/// }
///
/// let map = eu5txt::parse("country={ gold=12 tags=FRA }").unwrap();
/// let country: Country = eu5txt::from_value(&map["country"]).unwrap();
/// assert_eq!(country.gold, 12.0);
/// assert_eq!(country.tags, vec!["FRA"]);
/// ```
pub fn from_value<'a, T>(value: &'a Value) -> Result<T, Error>
where
    T: Deserialize<'a>,
{
    T::deserialize(Deserializer::from_value(value))
}

/// Deserializes `T` from the contents of a block, e.g. the result of
/// [`parse`](crate::parse).
pub fn from_mapping<'a, T>(map: &'a Mapping) -> Result<T, Error>
where
    T: Deserialize<'a>,
{
    T::deserialize(MapAccessDeserializer::new(Entries::new(map)))
}

#[derive(Clone, Copy)]
pub struct Deserializer<'de> {
    input: &'de Value,
}

impl<'de> Deserializer<'de> {
    pub fn from_value(input: &'de Value) -> Self {
        Deserializer { input }
    }

    fn mismatch(&self, expected: &str) -> Error {
        Error(format!("Expected {}, found {}", expected, self.input.kind()))
    }
}

impl<'de> de::Deserializer<'de> for Deserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Value::String(s) => visitor.visit_borrowed_str(s),
            Value::Integer(i) => visitor.visit_i64(*i),
            Value::Float(f) => visitor.visit_f64(*f),
            Value::Boolean(b) => visitor.visit_bool(*b),
            Value::Mapping(map) => visitor.visit_map(Entries::new(map)),
            Value::Sequence(items) => visitor.visit_seq(Items::new(items)),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Value::Boolean(b) => visitor.visit_bool(*b),
            Value::String(s) if s == "yes" => visitor.visit_bool(true),
            Value::String(s) if s == "no" => visitor.visit_bool(false),
            _ => Err(self.mismatch("yes/no")),
        }
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_f64(visitor)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Value::Float(f) => visitor.visit_f64(*f),
            Value::Integer(i) => visitor.visit_f64(*i as f64), // gentle coercion
            _ => Err(self.mismatch("a number")),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Value::String(s) => visitor.visit_borrowed_str(s),
            Value::Integer(i) => visitor.visit_string(i.to_string()),
            Value::Float(f) => visitor.visit_string(f.to_string()),
            Value::Boolean(b) => visitor.visit_str(if *b { "yes" } else { "no" }),
            _ => Err(self.mismatch("a string")),
        }
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Value::Sequence(items) => visitor.visit_seq(Items::new(items)),
            Value::Mapping(map) if map.is_empty() => visitor.visit_seq(Items::new(&[])),
            single => visitor.visit_seq(Items::new(std::slice::from_ref(single))),
        }
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Value::Mapping(map) => visitor.visit_map(Entries::new(map)),
            _ => Err(self.mismatch("a block of key=value pairs")),
        }
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        // Absent keys never reach here; a present value is always Some.
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Value::String(s) => visitor.visit_enum(s.as_str().into_deserializer()),
            _ => Err(self.mismatch("a variant name")),
        }
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 char bytes byte_buf unit unit_struct
        tuple tuple_struct identifier
    }
}

struct Items<'de> {
    iter: std::slice::Iter<'de, Value>,
}

impl<'de> Items<'de> {
    fn new(items: &'de [Value]) -> Self {
        Items { iter: items.iter() }
    }
}

impl<'de> SeqAccess<'de> for Items<'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(Deserializer::from_value(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct Entries<'de> {
    iter: indexmap::map::Iter<'de, String, Value>,
    value: Option<&'de Value>,
}

impl<'de> Entries<'de> {
    fn new(map: &'de Mapping) -> Self {
        Entries {
            iter: map.iter(),
            value: None,
        }
    }
}

impl<'de> MapAccess<'de> for Entries<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(BorrowedStrDeserializer::new(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        let value = self
            .value
            .take()
            .ok_or_else(|| Error("Value requested before key".to_string()))?;
        seed.deserialize(Deserializer::from_value(value))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Government {
        Monarchy,
        Republic,
    }

    #[test]
    fn test_enum_from_string() {
        let map = parse("a=monarchy b=republic c=theocracy").unwrap();
        assert_eq!(from_value::<Government>(&map["a"]), Ok(Government::Monarchy));
        assert_eq!(from_value::<Government>(&map["b"]), Ok(Government::Republic));
        assert!(from_value::<Government>(&map["c"]).is_err());
    }

    #[test]
    fn test_type_mismatch_message() {
        let map = parse("a={ x=1 }").unwrap();
        let err = from_value::<f64>(&map["a"]).unwrap_err();
        assert_eq!(err.to_string(), "Expected a number, found mapping");
    }

    #[test]
    fn test_borrowed_str() {
        let map = parse(r#"name="Louis""#).unwrap();
        let name: &str = from_value(&map["name"]).unwrap();
        assert_eq!(name, "Louis");
    }
}
