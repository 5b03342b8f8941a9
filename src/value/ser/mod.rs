mod list;
mod map;

use serde::ser::Serialize;

use crate::value::number;
use crate::value::ser::list::SerializeList;
use crate::value::ser::map::SerializeMap;
use crate::value::Map;
use crate::{Error, Result, Value};

/// Convert a `T` to a `Value`.
pub fn to_value<T>(value: T) -> Result<Value>
where
    T: Serialize,
{
    value.serialize(Serializer)
}

/// Serializes like JSON: `undefined` and callables are skipped inside objects
/// and become `null` everywhere else, integral numbers are written without a
/// fraction and non-finite numbers become `null`.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Value::Undefined | Value::Null | Value::Function(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) if !n.is_finite() => serializer.serialize_unit(),
            Value::Number(n) => match number::as_integer(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            Value::String(string) => serializer.serialize_str(string),
            Value::Array(list) => list.serialize(serializer),
            Value::Object(map) => {
                use serde::ser::SerializeMap;
                let mut m = serializer.serialize_map(None)?;
                for (k, v) in map {
                    if !matches!(v, Value::Undefined | Value::Function(_)) {
                        m.serialize_entry(k, v)?;
                    }
                }
                m.end()
            }
        }
    }
}

/// Serializer whose output is a `Value`.
///
/// Every number becomes a [`Value::Number`], unit values become `null` and
/// enum variants carrying data are externally tagged, `{ variant: data }`.
pub struct Serializer;

/// Wraps a value as `{ variant: value }`.
fn tagged(variant: &str, value: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(String::from(variant), value);
    Value::Object(map)
}

macro_rules! serialize_numbers {
    ($($method:ident: $ty:ty),+) => {
        $(
            fn $method(self, v: $ty) -> Result<Value> {
                Ok(Value::from(v))
            }
        )+
    };
}

impl serde::Serializer for Serializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeList;
    type SerializeTuple = SerializeList;
    type SerializeTupleStruct = SerializeList;
    type SerializeTupleVariant = SerializeList;

    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    serialize_numbers! {
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_f32: f32,
        serialize_f64: f64
    }

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::from(v))
    }

    /// Bytes become an array of numbers.
    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(v.iter().copied().map(Value::from).collect())
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(self, _: &'static str, _: u32, variant: &'static str) -> Result<Value> {
        Ok(Value::from(variant))
    }

    fn serialize_newtype_struct<T>(self, _: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(variant, to_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeList> {
        Ok(SerializeList::new(len))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeList> {
        Ok(SerializeList::new(Some(len)))
    }

    fn serialize_tuple_struct(self, _: &'static str, len: usize) -> Result<SerializeList> {
        Ok(SerializeList::new(Some(len)))
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeList> {
        Ok(SerializeList::variant(variant, len))
    }

    fn serialize_map(self, _: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
        _: usize,
    ) -> Result<SerializeMap> {
        Ok(SerializeMap::new(Some(variant)))
    }
}
