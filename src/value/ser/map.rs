use serde::ser::{Error as _, Serialize};

use crate::value::ser::tagged;
use crate::value::Map;
use crate::{to_value, Error, Result, Value};

/// Collects maps, structs and struct variants into an object.
///
/// Keys follow property name coercion, so any primitive key is accepted and
/// converted to its string form. A struct variant is wrapped as
/// `{ variant: {..} }`.
pub struct SerializeMap {
    variant: Option<&'static str>,
    map: Map<String, Value>,
    next_key: Option<String>,
}

impl SerializeMap {
    pub fn new(variant: Option<&'static str>) -> Self {
        Self {
            variant,
            map: Map::new(),
            next_key: None,
        }
    }

    fn finish(self) -> Result<Value> {
        let object = Value::Object(self.map);
        Ok(match self.variant {
            Some(variant) => tagged(variant, object),
            None => object,
        })
    }
}

/// Converts a serialized map key to a property name.
fn property_name<T>(key: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    match to_value(key)? {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::from("null")),
        key if key.is_primitive() => Ok(key.to_string()),
        key => Err(Error::custom(format_args!(
            "object key must be a primitive, found {}",
            key.human()
        ))),
    }
}

impl serde::ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.next_key = Some(property_name(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| Error::custom("map value serialized before its key"))?;
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

impl serde::ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(String::from(key), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

impl serde::ser::SerializeStructVariant for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        serde::ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}
