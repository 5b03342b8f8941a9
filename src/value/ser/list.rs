use serde::ser::Serialize;

use crate::value::ser::tagged;
use crate::value::List;
use crate::{to_value, Error, Result, Value};

/// Collects sequences, tuples and tuple variants into an array.
///
/// A tuple variant is wrapped as `{ variant: [..] }`.
pub struct SerializeList {
    variant: Option<&'static str>,
    list: List<Value>,
}

impl SerializeList {
    pub fn new(len: Option<usize>) -> Self {
        Self {
            variant: None,
            list: List::with_capacity(len.unwrap_or(0)),
        }
    }

    pub fn variant(variant: &'static str, len: usize) -> Self {
        Self {
            variant: Some(variant),
            list: List::with_capacity(len),
        }
    }

    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.list.push(to_value(value)?);
        Ok(())
    }

    fn finish(self) -> Result<Value> {
        let array = Value::Array(self.list);
        Ok(match self.variant {
            Some(variant) => tagged(variant, array),
            None => array,
        })
    }
}

macro_rules! impl_serialize_list {
    ($($trait:ident::$method:ident),+) => {
        $(
            impl serde::ser::$trait for SerializeList {
                type Ok = Value;
                type Error = Error;

                fn $method<T>(&mut self, value: &T) -> Result<()>
                where
                    T: ?Sized + Serialize,
                {
                    self.push(value)
                }

                fn end(self) -> Result<Value> {
                    self.finish()
                }
            }
        )+
    };
}

impl_serialize_list! {
    SerializeSeq::serialize_element,
    SerializeTuple::serialize_element,
    SerializeTupleStruct::serialize_field,
    SerializeTupleVariant::serialize_field
}
