use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::forward_to_deserialize_any;

/// Returns the serde container name of `T`, i.e. the name its derived `Deserialize` asks for.
///
/// Structs, enums, newtype, tuple and unit structs have one; primitives, sequences, maps and
/// options do not.
///
/// ```
/// # use polycodec::document::probe::container_name;
/// #[derive(serde::Deserialize)]
/// struct Person {
///     name: String,
/// }
///
/// assert_eq!(container_name::<Person>(), Some("Person"));
/// assert_eq!(container_name::<Vec<u8>>(), None);
/// ```
pub fn container_name<T>() -> Option<&'static str>
where
    T: for<'de> Deserialize<'de>,
{
    let mut name = None;
    let _ = T::deserialize(Probe { name: &mut name });
    name
}

struct Probe<'a> {
    name: &'a mut Option<&'static str>,
}

impl<'a> Probe<'a> {
    fn found<V>(self, name: &'static str) -> Result<V, de::value::Error> {
        *self.name = Some(name);
        Err(de::Error::custom("probed"))
    }
}

impl<'de, 'a> Deserializer<'de> for Probe<'a> {
    type Error = de::value::Error;

    fn deserialize_any<V>(self, _visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        Err(de::Error::custom("probed"))
    }

    fn deserialize_unit_struct<V>(
        self,
        name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.found(name)
    }

    fn deserialize_newtype_struct<V>(
        self,
        name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.found(name)
    }

    fn deserialize_tuple_struct<V>(
        self,
        name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.found(name)
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.found(name)
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.found(name)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit seq tuple map identifier ignored_any
    }
}
