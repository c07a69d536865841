//! The tagged document tree every encoding is written from and read into.

pub mod probe;
mod tagging;
mod untagging;

use crate::Error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use tagging::Tagger;
pub use untagging::Untagger;

/// Field holding the type tag of a tagged value.
pub const TYPE_KEY: &str = "$type";

/// Field holding a value that could not carry its own [`TYPE_KEY`], or a root that is not an
/// object in encodings that require one.
pub const VALUE_KEY: &str = "$value";

/// Newtype name under which an already tagged document passes through a [`Tagger`] untouched.
pub(crate) const DOCUMENT_TOKEN: &str = "$polycodec::Document";

/// Builds the document of `value`, tagging structs when `tags` is set.
pub fn to_document<T>(value: &T, tags: bool) -> Result<Value, serde_json::Error>
where
    T: ?Sized + Serialize,
{
    value.serialize(Tagger::new(serde_json::value::Serializer, tags))
}

/// Reads `T` from a document built by [`to_document`], ignoring the tags of its structs.
pub fn from_document<T>(document: Value) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned,
{
    T::deserialize(Untagger::new(document))
}

/// Returns the type tag carried by `document`, if any.
pub fn type_tag(document: &Value) -> Option<&str> {
    document.get(TYPE_KEY).and_then(Value::as_str)
}

/// Wraps `document` so that `tag` can be attached to it. Documents already carrying `tag` are
/// kept as they are.
pub fn attach_tag(document: Value, tag: &str) -> Value {
    if type_tag(&document) == Some(tag) {
        return document;
    }

    let mut map = Map::with_capacity(2);
    map.insert(TYPE_KEY.to_string(), Value::String(tag.to_string()));
    map.insert(VALUE_KEY.to_string(), document);
    Value::Object(map)
}

/// Returns the payload of a tagged document: the wrapped value when [`attach_tag`] had to wrap
/// it, the document itself otherwise.
pub fn detach_tag(document: Value) -> Value {
    match document {
        Value::Object(mut map) if map.contains_key(VALUE_KEY) => {
            map.remove(VALUE_KEY).unwrap_or(Value::Null)
        }
        document => document,
    }
}

/// Wraps roots that are not objects under [`VALUE_KEY`].
pub fn wrap_root(document: Value) -> Map<String, Value> {
    match document {
        Value::Object(map) => map,
        document => {
            let mut map = Map::with_capacity(1);
            map.insert(VALUE_KEY.to_string(), document);
            map
        }
    }
}

/// Reverts [`wrap_root`].
pub fn unwrap_root(mut map: Map<String, Value>) -> Value {
    if map.len() == 1 && map.contains_key(VALUE_KEY) {
        return map.remove(VALUE_KEY).unwrap_or(Value::Null);
    }
    Value::Object(map)
}

/// Fails when the root of `document` is tagged with a type other than the one `T` decodes.
pub fn check_root<T>(document: &Value) -> Result<(), Error>
where
    T: for<'de> Deserialize<'de>,
{
    match (type_tag(document), probe::container_name::<T>()) {
        (Some(found), Some(expected)) if found != expected => Err(Error::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }),
        _ => Ok(()),
    }
}
