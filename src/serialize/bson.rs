use crate::document;
use crate::serialize::SerDe;
use crate::Error;
use serde_json::{Map, Value};

/// BSON. Documents are the only valid roots, so other roots are wrapped by
/// [`document::wrap_root`].
pub struct BsonSerDe;

impl SerDe for BsonSerDe {
    fn serialize(&self, document: Value) -> Result<Vec<u8>, Error> {
        bson::to_vec(&document::wrap_root(document)).map_err(|e| Error::Encoding(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, Error> {
        bson::from_slice::<Map<String, Value>>(bytes)
            .map(document::unwrap_root)
            .map_err(|e| Error::Decoding(e.to_string()))
    }
}
