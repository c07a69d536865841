use crate::serialize::SerDe;
use crate::Error;
use serde_json::Value;

pub struct MessagePackSerDe;

impl SerDe for MessagePackSerDe {
    fn serialize(&self, document: Value) -> Result<Vec<u8>, Error> {
        rmp_serde::to_vec(&document).map_err(|e| Error::Encoding(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, Error> {
        rmp_serde::from_slice(bytes).map_err(|e| Error::Decoding(e.to_string()))
    }
}
