use crate::serialize::SerDe;
use crate::Error;
use serde_json::error::Category;
use serde_json::Value;

/// JSON text. Numbers are written with `.` as decimal separator whatever the host locale.
pub struct JsonSerDe;

impl JsonSerDe {
    pub fn to_string(&self, document: &Value) -> Result<String, Error> {
        serde_json::to_string(document).map_err(|e| Error::Encoding(e.to_string()))
    }

    pub fn from_str(&self, text: &str) -> Result<Value, Error> {
        serde_json::from_str(text).map_err(read_error)
    }
}

fn read_error(error: serde_json::Error) -> Error {
    match error.classify() {
        Category::Syntax | Category::Eof => Error::Parse(error),
        Category::Io | Category::Data => Error::Decoding(error.to_string()),
    }
}

impl SerDe for JsonSerDe {
    fn serialize(&self, document: Value) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(&document).map_err(|e| Error::Encoding(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, Error> {
        serde_json::from_slice(bytes).map_err(read_error)
    }
}
