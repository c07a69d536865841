pub mod bson;
pub mod json;
pub mod message_pack;

use crate::serialize::bson::BsonSerDe;
use crate::serialize::json::JsonSerDe;
use crate::serialize::message_pack::MessagePackSerDe;
use crate::Error;
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Writes a document to an encoding and reads it back.
pub trait SerDe {
    fn serialize(&self, document: Value) -> Result<Vec<u8>, Error>;

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, Error>;
}

/// The encodings a [`Codec`](crate::Codec) can write.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Format {
    /// BSON, the binary document format used by MongoDB.
    #[default]
    Bson,
    /// JSON text.
    Json,
    /// MessagePack, an efficient binary format that resembles a compact JSON.
    MessagePack,
}

impl Format {
    pub fn serializer(&self) -> Box<dyn SerDe> {
        match self {
            Format::Bson => Box::new(BsonSerDe),
            Format::Json => Box::new(JsonSerDe),
            Format::MessagePack => Box::new(MessagePackSerDe),
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Bson => write!(f, "BSON"),
            Format::Json => write!(f, "JSON"),
            Format::MessagePack => write!(f, "MessagePack"),
        }
    }
}
