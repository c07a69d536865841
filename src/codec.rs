use crate::document::{self, probe};
use crate::scope::Scope;
use crate::serialize::json::JsonSerDe;
use crate::serialize::Format;
use crate::settings::Settings;
use crate::Error;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::type_name;
use std::sync::Arc;
use tracing::debug;

/// Converts object graphs to and from JSON text and BSON, tagging values with their concrete
/// type and cutting reference loops as configured by its [`Settings`].
///
/// A codec holds no state besides its settings: it can be cloned and used from any number of
/// threads at once.
///
/// ```
/// # use polycodec::Codec;
/// # use serde::{Deserialize, Serialize};
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Person {
///     name: String,
/// }
///
/// let codec = Codec::default();
/// let alice = Person { name: "Alice".to_string() };
///
/// let json = codec.encode_json(&alice).unwrap();
/// assert_eq!(json, r#"{"$type":"Person","name":"Alice"}"#);
///
/// let bytes = codec.encode_binary(&alice).unwrap();
/// assert_eq!(codec.decode_binary::<Person>(&bytes).unwrap(), alice);
/// ```
#[derive(Clone, Debug)]
pub struct Codec {
    settings: Arc<Settings>,
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            settings: Settings::shared_default(),
        }
    }
}

impl From<Settings> for Codec {
    fn from(settings: Settings) -> Self {
        Self::new(settings)
    }
}

impl From<Arc<Settings>> for Codec {
    fn from(settings: Arc<Settings>) -> Self {
        Self { settings }
    }
}

impl Codec {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn encode_binary<T>(&self, value: &T) -> Result<Vec<u8>, Error>
    where
        T: ?Sized + Serialize,
    {
        self.encode(Format::Bson, value)
    }

    pub fn decode_binary<T>(&self, bytes: &[u8]) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        self.decode(Format::Bson, bytes)
    }

    pub fn encode_json<T>(&self, value: &T) -> Result<String, Error>
    where
        T: ?Sized + Serialize,
    {
        let document = self.to_document(value)?;
        let text = JsonSerDe.to_string(&document)?;
        debug!(format = %Format::Json, size = text.len(), "encoded value");
        Ok(text)
    }

    /// Reads JSON text. Text that is not valid JSON fails with [`Error::Parse`].
    pub fn decode_json<T>(&self, text: &str) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let document = JsonSerDe.from_str(text)?;
        let value = self.from_document(document)?;
        debug!(format = %Format::Json, size = text.len(), "decoded value");
        Ok(value)
    }

    pub fn encode<T>(&self, format: Format, value: &T) -> Result<Vec<u8>, Error>
    where
        T: ?Sized + Serialize,
    {
        let document = self.to_document(value)?;
        let bytes = format.serializer().serialize(document)?;
        debug!(format = %format, size = bytes.len(), "encoded value");
        Ok(bytes)
    }

    pub fn decode<T>(&self, format: Format, bytes: &[u8]) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let document = format.serializer().deserialize(bytes)?;
        let value = self.from_document(document)?;
        debug!(format = %format, size = bytes.len(), "decoded value");
        Ok(value)
    }

    /// Builds the tagged document of `value`, the tree every encoding writes.
    pub fn to_document<T>(&self, value: &T) -> Result<Value, Error>
    where
        T: ?Sized + Serialize,
    {
        let scope = Scope::enter(self.settings.clone());
        document::to_document(value, self.settings.tags_structs()).map_err(|e| {
            let message = e.to_string();
            scope
                .take_failure(&message)
                .unwrap_or(Error::Encoding(message))
        })
    }

    /// Reads `T` from a tagged document. Fails with [`Error::TypeMismatch`] when the document
    /// is tagged with a type that `T` cannot be read from.
    pub fn from_document<T>(&self, document: Value) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        document::check_root::<T>(&document)?;
        let found = document::type_tag(&document)
            .filter(|tag| probe::container_name::<T>() != Some(*tag))
            .map(str::to_string);

        let scope = Scope::enter(self.settings.clone());
        document::from_document(document).map_err(|e| {
            let message = e.to_string();
            if let Some(failure) = scope.take_failure(&message) {
                return failure;
            }
            match found {
                Some(found) => {
                    debug!(expected = type_name::<T>(), found = %found, "root type mismatch");
                    Error::TypeMismatch {
                        expected: type_name::<T>().to_string(),
                        found,
                    }
                }
                None => Error::Decoding(message),
            }
        })
    }
}
