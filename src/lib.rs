//! Type-tagged object codec.
//!
//! [`Codec`] writes any serde value to JSON text or BSON (and MessagePack), recording the
//! concrete type of each value so that polymorphic fields ([`Poly`]) come back as the type they
//! were, and cutting reference loops between [`Shared`] nodes instead of recursing forever.

pub mod codec;
pub mod document;
pub mod entity;
pub mod registry;
mod scope;
pub mod serialize;
pub mod settings;
pub mod shared;
pub mod values;

pub use codec::Codec;
pub use entity::{AnyEntity, Entity, Poly};
pub use registry::{TypeRegistry, TypeRegistryBuilder};
pub use serialize::Format;
pub use settings::{ReferenceLoopHandling, Settings, SettingsBuilder, TypeNameHandling};
pub use shared::Shared;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not encode value: {0}")]
    Encoding(String),

    #[error("Could not decode value: {0}")]
    Decoding(String),

    #[error("Could not parse text: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Expected a `{expected}`, found a `{found}`")]
    TypeMismatch { expected: String, found: String },

    #[error("Invalid type registration: {0}")]
    Registration(String),
}
