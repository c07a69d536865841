use crate::document::{self, probe};
use crate::scope;
use serde::de::{DeserializeOwned, Error as _};
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::any::{type_name, Any};
use std::fmt::{Debug, Formatter};
use std::ops::{Deref, DerefMut};

/// A value whose concrete type can be written out and found again through its type tag.
///
/// Implemented for every sized type that serde can both write and read. Traits meant to be used
/// as polymorphic bases (`Poly<dyn Shape>`) take it as a supertrait:
///
/// ```
/// # use polycodec::Entity;
/// trait Shape: Entity {
///     fn area(&self) -> f64;
/// }
/// ```
pub trait Entity: Any + Debug + Send + Sync {
    /// The tag written next to this value, i.e. its serde container name.
    fn type_tag(&self) -> &'static str;

    fn to_document(&self, tags: bool) -> Result<Value, serde_json::Error>;

    fn as_any(&self) -> &dyn Any;
}

impl<T> Entity for T
where
    T: Serialize + DeserializeOwned + Any + Debug + Send + Sync,
{
    fn type_tag(&self) -> &'static str {
        probe::container_name::<T>().unwrap_or_else(type_name::<T>)
    }

    fn to_document(&self, tags: bool) -> Result<Value, serde_json::Error> {
        document::to_document(self, tags)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn Entity {
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        Entity::as_any(self).downcast_ref()
    }

    pub fn is<T: Any>(&self) -> bool {
        Entity::as_any(self).is::<T>()
    }
}

/// A value declared through its abstract base `B` (a trait object such as `dyn Shape`).
///
/// It is always written with the tag of its concrete type, and read back into that concrete
/// type through the [`TypeRegistry`](crate::TypeRegistry) of the codec in use.
pub struct Poly<B: ?Sized>(Box<B>);

/// Any registered type.
pub type AnyEntity = Poly<dyn Entity>;

impl<B: ?Sized> Poly<B> {
    pub fn new(value: Box<B>) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> Box<B> {
        self.0
    }
}

// `Poly<B>` is an `Entity` itself; these shadow the blanket methods so that calls reach the
// wrapped value.
impl<B: ?Sized + Entity> Poly<B> {
    pub fn type_tag(&self) -> &'static str {
        Entity::type_tag(&*self.0)
    }

    pub fn as_any(&self) -> &dyn Any {
        Entity::as_any(&*self.0)
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

impl<B: ?Sized> From<Box<B>> for Poly<B> {
    fn from(value: Box<B>) -> Self {
        Self(value)
    }
}

impl<B: ?Sized> Deref for Poly<B> {
    type Target = B;

    fn deref(&self) -> &B {
        &self.0
    }
}

impl<B: ?Sized> DerefMut for Poly<B> {
    fn deref_mut(&mut self) -> &mut B {
        &mut self.0
    }
}

impl<B> Debug for Poly<B>
where
    B: ?Sized + Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Poly").field(&&*self.0).finish()
    }
}

impl<B> Serialize for Poly<B>
where
    B: ?Sized + Entity,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let value: &B = &self.0;
        let tags = scope::settings().tags_structs();
        let document = Entity::to_document(value, tags).map_err(S::Error::custom)?;
        serializer.serialize_newtype_struct(
            document::DOCUMENT_TOKEN,
            &document::attach_tag(document, Entity::type_tag(value)),
        )
    }
}

impl<'de, B> Deserialize<'de> for Poly<B>
where
    B: ?Sized + 'static,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let document = Value::deserialize(deserializer)?;
        match scope::settings().registry().resolve::<B>(document) {
            Ok(value) => Ok(Poly(value)),
            Err(e) => Err(D::Error::custom(scope::fail(e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::entity::{AnyEntity, Entity, Poly};
    use crate::registry::TypeRegistry;
    use crate::scope::Scope;
    use crate::settings::Settings;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Dog {
        name: String,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    enum Color {
        Red,
        Green,
    }

    fn scope() -> Scope {
        let registry = TypeRegistry::builder()
            .register::<Dog>()
            .register::<Color>()
            .build()
            .unwrap();
        Scope::enter(Arc::new(Settings::builder().with_registry(registry).build()))
    }

    #[test]
    fn type_tag() {
        let dog = Dog {
            name: "Rex".to_string(),
        };
        assert_eq!(dog.type_tag(), "Dog");
        assert_eq!(5u8.type_tag(), "u8");
    }

    #[test]
    fn serialize_struct() {
        let _scope = scope();
        let value: AnyEntity = Poly::new(Box::new(Dog {
            name: "Rex".to_string(),
        }));

        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({"$type": "Dog", "name": "Rex"})
        );
    }

    #[test]
    fn serialize_enum() {
        let _scope = scope();
        let value: AnyEntity = Poly::new(Box::new(Color::Green));

        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({"$type": "Color", "$value": "Green"})
        );
    }

    #[test]
    fn deserialize() {
        let _scope = scope();

        let value: AnyEntity =
            serde_json::from_value(json!({"$type": "Dog", "name": "Rex"})).unwrap();
        assert_eq!(
            value.downcast_ref::<Dog>(),
            Some(&Dog {
                name: "Rex".to_string()
            })
        );

        let value: AnyEntity =
            serde_json::from_value(json!({"$type": "Color", "$value": "Red"})).unwrap();
        assert!(value.is::<Color>());
    }

    #[test]
    fn deserialize_unknown_tag() {
        let scope = scope();

        let error =
            serde_json::from_value::<AnyEntity>(json!({"$type": "Cat", "name": "Tom"}))
                .unwrap_err();

        assert!(scope.take_failure(&error.to_string()).is_some());
    }
}
