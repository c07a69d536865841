use crate::document::{self, probe};
use crate::entity::Entity;
use crate::Error;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

type DecodeFn = fn(Value) -> Result<Box<dyn Any>, serde_json::Error>;
type UpcastFn = Box<dyn Fn(Box<dyn Any>) -> Option<Box<dyn Any>> + Send + Sync>;

struct Registration {
    type_id: TypeId,
    type_name: &'static str,
    decode: DecodeFn,
    /// Conversions to the bases this type may be read as, keyed by the base's type id.
    upcasts: HashMap<TypeId, UpcastFn>,
}

fn decode<T>(document: Value) -> Result<Box<dyn Any>, serde_json::Error>
where
    T: DeserializeOwned + Any,
{
    document::from_document::<T>(document).map(|value| Box::new(value) as Box<dyn Any>)
}

fn upcast<B, T>(f: fn(Box<T>) -> Box<B>) -> UpcastFn
where
    B: ?Sized + 'static,
    T: Any,
{
    Box::new(move |value: Box<dyn Any>| {
        value
            .downcast::<T>()
            .ok()
            .map(|value| Box::new(f(value)) as Box<dyn Any>)
    })
}

/// Maps type tags to the concrete types they stand for, and records which polymorphic bases
/// each type may be read as. Built once and never modified afterwards.
#[derive(Default)]
pub struct TypeRegistry {
    types: HashMap<&'static str, Registration>,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.keys().copied()
    }

    /// Reads `document` as the concrete type named by its tag, seen through its base `B`.
    pub fn resolve<B>(&self, document: Value) -> Result<Box<B>, Error>
    where
        B: ?Sized + 'static,
    {
        let tag = document::type_tag(&document)
            .ok_or_else(|| Error::Decoding("missing type tag".to_string()))?
            .to_string();

        let registration = self
            .types
            .get(tag.as_str())
            .ok_or_else(|| Error::Decoding(format!("unknown type tag `{}`", tag)))?;

        let upcast = registration
            .upcasts
            .get(&TypeId::of::<B>())
            .ok_or_else(|| Error::TypeMismatch {
                expected: type_name::<B>().to_string(),
                found: tag.clone(),
            })?;

        let value = (registration.decode)(document::detach_tag(document))
            .map_err(|e| Error::Decoding(format!("invalid `{}`: {}", tag, e)))?;

        upcast(value)
            .and_then(|value| value.downcast::<Box<B>>().ok())
            .map(|value| *value)
            .ok_or_else(|| Error::TypeMismatch {
                expected: type_name::<B>().to_string(),
                found: registration.type_name.to_string(),
            })
    }
}

impl Debug for TypeRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut tags = self.types.keys().collect::<Vec<_>>();
        tags.sort_unstable();
        f.debug_struct("TypeRegistry").field("types", &tags).finish()
    }
}

#[derive(Default)]
pub struct TypeRegistryBuilder {
    types: HashMap<&'static str, Registration>,
    errors: Vec<String>,
}

impl TypeRegistryBuilder {
    /// Registers `T` under its serde container name. Every registered type can be read as
    /// `Poly<dyn Entity>`.
    pub fn register<T>(mut self) -> Self
    where
        T: Entity + DeserializeOwned,
    {
        self.registration::<T>();
        self
    }

    /// Registers `T` and declares it readable through the base `B`:
    ///
    /// ```
    /// # use polycodec::{Entity, TypeRegistry};
    /// # use serde::{Deserialize, Serialize};
    /// trait Shape: Entity {}
    ///
    /// #[derive(Debug, Serialize, Deserialize)]
    /// struct Circle {
    ///     radius: f64,
    /// }
    ///
    /// impl Shape for Circle {}
    ///
    /// let registry = TypeRegistry::builder()
    ///     .register_as::<dyn Shape, Circle>(|circle| circle)
    ///     .build()
    ///     .unwrap();
    /// assert!(registry.contains("Circle"));
    /// ```
    pub fn register_as<B, T>(mut self, f: fn(Box<T>) -> Box<B>) -> Self
    where
        B: ?Sized + 'static,
        T: Entity + DeserializeOwned,
    {
        if let Some(registration) = self.registration::<T>() {
            registration.upcasts.insert(TypeId::of::<B>(), upcast(f));
        }
        self
    }

    fn registration<T>(&mut self) -> Option<&mut Registration>
    where
        T: Entity + DeserializeOwned,
    {
        let Some(tag) = probe::container_name::<T>() else {
            self.errors.push(format!(
                "`{}` has no type name and cannot be registered",
                type_name::<T>()
            ));
            return None;
        };

        let registration = self.types.entry(tag).or_insert_with(|| {
            let mut upcasts = HashMap::new();
            upcasts.insert(
                TypeId::of::<dyn Entity>(),
                upcast::<dyn Entity, T>(|value| value),
            );
            Registration {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                decode: decode::<T>,
                upcasts,
            }
        });

        if registration.type_id != TypeId::of::<T>() {
            self.errors.push(format!(
                "type tag `{}` is claimed by both `{}` and `{}`",
                tag,
                registration.type_name,
                type_name::<T>()
            ));
            return None;
        }

        Some(registration)
    }

    pub fn build(self) -> Result<TypeRegistry, Error> {
        if !self.errors.is_empty() {
            return Err(Error::Registration(self.errors.join("; ")));
        }
        Ok(TypeRegistry { types: self.types })
    }
}
