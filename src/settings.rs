use crate::registry::TypeRegistry;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, OnceLock};

/// Which values carry a type tag.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub enum TypeNameHandling {
    /// Every struct is tagged.
    #[default]
    All,
    /// Only values declared through [`Poly`](crate::Poly) are tagged.
    Polymorphic,
}

/// What to do when the encoder reaches a [`Shared`](crate::Shared) node that is one of its own
/// ancestors.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ReferenceLoopHandling {
    /// Write the back-edge as `null`.
    #[default]
    Ignore,
    /// Fail with [`Error::Encoding`](crate::Error::Encoding).
    Error,
}

impl Display for TypeNameHandling {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeNameHandling::All => write!(f, "all"),
            TypeNameHandling::Polymorphic => write!(f, "polymorphic"),
        }
    }
}

impl Display for ReferenceLoopHandling {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceLoopHandling::Ignore => write!(f, "ignore"),
            ReferenceLoopHandling::Error => write!(f, "error"),
        }
    }
}

/// Immutable codec configuration. Dates are always written as ISO-8601 and numbers never depend
/// on the host locale, so neither is configurable.
#[derive(Debug, Default)]
pub struct Settings {
    type_name_handling: TypeNameHandling,
    reference_loop_handling: ReferenceLoopHandling,
    registry: TypeRegistry,
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// The process-wide default settings, built on first use.
    pub fn shared_default() -> Arc<Settings> {
        static DEFAULT: OnceLock<Arc<Settings>> = OnceLock::new();
        DEFAULT.get_or_init(|| Arc::new(Settings::default())).clone()
    }

    pub fn type_name_handling(&self) -> TypeNameHandling {
        self.type_name_handling
    }

    pub fn reference_loop_handling(&self) -> ReferenceLoopHandling {
        self.reference_loop_handling
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub(crate) fn tags_structs(&self) -> bool {
        self.type_name_handling == TypeNameHandling::All
    }
}

#[derive(Default)]
pub struct SettingsBuilder {
    type_name_handling: TypeNameHandling,
    reference_loop_handling: ReferenceLoopHandling,
    registry: TypeRegistry,
}

impl SettingsBuilder {
    pub fn with_type_name_handling(mut self, handling: TypeNameHandling) -> Self {
        self.type_name_handling = handling;
        self
    }

    pub fn with_reference_loop_handling(mut self, handling: ReferenceLoopHandling) -> Self {
        self.reference_loop_handling = handling;
        self
    }

    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn build(self) -> Settings {
        Settings {
            type_name_handling: self.type_name_handling,
            reference_loop_handling: self.reference_loop_handling,
            registry: self.registry,
        }
    }
}
