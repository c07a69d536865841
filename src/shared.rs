use crate::scope::{self, Scope};
use crate::settings::ReferenceLoopHandling;
use crate::Error;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{trace, warn};

/// A node of an object graph that may be referenced from several places, including from its
/// own descendants.
///
/// When encoding reaches a node that is one of its own ancestors, the back-edge is written as
/// `null` (or rejected, see [`ReferenceLoopHandling`]), so fields that close a cycle must be
/// declared as `Option<Shared<T>>` and come back as `None`. A node reached twice along
/// different paths is not a cycle and is written twice.
pub struct Shared<T>(Arc<RwLock<T>>);

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether both handles point to the same node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Debug for Shared<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // contents are skipped: they may lead back to this node
        write!(f, "Shared({:#x})", self.address())
    }
}

impl<T> Serialize for Shared<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let _scope = Scope::ensure();
        let address = self.address();

        if !scope::enter_node(address) {
            return match scope::settings().reference_loop_handling() {
                ReferenceLoopHandling::Ignore => {
                    trace!(node = address, "dropping reference loop");
                    serializer.serialize_none()
                }
                ReferenceLoopHandling::Error => {
                    warn!(node = address, "reference loop detected");
                    let error = Error::Encoding(format!(
                        "reference loop detected for node {:#x}",
                        address
                    ));
                    Err(S::Error::custom(scope::fail(error)))
                }
            };
        }

        let result = self.read().serialize(serializer);
        scope::leave_node(address);
        result
    }
}

impl<'de, T> Deserialize<'de> for Shared<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Shared::new)
    }
}
