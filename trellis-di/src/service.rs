//! Service identities, lifetimes and erased instances

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use downcast_rs::{impl_downcast, DowncastSync};
use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};

/// Name given to registrations that do not set one explicitly
pub const DEFAULT_NAME: &str = "Default";

/// Service lifetime determines how services are created and cached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceLifetime {
    /// A new instance is created for each request
    #[default]
    Transient,
    /// A single instance is created and reused within a scope
    Scoped,
    /// A single instance is created and reused for the container lifetime
    Singleton,
}

impl fmt::Display for ServiceLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceLifetime::Transient => write!(f, "Transient"),
            ServiceLifetime::Scoped => write!(f, "Scoped"),
            ServiceLifetime::Singleton => write!(f, "Singleton"),
        }
    }
}

/// Trait that every built value satisfies
pub trait Service: DowncastSync {}

impl_downcast!(sync Service);

/// Blanket implementation for all suitable types
impl<T: Any + Send + Sync> Service for T {}

/// A built value with its type erased.
///
/// For a concrete component the erased value is the component itself. Once a
/// value has been upcast to an abstraction `A` the erased value is an `Arc<A>`.
pub type Instance = Arc<dyn Service>;

/// Identity of a type used as a registry key.
///
/// Abstractions are usually trait objects (`TypeKey::of::<dyn Widget>()`),
/// concrete components are plain types. Equality and hashing only look at the
/// `TypeId`; the name is carried for diagnostics and configuration files.
#[derive(Clone, Copy)]
pub struct TypeKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl TypeKey {
    /// Key for `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name as reported by the compiler
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Unqualified name, e.g. `Widget` for `dyn my_app::widgets::Widget`
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.type_name)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Strip `dyn `, generic arguments and the module path from a type name
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let name = full.strip_prefix("dyn ").unwrap_or(full);
    let name = match name.find('<') {
        Some(index) => &name[..index],
        None => name,
    };
    let name = match name.find(" + ") {
        Some(index) => &name[..index],
        None => name,
    };
    match name.rfind("::") {
        Some(index) => &name[index + 2..],
        None => name,
    }
}

/// Recover the `Arc<A>` stored in an instance upcast to `A`
pub(crate) fn downcast_service<A>(instance: &Instance, service: &TypeKey) -> DiResult<Arc<A>>
where
    A: ?Sized + Send + Sync + 'static,
{
    instance
        .downcast_ref::<Arc<A>>()
        .cloned()
        .ok_or_else(|| {
            DiError::creation_failed(
                service.type_name(),
                format!("instance is not a {}", std::any::type_name::<A>()),
            )
        })
}
