//! Lifetime resolution and instance caching

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::descriptor::ImplementationDescriptor;
use crate::error::DiResult;
use crate::service::{Instance, ServiceLifetime, TypeKey};

/// The outward view of a family member after decoration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDescriptor {
    /// Service the descriptor was resolved for
    pub service: TypeKey,
    /// Name reported to observers
    pub name: String,
    /// Lifetime reported to observers
    pub lifetime: ServiceLifetime,
    /// Type of the outermost instance
    pub concrete_type: TypeKey,
    /// Type of the undecorated implementation
    pub implementation_type: TypeKey,
    /// Decorators applied, innermost first
    pub decorators: Vec<TypeKey>,
}

impl ResolvedDescriptor {
    pub fn undecorated(base: &ImplementationDescriptor) -> Self {
        Self {
            service: base.service(),
            name: base.name().to_string(),
            lifetime: base.lifetime(),
            concrete_type: base.concrete_type(),
            implementation_type: base.concrete_type(),
            decorators: Vec::new(),
        }
    }

    /// Descriptor of a decorator chain carrying the outermost decorator's own
    /// identity. Pass it through [`mirror_identity`] before exposing it.
    pub(crate) fn decorated(base: &ImplementationDescriptor, decorators: Vec<TypeKey>) -> Self {
        let concrete_type = decorators
            .last()
            .copied()
            .unwrap_or_else(|| base.concrete_type());
        Self {
            service: base.service(),
            name: concrete_type.short_name().to_string(),
            lifetime: ServiceLifetime::Transient,
            concrete_type,
            implementation_type: base.concrete_type(),
            decorators,
        }
    }

    pub fn is_decorated(&self) -> bool {
        !self.decorators.is_empty()
    }
}

/// Copy the base registration's name and lifetime onto the outward
/// descriptor. The base is left untouched.
pub fn mirror_identity(
    base: &ImplementationDescriptor,
    outward: ResolvedDescriptor,
) -> ResolvedDescriptor {
    ResolvedDescriptor {
        name: base.name().to_string(),
        lifetime: base.lifetime(),
        ..outward
    }
}

/// Cache key for a built instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    pub service: TypeKey,
    pub name: String,
}

impl InstanceKey {
    pub fn new(service: TypeKey, name: impl Into<String>) -> Self {
        Self {
            service,
            name: name.into(),
        }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.service, self.name)
    }
}

/// Storage for scoped and singleton instances
pub trait LifetimeCache: Send + Sync {
    /// Return the cached instance for `key` or build one with `create` and
    /// cache it according to `lifetime`
    fn get_or_create(
        &self,
        key: &InstanceKey,
        lifetime: ServiceLifetime,
        create: &mut dyn FnMut() -> DiResult<Instance>,
    ) -> DiResult<Instance>;

    /// Drop every cached instance of `service`
    fn evict(&self, service: &TypeKey);
}

type InstanceMap = Arc<RwLock<FxHashMap<InstanceKey, Instance>>>;

/// Default cache: singletons are shared with every child scope, scoped
/// instances belong to one scope
#[derive(Clone, Default)]
pub struct ScopeCache {
    singletons: InstanceMap,
    scoped: InstanceMap,
}

impl ScopeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache for a new scope sharing this cache's singletons
    pub fn child(&self) -> Self {
        Self {
            singletons: self.singletons.clone(),
            scoped: InstanceMap::default(),
        }
    }

    pub fn singleton_count(&self) -> usize {
        self.singletons.read().len()
    }

    pub fn scoped_count(&self) -> usize {
        self.scoped.read().len()
    }
}

impl LifetimeCache for ScopeCache {
    fn get_or_create(
        &self,
        key: &InstanceKey,
        lifetime: ServiceLifetime,
        create: &mut dyn FnMut() -> DiResult<Instance>,
    ) -> DiResult<Instance> {
        let store = match lifetime {
            ServiceLifetime::Transient => return create(),
            ServiceLifetime::Scoped => &self.scoped,
            ServiceLifetime::Singleton => &self.singletons,
        };

        if let Some(existing) = store.read().get(key).cloned() {
            trace!("Cache hit for {} instance {}", lifetime, key);
            return Ok(existing);
        }

        // Built without holding the lock; dependencies may hit the same store
        let created = create()?;
        let mut store = store.write();
        let instance = store.entry(key.clone()).or_insert(created).clone();
        trace!("Cached {} instance {}", lifetime, key);
        Ok(instance)
    }

    fn evict(&self, service: &TypeKey) {
        self.singletons.write().retain(|key, _| key.service != *service);
        self.scoped.write().retain(|key, _| key.service != *service);
    }
}

impl fmt::Debug for ScopeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeCache")
            .field("singletons", &self.singleton_count())
            .field("scoped", &self.scoped_count())
            .finish()
    }
}
