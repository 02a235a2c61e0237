//! Core container implementation

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, trace};

use crate::builder::ContainerBuilder;
use crate::component::Catalog;
use crate::error::DiResult;
use crate::graph::{InstanceGraphBuilder, ResolvedPlan};
use crate::lifetime::{LifetimeCache, ResolvedDescriptor, ScopeCache};
use crate::provider::ServiceProvider;
use crate::registry::Registry;
use crate::service::{Instance, TypeKey};

struct ContainerState {
    registry: RwLock<Registry>,
    /// Singletons plus the root scope's scoped instances
    cache: ScopeCache,
}

/// Thread-safe composition container
///
/// Cloning a container is cheap; clones share the registry and the caches.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerState>,
}

impl Container {
    /// Create a new container builder
    pub fn builder(catalog: Catalog) -> ContainerBuilder {
        ContainerBuilder::new(catalog)
    }

    pub(crate) fn from_registry(registry: Registry) -> Self {
        Self {
            inner: Arc::new(ContainerState {
                registry: RwLock::new(registry),
                cache: ScopeCache::new(),
            }),
        }
    }

    /// Run a configuration batch against the live registry.
    ///
    /// The batch is applied to a copy and committed only when every action
    /// succeeds. Cached instances of every family the batch touched are
    /// dropped from the root cache, so later resolutions see the new
    /// registrations decorated by the current rules.
    pub fn reconfigure<F>(&self, configure: F) -> DiResult<()>
    where
        F: FnOnce(&mut Registry) -> DiResult<()>,
    {
        let mut registry = self.inner.registry.write();
        let mut staged = registry.clone();
        staged.begin_batch();
        configure(&mut staged)?;

        let touched = staged.take_touched();
        *registry = staged;
        for service in &touched {
            self.inner.cache.evict(service);
        }
        info!(
            "Reconfiguration batch {} touched {} services",
            registry.batch(),
            touched.len()
        );
        Ok(())
    }

    /// Plan for a member of `service` without executing it
    pub fn plan_for(&self, service: &TypeKey, name: Option<&str>) -> DiResult<ResolvedPlan> {
        let registry = self.inner.registry.read();
        InstanceGraphBuilder::new(&registry).build(*service, name)
    }

    /// Outward name, lifetime and concrete type of the default `A`
    pub fn describe_default<A: ?Sized + 'static>(&self) -> DiResult<ResolvedDescriptor> {
        self.describe_default_key(&TypeKey::of::<A>())
    }

    pub fn describe_default_key(&self, service: &TypeKey) -> DiResult<ResolvedDescriptor> {
        self.inner.registry.read().describe(service, None)
    }

    /// Read access to the committed registry
    pub fn with_registry<R>(&self, inspect: impl FnOnce(&Registry) -> R) -> R {
        inspect(&self.inner.registry.read())
    }

    /// Create a scope with its own scoped instances
    pub fn create_scope(&self) -> Scope {
        Scope {
            container: self.clone(),
            cache: self.inner.cache.child(),
        }
    }

    fn resolve_in(
        &self,
        cache: &ScopeCache,
        service: &TypeKey,
        name: Option<&str>,
    ) -> DiResult<Instance> {
        // Executing under the read lock keeps a concurrent reconfigure from
        // evicting before this instance is cached.
        let registry = self.inner.registry.read();
        let resolved = InstanceGraphBuilder::new(&registry).build(*service, name)?;
        trace!("Resolving {} via {}", service, resolved.plan);
        resolved.plan.execute(cache)
    }

    fn resolve_all_in(&self, cache: &ScopeCache, service: &TypeKey) -> DiResult<Vec<Instance>> {
        let registry = self.inner.registry.read();
        InstanceGraphBuilder::new(&registry)
            .build_all(*service)?
            .iter()
            .map(|resolved| resolved.plan.execute(cache))
            .collect()
    }

    fn can_resolve(&self, service: &TypeKey) -> bool {
        self.inner.registry.read().lookup(service, None).is_ok()
    }
}

impl ServiceProvider for Container {
    fn resolve_instance(&self, service: &TypeKey, name: Option<&str>) -> DiResult<Instance> {
        self.resolve_in(&self.inner.cache, service, name)
    }

    fn resolve_all_instances(&self, service: &TypeKey) -> DiResult<Vec<Instance>> {
        self.resolve_all_in(&self.inner.cache, service)
    }

    fn has_service(&self, service: &TypeKey) -> bool {
        self.can_resolve(service)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registry", &*self.inner.registry.read())
            .field("cache", &self.inner.cache)
            .finish()
    }
}

/// A resolution scope: shares the container's registry and singletons and
/// keeps its own scoped instances
#[derive(Clone)]
pub struct Scope {
    container: Container,
    cache: ScopeCache,
}

impl Scope {
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Nested scope; singletons stay shared, scoped instances do not
    pub fn create_scope(&self) -> Scope {
        Scope {
            container: self.container.clone(),
            cache: self.cache.child(),
        }
    }
}

impl ServiceProvider for Scope {
    fn resolve_instance(&self, service: &TypeKey, name: Option<&str>) -> DiResult<Instance> {
        self.container.resolve_in(&self.cache, service, name)
    }

    fn resolve_all_instances(&self, service: &TypeKey) -> DiResult<Vec<Instance>> {
        self.container.resolve_all_in(&self.cache, service)
    }

    fn has_service(&self, service: &TypeKey) -> bool {
        self.container.can_resolve(service)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope").field("cache", &self.cache).finish()
    }
}
