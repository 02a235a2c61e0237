//! Service provider interface

use std::sync::Arc;

use crate::error::DiResult;
use crate::service::{downcast_service, Instance, TypeKey};

/// Anything that can hand out resolved services
pub trait ServiceProvider: Send + Sync {
    /// Resolve the member of `service` registered as `name`, or the default
    fn resolve_instance(&self, service: &TypeKey, name: Option<&str>) -> DiResult<Instance>;

    /// Resolve every registered member of `service`, in registration order
    fn resolve_all_instances(&self, service: &TypeKey) -> DiResult<Vec<Instance>>;

    /// Check if `service` can be resolved without naming a member
    fn has_service(&self, service: &TypeKey) -> bool;

    /// Resolve the default `A`
    fn resolve<A>(&self) -> DiResult<Arc<A>>
    where
        A: ?Sized + Send + Sync + 'static,
        Self: Sized,
    {
        let service = TypeKey::of::<A>();
        downcast_service(&self.resolve_instance(&service, None)?, &service)
    }

    /// Resolve the `A` registered as `name`
    fn resolve_named<A>(&self, name: &str) -> DiResult<Arc<A>>
    where
        A: ?Sized + Send + Sync + 'static,
        Self: Sized,
    {
        let service = TypeKey::of::<A>();
        downcast_service(&self.resolve_instance(&service, Some(name))?, &service)
    }

    /// Resolve every `A`
    fn resolve_all<A>(&self) -> DiResult<Vec<Arc<A>>>
    where
        A: ?Sized + Send + Sync + 'static,
        Self: Sized,
    {
        let service = TypeKey::of::<A>();
        self.resolve_all_instances(&service)?
            .iter()
            .map(|instance| downcast_service(instance, &service))
            .collect()
    }

    fn has<A: ?Sized + 'static>(&self) -> bool
    where
        Self: Sized,
    {
        self.has_service(&TypeKey::of::<A>())
    }
}
