//! Registry: the owned configuration context
//!
//! A [`Registry`] holds the families and the decoration rules of one
//! container. It is mutated only inside configuration batches
//! (`ContainerBuilder::configure`, `Container::reconfigure`) and read by the
//! graph builder afterwards.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::component::{Catalog, Component};
use crate::decorator::{DecorationPolicy, DecoratorPolicySet};
use crate::descriptor::{DefaultClaim, DescriptorId, ImplementationDescriptor, RegisterOptions};
use crate::error::{DiError, DiResult};
use crate::family::{Family, FamilyRegistry};
use crate::lifetime::{mirror_identity, ResolvedDescriptor};
use crate::service::{ServiceLifetime, TypeKey};
use crate::ContainerOptions;

/// Families and decoration rules of one container
#[derive(Clone)]
pub struct Registry {
    catalog: Arc<Catalog>,
    families: FamilyRegistry,
    decorators: DecoratorPolicySet,
    options: ContainerOptions,
    next_id: DescriptorId,
    batch: u64,
    /// Services whose resolution changed since the last `take_touched`
    touched: FxHashSet<TypeKey>,
}

impl Registry {
    pub fn new(catalog: Arc<Catalog>, options: ContainerOptions) -> Self {
        Self {
            catalog,
            families: FamilyRegistry::new(),
            decorators: DecoratorPolicySet::new(),
            options,
            next_id: 1,
            batch: 0,
            touched: FxHashSet::default(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    pub fn families(&self) -> &FamilyRegistry {
        &self.families
    }

    pub fn family(&self, service: &TypeKey) -> Option<&Family> {
        self.families.get(service)
    }

    pub fn decorators(&self) -> &DecoratorPolicySet {
        &self.decorators
    }

    /// Sequence number of the current configuration batch
    pub fn batch(&self) -> u64 {
        self.batch
    }

    pub(crate) fn begin_batch(&mut self) {
        self.batch += 1;
    }

    pub(crate) fn take_touched(&mut self) -> FxHashSet<TypeKey> {
        std::mem::take(&mut self.touched)
    }

    /// Register `component` as an implementation of `service`
    pub fn register(
        &mut self,
        service: TypeKey,
        component: TypeKey,
        options: RegisterOptions,
    ) -> DiResult<DescriptorId> {
        let component = self.component(&component)?;
        if !component.satisfies(&service) {
            return Err(DiError::configuration(format!(
                "{} cannot be registered for {}: it does not implement {}",
                component.key(),
                service,
                service
            )));
        }
        if component.is_decorator() {
            return Err(DiError::configuration(format!(
                "{} declares an inner slot and can only be used as a decorator",
                component.key()
            )));
        }

        let id = self.next_id;
        self.next_id += 1;
        let descriptor = ImplementationDescriptor::new(id, service, component, &options);
        debug!(
            "Registered {} for {} as {} ({}, {:?})",
            descriptor.concrete_type(),
            service,
            descriptor.name(),
            descriptor.lifetime(),
            options.default
        );

        self.families
            .add(descriptor, options.default, self.batch, self.options.default_conflict);
        self.touched.insert(service);
        Ok(id)
    }

    /// Register after the container was built. Decoration for the family is
    /// derived again on the next resolution.
    pub fn reconfigure(
        &mut self,
        service: TypeKey,
        component: TypeKey,
        options: RegisterOptions,
    ) -> DiResult<DescriptorId> {
        let id = self.register(service, component, options)?;
        debug!(
            "Family {} changed; {} decorator rules will be applied again",
            service,
            self.decorators.rules_for(service).count()
        );
        Ok(id)
    }

    /// Wrap every member of `target` with `decorator`
    pub fn add_decorator(&mut self, target: TypeKey, decorator: TypeKey) -> DiResult<u64> {
        let component = self.component(&decorator)?;
        let order = self.decorators.add(target, component)?;
        self.touched.insert(target);
        Ok(order)
    }

    /// Apply every decoration a policy object declares
    pub fn decorate_with<P: DecorationPolicy>(&mut self, policy: P) -> DiResult<()> {
        for (target, decorator) in policy.decorations() {
            self.add_decorator(target, decorator)?;
        }
        Ok(())
    }

    /// Start a fluent expression for service `A`
    pub fn for_service<A: ?Sized + 'static>(&mut self) -> ServiceExpression<'_> {
        ServiceExpression {
            registry: self,
            service: TypeKey::of::<A>(),
        }
    }

    /// Register `T` as the transient default for `A`
    pub fn add_transient<A: ?Sized + 'static, T: 'static>(&mut self) -> DiResult<DescriptorId> {
        self.add_default::<A, T>(ServiceLifetime::Transient)
    }

    /// Register `T` as the scoped default for `A`
    pub fn add_scoped<A: ?Sized + 'static, T: 'static>(&mut self) -> DiResult<DescriptorId> {
        self.add_default::<A, T>(ServiceLifetime::Scoped)
    }

    /// Register `T` as the singleton default for `A`
    pub fn add_singleton<A: ?Sized + 'static, T: 'static>(&mut self) -> DiResult<DescriptorId> {
        self.add_default::<A, T>(ServiceLifetime::Singleton)
    }

    fn add_default<A: ?Sized + 'static, T: 'static>(
        &mut self,
        lifetime: ServiceLifetime,
    ) -> DiResult<DescriptorId> {
        self.reconfigure(
            TypeKey::of::<A>(),
            TypeKey::of::<T>(),
            RegisterOptions::new().with_lifetime(lifetime).as_default(),
        )
    }

    /// Registered descriptor for `service`; `None` selects the default.
    ///
    /// A service nobody registered that is itself a catalog component resolves
    /// to that component as a transient default.
    pub fn lookup(
        &self,
        service: &TypeKey,
        name: Option<&str>,
    ) -> DiResult<ImplementationDescriptor> {
        match self.families.lookup(service, name) {
            Ok(descriptor) => Ok(descriptor.clone()),
            Err(error) => {
                if name.is_some() || self.families.contains(service) {
                    return Err(error);
                }
                match self.catalog.get(service) {
                    Some(component) if !component.is_decorator() => {
                        Ok(ImplementationDescriptor::implicit(component.clone()))
                    }
                    _ => Err(error),
                }
            }
        }
    }

    /// Outward identity of a member: the outermost decorator type carrying
    /// the base registration's name and lifetime. No plan is built, so
    /// unresolvable decorator dependencies do not affect the answer.
    pub fn describe(
        &self,
        service: &TypeKey,
        name: Option<&str>,
    ) -> DiResult<ResolvedDescriptor> {
        let base = self.lookup(service, name)?;
        if !self.decorators.has_rules_for(*service) {
            return Ok(ResolvedDescriptor::undecorated(&base));
        }
        let decorators = self
            .decorators
            .rules_for(*service)
            .map(|rule| rule.decorator_type())
            .collect();
        Ok(mirror_identity(
            &base,
            ResolvedDescriptor::decorated(&base, decorators),
        ))
    }

    fn component(&self, key: &TypeKey) -> DiResult<Arc<Component>> {
        self.catalog.get(key).cloned().ok_or_else(|| {
            DiError::configuration(format!("{} is not in the component catalog", key))
        })
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("families", &self.families.len())
            .field("decorators", &self.decorators.len())
            .field("batch", &self.batch)
            .field("options", &self.options)
            .finish()
    }
}

/// Fluent configuration for one service
pub struct ServiceExpression<'r> {
    registry: &'r mut Registry,
    service: TypeKey,
}

impl<'r> ServiceExpression<'r> {
    /// Use `T` as the default implementation
    pub fn use_type<T: 'static>(self) -> InstanceExpression<'r> {
        self.instance(TypeKey::of::<T>(), DefaultClaim::Explicit)
    }

    /// Add `T` to the family; it becomes the default only if it is the first
    pub fn add_type<T: 'static>(self) -> InstanceExpression<'r> {
        self.instance(TypeKey::of::<T>(), DefaultClaim::IfFirst)
    }

    /// Wrap every member of the family with `D`
    pub fn decorate_all_with<D: 'static>(self) -> DiResult<u64> {
        self.registry
            .add_decorator(self.service, TypeKey::of::<D>())
    }

    fn instance(self, component: TypeKey, claim: DefaultClaim) -> InstanceExpression<'r> {
        InstanceExpression {
            registry: self.registry,
            service: self.service,
            component,
            options: RegisterOptions {
                default: claim,
                ..RegisterOptions::default()
            },
        }
    }
}

/// A pending registration; nothing is recorded until [`register`](Self::register)
#[must_use = "call register() to record the registration"]
pub struct InstanceExpression<'r> {
    registry: &'r mut Registry,
    service: TypeKey,
    component: TypeKey,
    options: RegisterOptions,
}

impl<'r> InstanceExpression<'r> {
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.options = self.options.named(name);
        self
    }

    pub fn lifetime(mut self, lifetime: ServiceLifetime) -> Self {
        self.options = self.options.with_lifetime(lifetime);
        self
    }

    pub fn transient(self) -> Self {
        self.lifetime(ServiceLifetime::Transient)
    }

    pub fn scoped(self) -> Self {
        self.lifetime(ServiceLifetime::Scoped)
    }

    pub fn singleton(self) -> Self {
        self.lifetime(ServiceLifetime::Singleton)
    }

    pub fn register(self) -> DiResult<DescriptorId> {
        self.registry
            .register(self.service, self.component, self.options)
    }
}
