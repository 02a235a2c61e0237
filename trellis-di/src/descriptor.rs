//! Implementation descriptors and registration options

use std::sync::Arc;

use crate::component::Component;
use crate::service::{ServiceLifetime, TypeKey, DEFAULT_NAME};

/// Identifier assigned to each registration
pub type DescriptorId = u64;

/// Id of descriptors synthesized by the concrete-type convention
pub(crate) const IMPLICIT_ID: DescriptorId = 0;

/// How a registration competes for the family default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultClaim {
    /// Becomes the default only when the family is empty
    #[default]
    IfFirst,
    /// Becomes the default regardless of earlier registrations
    Explicit,
}

/// Options accepted by `register` and `reconfigure`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterOptions {
    pub name: Option<String>,
    pub lifetime: ServiceLifetime,
    pub default: DefaultClaim,
}

impl RegisterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_lifetime(mut self, lifetime: ServiceLifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn transient(self) -> Self {
        self.with_lifetime(ServiceLifetime::Transient)
    }

    pub fn scoped(self) -> Self {
        self.with_lifetime(ServiceLifetime::Scoped)
    }

    pub fn singleton(self) -> Self {
        self.with_lifetime(ServiceLifetime::Singleton)
    }

    pub fn as_default(mut self) -> Self {
        self.default = DefaultClaim::Explicit;
        self
    }
}

/// Metadata for one registration of a concrete component against a service.
///
/// Decoration never touches a descriptor: the decorated view of a family
/// member is derived when a plan is built.
#[derive(Debug, Clone)]
pub struct ImplementationDescriptor {
    id: DescriptorId,
    service: TypeKey,
    component: Arc<Component>,
    name: String,
    lifetime: ServiceLifetime,
    is_default: bool,
}

impl ImplementationDescriptor {
    pub(crate) fn new(
        id: DescriptorId,
        service: TypeKey,
        component: Arc<Component>,
        options: &RegisterOptions,
    ) -> Self {
        Self {
            id,
            service,
            component,
            name: options
                .name
                .clone()
                .unwrap_or_else(|| DEFAULT_NAME.to_string()),
            lifetime: options.lifetime,
            is_default: false,
        }
    }

    /// Transient default for a concrete type that was never registered
    pub(crate) fn implicit(component: Arc<Component>) -> Self {
        Self {
            id: IMPLICIT_ID,
            service: component.key(),
            component,
            name: DEFAULT_NAME.to_string(),
            lifetime: ServiceLifetime::Transient,
            is_default: true,
        }
    }

    pub fn id(&self) -> DescriptorId {
        self.id
    }

    pub fn service(&self) -> TypeKey {
        self.service
    }

    pub fn component(&self) -> &Arc<Component> {
        &self.component
    }

    pub fn concrete_type(&self) -> TypeKey {
        self.component.key()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lifetime(&self) -> ServiceLifetime {
        self.lifetime
    }

    pub fn is_family_default(&self) -> bool {
        self.is_default
    }

    pub fn is_implicit(&self) -> bool {
        self.id == IMPLICIT_ID
    }

    pub(crate) fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }
}
