//! Object composition with decorators for Trellis
//!
//! This crate provides a dependency injection container that composes object
//! graphs from a catalog of components. Implementations are grouped into
//! families per service, and decoration rules wrap every member of a family,
//! including members registered after the rules were declared.
//!
//! ```ignore
//! let container = ContainerBuilder::new(catalog)
//!     .configure(|registry| {
//!         registry.for_service::<dyn Widget>().decorate_all_with::<WidgetHolder>()?;
//!         registry.for_service::<dyn Widget>().use_type::<AWidget>().register()?;
//!         Ok(())
//!     })?
//!     .build();
//!
//! let widget = container.resolve::<dyn Widget>()?; // WidgetHolder(AWidget)
//! ```

use serde::{Deserialize, Serialize};

pub mod builder;
pub mod component;
pub mod container;
pub mod decorator;
pub mod descriptor;
pub mod error;
pub mod family;
pub mod graph;
pub mod lifetime;
pub mod plan;
pub mod provider;
pub mod registry;
pub mod service;

#[cfg(feature = "config")]
pub mod config;

pub use builder::{ContainerBuilder, Module};
pub use component::{Arguments, Catalog, Component, Slot};
pub use container::{Container, Scope};
pub use decorator::{DecorationPolicy, DecoratorPolicy, DecoratorPolicySet, DecoratorRule};
pub use descriptor::{DefaultClaim, DescriptorId, ImplementationDescriptor, RegisterOptions};
pub use error::{DiError, DiResult};
pub use family::{DefaultConflictPolicy, Family, FamilyRegistry};
pub use graph::{InstanceGraphBuilder, ResolvedPlan};
pub use lifetime::{mirror_identity, InstanceKey, LifetimeCache, ResolvedDescriptor, ScopeCache};
pub use plan::Plan;
pub use provider::ServiceProvider;
pub use registry::{InstanceExpression, Registry, ServiceExpression};
pub use service::{Instance, Service, ServiceLifetime, TypeKey, DEFAULT_NAME};

#[cfg(feature = "config")]
pub use config::{ContainerConfig, DecoratorConfig, ServiceConfig};

/// Engine settings fixed when a container is built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// Longest chain of nested resolutions before giving up
    pub max_depth: usize,
    /// How competing explicit default claims are settled
    pub default_conflict: DefaultConflictPolicy,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            max_depth: 64,
            default_conflict: DefaultConflictPolicy::LastWriteWins,
        }
    }
}

/// Prelude module for common imports
pub mod prelude {
    pub use crate::{
        Arguments, Catalog, Container, ContainerBuilder, ContainerOptions, DecoratorPolicy,
        DefaultConflictPolicy, DiError, DiResult, Module, Registry, Scope, ServiceLifetime,
        ServiceProvider, TypeKey,
    };

    #[cfg(feature = "config")]
    pub use crate::ContainerConfig;
}
