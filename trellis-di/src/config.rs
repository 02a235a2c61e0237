//! Configuration-based registration
//!
//! Services, implementations and decorators are named by the short type names
//! the [`Catalog`](crate::component::Catalog) indexes, e.g. `"Widget"` for
//! `dyn Widget` and `"AWidget"` for the struct.

use serde::{Deserialize, Serialize};

use crate::descriptor::RegisterOptions;
use crate::error::{DiError, DiResult};
use crate::registry::Registry;
use crate::service::{ServiceLifetime, TypeKey};
use crate::ContainerOptions;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service type name
    pub service_type: String,
    /// Implementation type name
    pub implementation_type: String,
    #[serde(default)]
    pub lifetime: ServiceLifetime,
    /// Instance name; `"Default"` when omitted
    #[serde(default)]
    pub name: Option<String>,
    /// Claim the family default even if the family already has one
    #[serde(default)]
    pub default: bool,
}

/// Decorator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoratorConfig {
    /// Service type name
    pub service_type: String,
    /// Decorator type name
    pub decorator_type: String,
}

/// Container configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerConfig {
    #[serde(default)]
    pub options: Option<ContainerOptions>,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
    /// Decorators in declaration order
    #[serde(default)]
    pub decorators: Vec<DecoratorConfig>,
}

impl ContainerConfig {
    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> DiResult<Self> {
        toml::from_str(toml_str)
            .map_err(|e| DiError::ConfigError(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration from JSON string
    pub fn from_json(json_str: &str) -> DiResult<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| DiError::ConfigError(format!("Failed to parse JSON: {}", e)))
    }

    /// Record every service and decorator in `registry`
    pub fn apply(&self, registry: &mut Registry) -> DiResult<()> {
        for service in &self.services {
            let abstraction = service_key(registry, &service.service_type)?;
            let implementation = component_key(registry, &service.implementation_type)?;

            let mut options = RegisterOptions::new().with_lifetime(service.lifetime);
            if let Some(name) = &service.name {
                options = options.named(name.clone());
            }
            if service.default {
                options = options.as_default();
            }
            registry.register(abstraction, implementation, options)?;
        }

        for decorator in &self.decorators {
            let target = service_key(registry, &decorator.service_type)?;
            let decorator = component_key(registry, &decorator.decorator_type)?;
            registry.add_decorator(target, decorator)?;
        }
        Ok(())
    }
}

fn service_key(registry: &Registry, name: &str) -> DiResult<TypeKey> {
    registry
        .catalog()
        .service_named(name)
        .ok_or_else(|| DiError::ConfigError(format!("Unknown service type: {}", name)))
}

fn component_key(registry: &Registry, name: &str) -> DiResult<TypeKey> {
    registry
        .catalog()
        .component_named(name)
        .map(|component| component.key())
        .ok_or_else(|| DiError::ConfigError(format!("Unknown implementation type: {}", name)))
}
