//! Container builder for batched configuration

use std::sync::Arc;

use tracing::info;

use crate::component::Catalog;
use crate::container::Container;
use crate::error::DiResult;
use crate::registry::Registry;
use crate::ContainerOptions;

#[cfg(feature = "config")]
use crate::config::ContainerConfig;

/// Builder for constructing a container
pub struct ContainerBuilder {
    registry: Registry,
}

impl ContainerBuilder {
    /// Create a new container builder
    pub fn new(catalog: Catalog) -> Self {
        Self::with_options(catalog, ContainerOptions::default())
    }

    pub fn with_options(catalog: Catalog, options: ContainerOptions) -> Self {
        Self {
            registry: Registry::new(Arc::new(catalog), options),
        }
    }

    /// Create a builder from a configuration file; its options replace the
    /// defaults and its registrations form the first batch
    #[cfg(feature = "config")]
    pub fn from_config(catalog: Catalog, config: &ContainerConfig) -> DiResult<Self> {
        let options = config.options.clone().unwrap_or_default();
        Self::with_options(catalog, options).apply_config(config)
    }

    /// Run one configuration batch. Nothing is recorded unless every action
    /// succeeds.
    pub fn configure<F>(mut self, configure: F) -> DiResult<Self>
    where
        F: FnOnce(&mut Registry) -> DiResult<()>,
    {
        let mut staged = self.registry.clone();
        staged.begin_batch();
        configure(&mut staged)?;
        self.registry = staged;
        Ok(self)
    }

    /// Add services from a module as one batch
    pub fn add_module<M: Module>(self, module: M) -> DiResult<Self> {
        self.configure(|registry| module.configure(registry))
    }

    /// Apply a parsed configuration file as one batch
    #[cfg(feature = "config")]
    pub fn apply_config(self, config: &ContainerConfig) -> DiResult<Self> {
        self.configure(|registry| config.apply(registry))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Build the container
    pub fn build(mut self) -> Container {
        self.registry.take_touched();
        info!(
            "Built container with {} families and {} decorator rules",
            self.registry.families().len(),
            self.registry.decorators().len()
        );
        Container::from_registry(self.registry)
    }
}

/// A reusable group of registrations
pub trait Module {
    fn configure(&self, registry: &mut Registry) -> DiResult<()>;
}

impl<F> Module for F
where
    F: Fn(&mut Registry) -> DiResult<()>,
{
    fn configure(&self, registry: &mut Registry) -> DiResult<()> {
        self(registry)
    }
}
