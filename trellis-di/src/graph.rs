//! Instance graph builder
//!
//! Turns a registry lookup into a [`Plan`]. Decoration is derived here on
//! every build from the family's descriptor and the current decoration rules,
//! so registrations and rules can be declared in any order.

use std::sync::Arc;

use tracing::trace;

use crate::component::{Component, Slot};
use crate::descriptor::ImplementationDescriptor;
use crate::error::{DiError, DiResult};
use crate::lifetime::{mirror_identity, InstanceKey, ResolvedDescriptor};
use crate::plan::{Plan, PlanArgument};
use crate::registry::Registry;
use crate::service::TypeKey;

/// A plan together with the outward descriptor of its root
#[derive(Debug, Clone)]
pub struct ResolvedPlan {
    pub descriptor: ResolvedDescriptor,
    pub plan: Plan,
}

/// Builds plans against one registry snapshot
pub struct InstanceGraphBuilder<'r> {
    registry: &'r Registry,
    /// Members currently being planned, outermost first
    active: Vec<InstanceKey>,
}

impl<'r> InstanceGraphBuilder<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            active: Vec::new(),
        }
    }

    /// Plan the member of `service` registered as `name`, or the default
    pub fn build(&mut self, service: TypeKey, name: Option<&str>) -> DiResult<ResolvedPlan> {
        let base = self.registry.lookup(&service, name)?;
        self.build_member(&base)
    }

    /// Plan every registered member of `service` in registration order
    pub fn build_all(&mut self, service: TypeKey) -> DiResult<Vec<ResolvedPlan>> {
        let registry = self.registry;
        match registry.family(&service) {
            Some(family) => family
                .descriptors()
                .iter()
                .map(|descriptor| self.build_member(descriptor))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    /// Plan one known family member, decorated
    pub fn build_member(&mut self, base: &ImplementationDescriptor) -> DiResult<ResolvedPlan> {
        self.enter(InstanceKey::new(base.service(), base.name()))?;
        let result = self.decorate(base);
        self.active.pop();
        result
    }

    fn enter(&mut self, key: InstanceKey) -> DiResult<()> {
        let max_depth = self.registry.options().max_depth;
        if self.active.contains(&key) || self.active.len() >= max_depth {
            let path = self
                .active
                .iter()
                .chain(std::iter::once(&key))
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(DiError::CircularDependency { path });
        }
        self.active.push(key);
        Ok(())
    }

    fn decorate(&mut self, base: &ImplementationDescriptor) -> DiResult<ResolvedPlan> {
        let registry = self.registry;
        let service = base.service();

        let mut plan = self.plan_component(service, base.component(), base, None)?;
        let mut decorators = Vec::new();
        for rule in registry.decorators().rules_for(service) {
            plan = self.plan_component(service, rule.decorator(), base, Some(plan))?;
            decorators.push(rule.decorator_type());
        }

        let descriptor = if decorators.is_empty() {
            ResolvedDescriptor::undecorated(base)
        } else {
            mirror_identity(base, ResolvedDescriptor::decorated(base, decorators))
        };
        trace!(
            "Planned {}[{}] as {} ({})",
            service,
            descriptor.name,
            plan,
            descriptor.lifetime
        );

        Ok(ResolvedPlan {
            descriptor,
            plan: plan.cached(),
        })
    }

    /// Plan one layer. Every layer carries the base member's identity.
    fn plan_component(
        &mut self,
        service: TypeKey,
        component: &Arc<Component>,
        base: &ImplementationDescriptor,
        mut inner: Option<Plan>,
    ) -> DiResult<Plan> {
        let mut arguments = Vec::with_capacity(component.dependencies().len());
        for slot in component.dependencies() {
            let plan = match slot {
                Slot::Service { service, name } => self.build(*service, name.as_deref())?.plan,
                Slot::Inner { .. } => inner.take().ok_or_else(|| {
                    DiError::configuration(format!(
                        "{} has an inner slot but is not applied as a decorator",
                        component.key()
                    ))
                })?,
            };
            arguments.push(PlanArgument {
                slot: slot.clone(),
                plan,
            });
        }
        Ok(Plan::new(
            service,
            component.clone(),
            base.name().to_string(),
            base.lifetime(),
            arguments,
        ))
    }
}
