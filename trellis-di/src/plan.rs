//! Construction plans
//!
//! A [`Plan`] is the unevaluated recipe for one instance: the component to
//! construct, the identity it is exposed under and one sub-plan per
//! constructor slot. Plans are built per resolution and never stored.

use std::fmt;
use std::sync::Arc;

use crate::component::{Arguments, Component, Slot};
use crate::error::DiResult;
use crate::lifetime::{InstanceKey, LifetimeCache};
use crate::service::{Instance, ServiceLifetime, TypeKey};

/// One node of an instance graph
#[derive(Debug, Clone)]
pub struct Plan {
    service: TypeKey,
    component: Arc<Component>,
    name: String,
    lifetime: ServiceLifetime,
    /// Only the outward node of a family member goes through the lifetime
    /// cache; inner decoration layers are built with their wrapper.
    cached: bool,
    arguments: Vec<PlanArgument>,
}

/// A constructor slot and the plan that fills it
#[derive(Debug, Clone)]
pub struct PlanArgument {
    pub slot: Slot,
    pub plan: Plan,
}

impl Plan {
    pub(crate) fn new(
        service: TypeKey,
        component: Arc<Component>,
        name: String,
        lifetime: ServiceLifetime,
        arguments: Vec<PlanArgument>,
    ) -> Self {
        Self {
            service,
            component,
            name,
            lifetime,
            cached: false,
            arguments,
        }
    }

    pub(crate) fn cached(mut self) -> Self {
        self.cached = true;
        self
    }

    pub fn service(&self) -> TypeKey {
        self.service
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

    pub fn is_cached(&self) -> bool {
        self.cached
    }

    pub fn arguments(&self) -> &[PlanArgument] {
        &self.arguments
    }

    /// The plan wrapped by this decorator node
    pub fn inner(&self) -> Option<&Plan> {
        self.arguments
            .iter()
            .find(|argument| argument.slot.is_inner())
            .map(|argument| &argument.plan)
    }

    /// Concrete types from the outermost node down to the base
    pub fn decoration_chain(&self) -> Vec<TypeKey> {
        let mut chain = vec![self.concrete_type()];
        let mut current = self;
        while let Some(inner) = current.inner() {
            chain.push(inner.concrete_type());
            current = inner;
        }
        chain
    }

    /// Length of the longest path to a leaf
    pub fn depth(&self) -> usize {
        self.arguments
            .iter()
            .map(|argument| argument.plan.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Build the instance described by this plan
    pub fn execute(&self, cache: &dyn LifetimeCache) -> DiResult<Instance> {
        if !self.cached {
            return self.construct(cache);
        }
        let key = InstanceKey::new(self.service, self.name.clone());
        cache.get_or_create(&key, self.lifetime, &mut || self.construct(cache))
    }

    fn construct(&self, cache: &dyn LifetimeCache) -> DiResult<Instance> {
        let values = self
            .arguments
            .iter()
            .map(|argument| -> DiResult<(Slot, Instance)> {
                Ok((argument.slot.clone(), argument.plan.execute(cache)?))
            })
            .collect::<DiResult<Vec<_>>>()?;
        let concrete = self
            .component
            .construct(&Arguments::new(self.component.key(), values))?;
        self.component.upcast(&self.service, concrete)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.concrete_type())?;
        if self.arguments.is_empty() {
            return Ok(());
        }
        write!(f, "(")?;
        for (index, argument) in self.arguments.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", argument.plan)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Catalog;
    use crate::lifetime::ScopeCache;
    use crate::service::downcast_service;

    trait Widget: Send + Sync {
        fn label(&self) -> String;
    }

    struct AWidget;

    impl Widget for AWidget {
        fn label(&self) -> String {
            "A".to_string()
        }
    }

    struct Holder {
        inner: Arc<dyn Widget>,
    }

    impl Widget for Holder {
        fn label(&self) -> String {
            format!("Holder({})", self.inner.label())
        }
    }

    fn decorated_plan(lifetime: ServiceLifetime) -> Plan {
        let mut catalog = Catalog::new();
        let a = catalog
            .component::<AWidget>()
            .provides::<dyn Widget, _>(|w| w as Arc<dyn Widget>)
            .register(|_| Ok(AWidget));
        let holder = catalog
            .component::<Holder>()
            .inner::<dyn Widget>()
            .provides::<dyn Widget, _>(|w| w as Arc<dyn Widget>)
            .register(|args| {
                Ok(Holder {
                    inner: args.inner::<dyn Widget>()?,
                })
            });

        let widget = TypeKey::of::<dyn Widget>();
        let base = Plan::new(
            widget,
            catalog.get(&a).unwrap().clone(),
            "Default".to_string(),
            lifetime,
            Vec::new(),
        );
        Plan::new(
            widget,
            catalog.get(&holder).unwrap().clone(),
            "Default".to_string(),
            lifetime,
            vec![PlanArgument {
                slot: Slot::Inner { service: widget },
                plan: base,
            }],
        )
        .cached()
    }

    #[test]
    fn test_plan_shape() {
        let plan = decorated_plan(ServiceLifetime::Transient);
        assert_eq!(
            plan.decoration_chain(),
            vec![TypeKey::of::<Holder>(), TypeKey::of::<AWidget>()]
        );
        assert_eq!(plan.depth(), 1);
        assert!(plan.is_cached());
        assert!(!plan.inner().unwrap().is_cached());
        assert_eq!(plan.to_string(), "Holder(AWidget)");
    }

    #[test]
    fn test_execute_builds_nested_instance() {
        let plan = decorated_plan(ServiceLifetime::Transient);
        let cache = ScopeCache::new();
        let instance = plan.execute(&cache).unwrap();
        let widget = downcast_service::<dyn Widget>(&instance, &plan.service()).unwrap();
        assert_eq!(widget.label(), "Holder(A)");
    }

    #[test]
    fn test_singleton_plan_is_cached_once() {
        let plan = decorated_plan(ServiceLifetime::Singleton);
        let cache = ScopeCache::new();
        let first = plan.execute(&cache).unwrap();
        let second = plan.execute(&cache).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        // Only the outward node is stored
        assert_eq!(cache.singleton_count(), 1);
    }
}
