//! Decoration rules
//!
//! Rules live apart from the families they apply to and are only consulted
//! when a plan is built, so a rule declared before any implementation exists
//! still applies to implementations registered later.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::component::Component;
use crate::error::{DiError, DiResult};
use crate::service::TypeKey;

/// Declaration that instances of `target` are wrapped by `decorator`
#[derive(Debug, Clone)]
pub struct DecoratorRule {
    target: TypeKey,
    decorator: Arc<Component>,
    order: u64,
}

impl DecoratorRule {
    pub fn target(&self) -> TypeKey {
        self.target
    }

    pub fn decorator(&self) -> &Arc<Component> {
        &self.decorator
    }

    pub fn decorator_type(&self) -> TypeKey {
        self.decorator.key()
    }

    /// Declaration sequence number; lower numbers wrap closer to the base
    pub fn order(&self) -> u64 {
        self.order
    }
}

/// Ordered list of every decoration rule
#[derive(Debug, Clone, Default)]
pub struct DecoratorPolicySet {
    rules: Vec<DecoratorRule>,
    next_order: u64,
}

impl DecoratorPolicySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule for `target`; returns its declaration order
    pub fn add(&mut self, target: TypeKey, decorator: Arc<Component>) -> DiResult<u64> {
        validate_decorator(&target, &decorator)?;

        let order = self.next_order;
        self.next_order += 1;
        debug!(
            "Decorating {} with {} (order {})",
            target,
            decorator.key(),
            order
        );
        self.rules.push(DecoratorRule {
            target,
            decorator,
            order,
        });
        Ok(order)
    }

    /// Rules for `target` in ascending declaration order
    pub fn rules_for(&self, target: TypeKey) -> RulesFor<'_> {
        RulesFor {
            rules: self.rules.iter(),
            target,
        }
    }

    pub fn has_rules_for(&self, target: TypeKey) -> bool {
        self.rules_for(target).next().is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecoratorRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Iterator returned by [`DecoratorPolicySet::rules_for`]
#[derive(Clone)]
pub struct RulesFor<'a> {
    rules: std::slice::Iter<'a, DecoratorRule>,
    target: TypeKey,
}

impl<'a> Iterator for RulesFor<'a> {
    type Item = &'a DecoratorRule;

    fn next(&mut self) -> Option<Self::Item> {
        let target = self.target;
        self.rules.by_ref().find(|rule| rule.target == target)
    }
}

/// A decorator must implement the target and declare exactly one inner slot,
/// typed as the target
fn validate_decorator(target: &TypeKey, decorator: &Component) -> DiResult<()> {
    if !decorator.satisfies(target) {
        return Err(DiError::configuration(format!(
            "{} cannot decorate {}: it does not implement {}",
            decorator.key(),
            target,
            target
        )));
    }

    let inner: Vec<&TypeKey> = decorator.inner_slots().collect();
    match inner.as_slice() {
        [slot] if *slot == target => Ok(()),
        [slot] => Err(DiError::configuration(format!(
            "{} cannot decorate {}: its inner slot expects {}",
            decorator.key(),
            target,
            slot
        ))),
        slots => Err(DiError::configuration(format!(
            "{} cannot decorate {}: expected exactly one inner {} slot, found {}",
            decorator.key(),
            target,
            target,
            slots.len()
        ))),
    }
}

/// Policy object that contributes decoration rules to a registry
pub trait DecorationPolicy {
    /// `(target, decorator)` pairs in the order they should be declared
    fn decorations(&self) -> Vec<(TypeKey, TypeKey)>;
}

/// Decorates every `A` with `D`
pub struct DecoratorPolicy<A: ?Sized, D> {
    _marker: PhantomData<fn(&A) -> D>,
}

impl<A: ?Sized, D> DecoratorPolicy<A, D> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<A: ?Sized, D> Default for DecoratorPolicy<A, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized, D> fmt::Debug for DecoratorPolicy<A, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DecoratorPolicy<{}, {}>",
            std::any::type_name::<A>(),
            std::any::type_name::<D>()
        )
    }
}

impl<A: ?Sized + 'static, D: 'static> DecorationPolicy for DecoratorPolicy<A, D> {
    fn decorations(&self) -> Vec<(TypeKey, TypeKey)> {
        vec![(TypeKey::of::<A>(), TypeKey::of::<D>())]
    }
}
