//! Component catalog
//!
//! Rust has no runtime reflection, so every constructible type is declared once
//! in a [`Catalog`]: its constructor, the ordered dependency slots the
//! constructor consumes and the abstractions the type can be upcast to. The
//! registry consults the catalog to check conformance at configuration time
//! and the graph builder consults it to turn a type into a plan.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use crate::error::{DiError, DiResult};
use crate::service::{downcast_service, Instance, TypeKey};

type Constructor = Arc<dyn Fn(&Arguments) -> DiResult<Instance> + Send + Sync>;
type Upcast = Arc<dyn Fn(Instance) -> DiResult<Instance> + Send + Sync>;

/// A constructor dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Ordinary dependency resolved through the container
    Service {
        service: TypeKey,
        name: Option<String>,
    },
    /// The wrapped instance of a decorator. Supplied by the graph builder,
    /// never resolved through the container.
    Inner { service: TypeKey },
}

impl Slot {
    pub fn service(&self) -> &TypeKey {
        match self {
            Slot::Service { service, .. } | Slot::Inner { service } => service,
        }
    }

    pub fn is_inner(&self) -> bool {
        matches!(self, Slot::Inner { .. })
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Service { service, name: None } => write!(f, "{}", service),
            Slot::Service {
                service,
                name: Some(name),
            } => write!(f, "{}[{}]", service, name),
            Slot::Inner { service } => write!(f, "inner {}", service),
        }
    }
}

/// Values handed to a constructor, in slot order
pub struct Arguments {
    component: TypeKey,
    values: Vec<(Slot, Instance)>,
}

impl Arguments {
    pub(crate) fn new(component: TypeKey, values: Vec<(Slot, Instance)>) -> Self {
        Self { component, values }
    }

    /// First unnamed dependency on `A`
    pub fn get<A>(&self) -> DiResult<Arc<A>>
    where
        A: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::of::<A>();
        self.find::<A>(&key, |slot| {
            matches!(slot, Slot::Service { service, name: None } if *service == key)
        })
    }

    /// Dependency on `A` declared with `name`
    pub fn get_named<A>(&self, name: &str) -> DiResult<Arc<A>>
    where
        A: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::of::<A>();
        self.find::<A>(&key, |slot| match slot {
            Slot::Service {
                service,
                name: Some(slot_name),
            } => *service == key && slot_name == name,
            _ => false,
        })
    }

    /// The instance this decorator wraps
    pub fn inner<A>(&self) -> DiResult<Arc<A>>
    where
        A: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::of::<A>();
        self.find::<A>(&key, |slot| {
            matches!(slot, Slot::Inner { service } if *service == key)
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn find<A>(&self, key: &TypeKey, predicate: impl Fn(&Slot) -> bool) -> DiResult<Arc<A>>
    where
        A: ?Sized + Send + Sync + 'static,
    {
        let (_, instance) = self
            .values
            .iter()
            .find(|(slot, _)| predicate(slot))
            .ok_or_else(|| {
                DiError::creation_failed(
                    self.component.type_name(),
                    format!("constructor asked for undeclared dependency {}", key),
                )
            })?;
        downcast_service::<A>(instance, key)
    }
}

/// A constructible type known to the catalog
pub struct Component {
    key: TypeKey,
    dependencies: Vec<Slot>,
    constructor: Constructor,
    conformances: FxHashMap<TypeKey, Upcast>,
}

impl Component {
    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn name(&self) -> &'static str {
        self.key.short_name()
    }

    pub fn dependencies(&self) -> &[Slot] {
        &self.dependencies
    }

    /// Whether this component can be upcast to `service`
    pub fn satisfies(&self, service: &TypeKey) -> bool {
        self.conformances.contains_key(service)
    }

    pub fn provided_services(&self) -> impl Iterator<Item = &TypeKey> {
        self.conformances.keys()
    }

    /// Services named by the component's inner slots
    pub fn inner_slots(&self) -> impl Iterator<Item = &TypeKey> {
        self.dependencies
            .iter()
            .filter(|slot| slot.is_inner())
            .map(Slot::service)
    }

    pub fn is_decorator(&self) -> bool {
        self.dependencies.iter().any(Slot::is_inner)
    }

    pub(crate) fn construct(&self, arguments: &Arguments) -> DiResult<Instance> {
        trace!("Constructing {} with {} arguments", self.key, arguments.len());
        (self.constructor)(arguments)
    }

    /// Turn a freshly constructed value into an instance of `service`
    pub(crate) fn upcast(&self, service: &TypeKey, concrete: Instance) -> DiResult<Instance> {
        let upcast = self.conformances.get(service).ok_or_else(|| {
            DiError::creation_failed(
                self.key.type_name(),
                format!("{} does not implement {}", self.key, service),
            )
        })?;
        upcast(concrete)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("type", &self.key)
            .field("dependencies", &self.dependencies)
            .field("provides", &self.conformances.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Table of every constructible type
#[derive(Default)]
pub struct Catalog {
    components: FxHashMap<TypeKey, Arc<Component>>,
    component_names: FxHashMap<&'static str, TypeKey>,
    service_names: FxHashMap<&'static str, TypeKey>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start declaring the component `T`
    pub fn component<T>(&mut self) -> ComponentBuilder<'_, T>
    where
        T: Send + Sync + 'static,
    {
        ComponentBuilder {
            catalog: self,
            dependencies: Vec::new(),
            conformances: FxHashMap::default(),
            _marker: PhantomData,
        }
    }

    pub fn get(&self, key: &TypeKey) -> Option<&Arc<Component>> {
        self.components.get(key)
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.components.contains_key(key)
    }

    /// Capability check: can `concrete` be used as `abstraction`
    pub fn satisfies(&self, concrete: &TypeKey, abstraction: &TypeKey) -> bool {
        self.components
            .get(concrete)
            .map_or(false, |component| component.satisfies(abstraction))
    }

    /// Look up a component by its short type name
    pub fn component_named(&self, name: &str) -> Option<&Arc<Component>> {
        self.component_names
            .get(name)
            .and_then(|key| self.components.get(key))
    }

    /// Look up an abstraction by its short type name
    pub fn service_named(&self, name: &str) -> Option<TypeKey> {
        self.service_names.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    fn insert(&mut self, component: Component) {
        let key = component.key;
        for service in component.conformances.keys() {
            if let Some(previous) = self.service_names.insert(service.short_name(), *service) {
                if previous != *service {
                    warn!(
                        "Service name {} now refers to {} instead of {}",
                        service.short_name(),
                        service.type_name(),
                        previous.type_name()
                    );
                }
            }
        }
        if let Some(previous) = self.component_names.insert(key.short_name(), key) {
            if previous != key {
                warn!(
                    "Component name {} now refers to {} instead of {}",
                    key.short_name(),
                    key.type_name(),
                    previous.type_name()
                );
            }
        }
        self.components.insert(key, Arc::new(component));
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("components", &self.components.values().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for one catalog entry
pub struct ComponentBuilder<'c, T> {
    catalog: &'c mut Catalog,
    dependencies: Vec<Slot>,
    conformances: FxHashMap<TypeKey, Upcast>,
    _marker: PhantomData<fn() -> T>,
}

impl<'c, T> ComponentBuilder<'c, T>
where
    T: Send + Sync + 'static,
{
    /// Add an ordinary dependency on the default `A`
    pub fn depends_on<A: ?Sized + 'static>(mut self) -> Self {
        self.dependencies.push(Slot::Service {
            service: TypeKey::of::<A>(),
            name: None,
        });
        self
    }

    /// Add an ordinary dependency on the `A` registered as `name`
    pub fn depends_on_named<A: ?Sized + 'static>(mut self, name: &str) -> Self {
        self.dependencies.push(Slot::Service {
            service: TypeKey::of::<A>(),
            name: Some(name.to_string()),
        });
        self
    }

    /// Declare the slot that receives the decorated instance
    pub fn inner<A: ?Sized + 'static>(mut self) -> Self {
        self.dependencies.push(Slot::Inner {
            service: TypeKey::of::<A>(),
        });
        self
    }

    /// Declare that `T` implements `A`; `cast` performs the upcast
    pub fn provides<A, F>(mut self, cast: F) -> Self
    where
        A: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<A> + Send + Sync + 'static,
    {
        self.conformances
            .insert(TypeKey::of::<A>(), upcast_with::<T, A, F>(cast));
        self
    }

    /// Finish the declaration with the constructor
    pub fn register<F>(self, constructor: F) -> TypeKey
    where
        F: Fn(&Arguments) -> DiResult<T> + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        let mut conformances = self.conformances;
        conformances.insert(key, upcast_with::<T, T, _>(|concrete| concrete));

        let constructor: Constructor = Arc::new(move |arguments: &Arguments| -> DiResult<Instance> {
            Ok(Arc::new(constructor(arguments)?) as Instance)
        });

        self.catalog.insert(Component {
            key,
            dependencies: self.dependencies,
            constructor,
            conformances,
        });
        key
    }
}

fn upcast_with<T, A, F>(cast: F) -> Upcast
where
    T: Send + Sync + 'static,
    A: ?Sized + Send + Sync + 'static,
    F: Fn(Arc<T>) -> Arc<A> + Send + Sync + 'static,
{
    Arc::new(move |concrete: Instance| -> DiResult<Instance> {
        let typed = concrete.downcast_arc::<T>().map_err(|_| {
            DiError::creation_failed(
                std::any::type_name::<T>(),
                "constructor produced a value of another type",
            )
        })?;
        Ok(Arc::new(cast(typed)) as Instance)
    })
}
