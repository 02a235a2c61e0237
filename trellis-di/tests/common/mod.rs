//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use trellis_di::prelude::*;

pub trait Widget: Send + Sync {
    /// Shape of the decoration chain, e.g. `WidgetHolder(AWidget)`
    fn describe(&self) -> String;
}

pub trait Thing: Send + Sync {
    fn color(&self) -> &str;
}

pub struct AWidget;

impl Widget for AWidget {
    fn describe(&self) -> String {
        "AWidget".to_string()
    }
}

pub struct BWidget;

impl Widget for BWidget {
    fn describe(&self) -> String {
        "BWidget".to_string()
    }
}

/// A widget that counts how often it was built
pub struct CountedWidget {
    pub serial: usize,
}

impl Widget for CountedWidget {
    fn describe(&self) -> String {
        format!("CountedWidget#{}", self.serial)
    }
}

pub struct RedThing;

impl Thing for RedThing {
    fn color(&self) -> &str {
        "red"
    }
}

pub struct WidgetHolder {
    pub thing: Arc<dyn Thing>,
    pub inner: Arc<dyn Widget>,
}

impl Widget for WidgetHolder {
    fn describe(&self) -> String {
        format!("WidgetHolder({})", self.inner.describe())
    }
}

pub struct OtherWidgetHolder {
    pub thing: Arc<dyn Thing>,
    pub inner: Arc<dyn Widget>,
}

impl Widget for OtherWidgetHolder {
    fn describe(&self) -> String {
        format!("OtherWidgetHolder({})", self.inner.describe())
    }
}

/// Decorator without ordinary dependencies, indexed for ordering tests
pub struct Layer<const N: usize> {
    pub inner: Arc<dyn Widget>,
}

impl<const N: usize> Widget for Layer<N> {
    fn describe(&self) -> String {
        format!("L{}({})", N, self.inner.describe())
    }
}

pub const LAYERS: usize = 5;

fn add_layer<const N: usize>(catalog: &mut Catalog) {
    catalog
        .component::<Layer<N>>()
        .inner::<dyn Widget>()
        .provides::<dyn Widget, _>(|w| w as Arc<dyn Widget>)
        .register(|args| {
            Ok(Layer::<N> {
                inner: args.inner::<dyn Widget>()?,
            })
        });
}

/// Declare `Layer<index>` as a decorator of `dyn Widget`
pub fn decorate_with_layer(registry: &mut Registry, index: usize) -> DiResult<u64> {
    let widgets = registry.for_service::<dyn Widget>();
    match index {
        0 => widgets.decorate_all_with::<Layer<0>>(),
        1 => widgets.decorate_all_with::<Layer<1>>(),
        2 => widgets.decorate_all_with::<Layer<2>>(),
        3 => widgets.decorate_all_with::<Layer<3>>(),
        4 => widgets.decorate_all_with::<Layer<4>>(),
        other => panic!("No layer {}", other),
    }
}

/// Catalog of every fixture component
pub fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .component::<AWidget>()
        .provides::<dyn Widget, _>(|w| w as Arc<dyn Widget>)
        .register(|_| Ok(AWidget));
    catalog
        .component::<BWidget>()
        .provides::<dyn Widget, _>(|w| w as Arc<dyn Widget>)
        .register(|_| Ok(BWidget));

    let serials = AtomicUsize::new(0);
    catalog
        .component::<CountedWidget>()
        .provides::<dyn Widget, _>(|w| w as Arc<dyn Widget>)
        .register(move |_| {
            Ok(CountedWidget {
                serial: serials.fetch_add(1, Ordering::SeqCst),
            })
        });

    catalog
        .component::<RedThing>()
        .provides::<dyn Thing, _>(|t| t as Arc<dyn Thing>)
        .register(|_| Ok(RedThing));
    catalog
        .component::<WidgetHolder>()
        .depends_on::<dyn Thing>()
        .inner::<dyn Widget>()
        .provides::<dyn Widget, _>(|w| w as Arc<dyn Widget>)
        .register(|args| {
            Ok(WidgetHolder {
                thing: args.get::<dyn Thing>()?,
                inner: args.inner::<dyn Widget>()?,
            })
        });
    catalog
        .component::<OtherWidgetHolder>()
        .depends_on::<dyn Thing>()
        .inner::<dyn Widget>()
        .provides::<dyn Widget, _>(|w| w as Arc<dyn Widget>)
        .register(|args| {
            Ok(OtherWidgetHolder {
                thing: args.get::<dyn Thing>()?,
                inner: args.inner::<dyn Widget>()?,
            })
        });

    add_layer::<0>(&mut catalog);
    add_layer::<1>(&mut catalog);
    add_layer::<2>(&mut catalog);
    add_layer::<3>(&mut catalog);
    add_layer::<4>(&mut catalog);
    catalog
}

/// Build a container from one configuration batch
pub fn container<F>(configure: F) -> Container
where
    F: FnOnce(&mut Registry) -> DiResult<()>,
{
    ContainerBuilder::new(catalog())
        .configure(configure)
        .expect("configuration should succeed")
        .build()
}

/// Whether two handles point at the same instance
pub fn same_instance(a: &Arc<dyn Widget>, b: &Arc<dyn Widget>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
