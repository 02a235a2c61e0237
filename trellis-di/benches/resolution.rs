use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trellis_di::prelude::*;

trait Widget: Send + Sync {
    fn depth(&self) -> usize;
}

struct AWidget;

impl Widget for AWidget {
    fn depth(&self) -> usize {
        0
    }
}

struct Layer<const N: usize> {
    inner: Arc<dyn Widget>,
}

impl<const N: usize> Widget for Layer<N> {
    fn depth(&self) -> usize {
        self.inner.depth() + 1
    }
}

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

fn create_container(layers: usize, lifetime: ServiceLifetime) -> Container {
    let mut catalog = Catalog::new();
    catalog
        .component::<AWidget>()
        .provides::<dyn Widget, _>(|w| w as Arc<dyn Widget>)
        .register(|_| Ok(AWidget));
    add_layer::<0>(&mut catalog);
    add_layer::<1>(&mut catalog);
    add_layer::<2>(&mut catalog);

    ContainerBuilder::new(catalog)
        .configure(|registry| {
            registry
                .for_service::<dyn Widget>()
                .use_type::<AWidget>()
                .lifetime(lifetime)
                .register()?;
            let widgets = [
                TypeKey::of::<Layer<0>>(),
                TypeKey::of::<Layer<1>>(),
                TypeKey::of::<Layer<2>>(),
            ];
            for decorator in widgets.iter().take(layers) {
                registry.add_decorator(TypeKey::of::<dyn Widget>(), *decorator)?;
            }
            Ok(())
        })
        .expect("Failed to configure container")
        .build()
}

fn benchmark_decorated_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("decorated_resolution");

    for lifetime in [ServiceLifetime::Transient, ServiceLifetime::Singleton] {
        for layers in 0..=3 {
            let container = create_container(layers, lifetime);
            group.bench_with_input(
                BenchmarkId::new(lifetime.to_string(), layers),
                &container,
                |b, container| {
                    b.iter(|| {
                        let widget = container.resolve::<dyn Widget>().unwrap();
                        black_box(widget.depth())
                    });
                },
            );
        }
    }

    group.finish();
}

fn benchmark_plan_building(c: &mut Criterion) {
    let container = create_container(3, ServiceLifetime::Transient);
    let widget = TypeKey::of::<dyn Widget>();

    c.bench_function("plan_for_three_layers", |b| {
        b.iter(|| black_box(container.plan_for(&widget, None).unwrap().plan.depth()))
    });
}

criterion_group!(benches, benchmark_decorated_resolution, benchmark_plan_building);
criterion_main!(benches);
