//! Property tests for decoration order and identity transparency

mod common;

use common::*;
use proptest::prelude::*;
use trellis_di::prelude::*;

fn lifetime_strategy() -> impl Strategy<Value = ServiceLifetime> {
    prop_oneof![
        Just(ServiceLifetime::Transient),
        Just(ServiceLifetime::Scoped),
        Just(ServiceLifetime::Singleton),
    ]
}

/// Distinct layer indexes in a random declaration order
fn layer_order() -> impl Strategy<Value = Vec<usize>> {
    Just((0..LAYERS).collect::<Vec<_>>())
        .prop_shuffle()
        .prop_flat_map(|order| (0..=LAYERS).prop_map(move |len| order[..len].to_vec()))
}

fn expected_shape(order: &[usize], base: &str) -> String {
    order
        .iter()
        .fold(base.to_string(), |inner, index| format!("L{}({})", index, inner))
}

proptest! {
    #[test]
    fn later_declarations_wrap_earlier_ones(
        order in layer_order(),
        register_first in any::<bool>(),
    ) {
        let container = container(|registry| {
            if register_first {
                registry.for_service::<dyn Widget>().use_type::<AWidget>().register()?;
            }
            for index in &order {
                decorate_with_layer(registry, *index)?;
            }
            if !register_first {
                registry.for_service::<dyn Widget>().use_type::<AWidget>().register()?;
            }
            Ok(())
        });

        let widget = container.resolve::<dyn Widget>().unwrap();
        prop_assert_eq!(widget.describe(), expected_shape(&order, "AWidget"));

        let described = container.describe_default::<dyn Widget>().unwrap();
        prop_assert_eq!(described.decorators.len(), order.len());
    }

    #[test]
    fn decoration_preserves_name_and_lifetime(
        order in layer_order(),
        name in "[a-z]{1,8}",
        lifetime in lifetime_strategy(),
    ) {
        let container = container(|registry| {
            for index in &order {
                decorate_with_layer(registry, *index)?;
            }
            registry
                .for_service::<dyn Widget>()
                .use_type::<AWidget>()
                .named(name.clone())
                .lifetime(lifetime)
                .register()?;
            Ok(())
        });

        let described = container.describe_default::<dyn Widget>().unwrap();
        prop_assert_eq!(&described.name, &name);
        prop_assert_eq!(described.lifetime, lifetime);
        prop_assert_eq!(described.implementation_type, TypeKey::of::<AWidget>());

        let by_name = container.resolve_named::<dyn Widget>(&name).unwrap();
        prop_assert_eq!(by_name.describe(), expected_shape(&order, "AWidget"));
    }

    #[test]
    fn repeated_resolution_keeps_the_wrap_order(
        order in layer_order(),
        lifetime in lifetime_strategy(),
    ) {
        let container = container(|registry| {
            for index in &order {
                decorate_with_layer(registry, *index)?;
            }
            registry
                .for_service::<dyn Widget>()
                .use_type::<AWidget>()
                .lifetime(lifetime)
                .register()?;
            Ok(())
        });
        let widget = TypeKey::of::<dyn Widget>();

        let first_plan = container.plan_for(&widget, None).unwrap();
        let second_plan = container.plan_for(&widget, None).unwrap();
        prop_assert_eq!(first_plan.plan.decoration_chain(), second_plan.plan.decoration_chain());
        prop_assert_eq!(first_plan.plan.decoration_chain().len(), order.len() + 1);
        prop_assert_eq!(first_plan.descriptor.decorators, second_plan.descriptor.decorators);

        let expected = expected_shape(&order, "AWidget");
        let scope = container.create_scope();
        prop_assert_eq!(scope.resolve::<dyn Widget>().unwrap().describe(), expected.clone());
        prop_assert_eq!(scope.resolve::<dyn Widget>().unwrap().describe(), expected.clone());
        let other = container.create_scope();
        prop_assert_eq!(other.resolve::<dyn Widget>().unwrap().describe(), expected);
    }

    #[test]
    fn reconfigured_default_is_decorated_by_existing_rules(order in layer_order()) {
        let container = container(|registry| {
            for index in &order {
                decorate_with_layer(registry, *index)?;
            }
            registry.for_service::<dyn Widget>().use_type::<AWidget>().register()?;
            Ok(())
        });

        container
            .reconfigure(|registry| {
                registry.add_scoped::<dyn Widget, BWidget>()?;
                Ok(())
            })
            .unwrap();

        let widget = container.create_scope().resolve::<dyn Widget>().unwrap();
        prop_assert_eq!(widget.describe(), expected_shape(&order, "BWidget"));
    }
}
