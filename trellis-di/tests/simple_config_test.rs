//! Simple test for configuration support

#![cfg(feature = "config")]

mod common;

use common::*;
use trellis_di::prelude::*;

const WIDGETS_TOML: &str = r#"
    [[services]]
    service_type = "Thing"
    implementation_type = "RedThing"
    lifetime = "singleton"

    [[services]]
    service_type = "Widget"
    implementation_type = "AWidget"
    name = "A"
    lifetime = "scoped"

    [[decorators]]
    service_type = "Widget"
    decorator_type = "WidgetHolder"

    [[decorators]]
    service_type = "Widget"
    decorator_type = "OtherWidgetHolder"
"#;

#[test]
fn test_toml_configured_container() {
    let config = ContainerConfig::from_toml(WIDGETS_TOML).unwrap();
    let container = ContainerBuilder::from_config(catalog(), &config)
        .unwrap()
        .build();

    let scope = container.create_scope();
    let widget = scope.resolve::<dyn Widget>().unwrap();
    assert_eq!(widget.describe(), "OtherWidgetHolder(WidgetHolder(AWidget))");

    let described = container.describe_default::<dyn Widget>().unwrap();
    assert_eq!(described.name, "A");
    assert_eq!(described.lifetime, ServiceLifetime::Scoped);
}

#[test]
fn test_json_config_applied_in_reconfigure() {
    let container = ContainerBuilder::new(catalog())
        .apply_config(&ContainerConfig::from_toml(WIDGETS_TOML).unwrap())
        .unwrap()
        .build();

    let config = ContainerConfig::from_json(
        r#"{
            "services": [
                { "service_type": "Widget", "implementation_type": "BWidget", "default": true }
            ]
        }"#,
    )
    .unwrap();
    container.reconfigure(|registry| config.apply(registry)).unwrap();

    let widget = container.resolve::<dyn Widget>().unwrap();
    assert_eq!(widget.describe(), "OtherWidgetHolder(WidgetHolder(BWidget))");
    assert_eq!(
        container.resolve_named::<dyn Widget>("A").unwrap().describe(),
        "OtherWidgetHolder(WidgetHolder(AWidget))"
    );
}

#[test]
fn test_options_from_config() {
    let config = ContainerConfig::from_toml(
        r#"
        [options]
        default_conflict = "reject"

        [[services]]
        service_type = "Widget"
        implementation_type = "AWidget"
        name = "a"
        default = true

        [[services]]
        service_type = "Widget"
        implementation_type = "BWidget"
        name = "b"
        default = true
        "#,
    )
    .unwrap();

    let container = ContainerBuilder::from_config(catalog(), &config)
        .unwrap()
        .build();
    assert!(matches!(
        container.resolve::<dyn Widget>(),
        Err(DiError::AmbiguousDefault { .. })
    ));
}

#[test]
fn test_unknown_type_names() {
    let config = ContainerConfig::from_toml(
        r#"
        [[services]]
        service_type = "Widget"
        implementation_type = "GoldenWidget"
        "#,
    )
    .unwrap();

    match ContainerBuilder::from_config(catalog(), &config) {
        Err(DiError::ConfigError(message)) => assert!(message.contains("GoldenWidget")),
        Err(other) => panic!("Expected ConfigError, got {}", other),
        Ok(_) => panic!("Expected ConfigError"),
    }
}
