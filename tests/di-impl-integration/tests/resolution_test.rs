//! 依赖解析的集成测试


use di_abstractions::{ComponentDefinition, ContainerExt};
use di_impl::{ApplicationContainer, ContainerConfig};
use infrastructure_common::DependencyError;
use std::sync::Arc;

trait Notifier: Send + Sync {
    fn channel(&self) -> &'static str;
}

struct EmailNotifier;
struct SmsNotifier;

impl Notifier for EmailNotifier {
    fn channel(&self) -> &'static str {
        "email"
    }
}

impl Notifier for SmsNotifier {
    fn channel(&self) -> &'static str {
        "sms"
    }
}

fn email() -> ComponentDefinition {
    ComponentDefinition::builder(|_| Ok(EmailNotifier))
        .provides::<dyn Notifier, _>(|notifier| notifier)
        .build()
}

struct ServiceA;
struct ServiceB;

#[test]
fn test_cycle_fails_start_with_path() {
    let container = common::container();
    container
        .register(
            ComponentDefinition::builder(|deps| {
                deps.required::<ServiceB>()?;
                Ok(ServiceA)
            })
            .with_param::<ServiceB>()
            .build(),
        )
        .unwrap();
    container
        .register(
            ComponentDefinition::builder(|deps| {
                deps.required::<ServiceA>()?;
                Ok(ServiceB)
            })
            .with_param::<ServiceA>()
            .build(),
        )
        .unwrap();

    let error = container.start().unwrap_err();
    assert_eq!(
        error.cycle_path().unwrap(),
        ["ServiceA", "ServiceB", "ServiceA"]
    );
    assert_eq!(error.to_string(), "循环依赖检测到: ServiceA -> ServiceB -> ServiceA");
}

#[test]
fn test_lazy_cycle_fails_on_resolve_and_leaves_no_instance() {
    let container = common::container();
    container
        .register(
            ComponentDefinition::builder(|deps| {
                deps.required::<ServiceB>()?;
                Ok(ServiceA)
            })
            .with_param::<ServiceB>()
            .lazy()
            .build(),
        )
        .unwrap();
    container
        .register(
            ComponentDefinition::builder(|deps| {
                deps.required::<ServiceA>()?;
                Ok(ServiceB)
            })
            .with_param::<ServiceA>()
            .prototype()
            .build(),
        )
        .unwrap();
    container.start().unwrap();

    for _ in 0..2 {
        let error = container.resolve::<ServiceA>().err().unwrap();
        assert!(matches!(error, DependencyError::CircularDependency { .. }));
    }
}

#[test]
fn test_ambiguous_without_primary() {
    let container = common::container();
    container.register(email()).unwrap();
    container
        .register(
            ComponentDefinition::builder(|_| Ok(SmsNotifier))
                .provides::<dyn Notifier, _>(|notifier| notifier)
                .build(),
        )
        .unwrap();
    container.start().unwrap();

    match container.resolve::<dyn Notifier>().err().unwrap() {
        DependencyError::AmbiguousCandidate { type_name, candidates } => {
            assert_eq!(type_name, "dyn Notifier");
            assert_eq!(candidates, ["email_notifier", "sms_notifier"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        container.resolve_named::<dyn Notifier>("sms_notifier").unwrap().channel(),
        "sms"
    );
}

#[test]
fn test_primary_wins() {
    let container = common::container();
    container.register(email()).unwrap();
    container
        .register(
            ComponentDefinition::builder(|_| Ok(SmsNotifier))
                .provides::<dyn Notifier, _>(|notifier| notifier)
                .primary()
                .build(),
        )
        .unwrap();
    container.start().unwrap();

    assert_eq!(container.resolve::<dyn Notifier>().unwrap().channel(), "sms");
}

#[test]
fn test_two_primaries_are_ambiguous() {
    let container = common::container();
    container
        .register(
            ComponentDefinition::builder(|_| Ok(EmailNotifier))
                .provides::<dyn Notifier, _>(|notifier| notifier)
                .primary()
                .build(),
        )
        .unwrap();
    container
        .register(
            ComponentDefinition::builder(|_| Ok(SmsNotifier))
                .provides::<dyn Notifier, _>(|notifier| notifier)
                .primary()
                .build(),
        )
        .unwrap();
    container.start().unwrap();

    match container.resolve::<dyn Notifier>().err().unwrap() {
        DependencyError::AmbiguousCandidate { candidates, .. } => {
            assert_eq!(candidates, ["email_notifier", "sms_notifier"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_name_is_not_found() {
    let container = common::container();
    container.register(email()).unwrap();
    container.start().unwrap();

    let error = container.resolve_named::<dyn Notifier>("pager").err().unwrap();
    assert_eq!(error.to_string(), "组件未找到: dyn Notifier (名称: pager)");
}

#[test]
fn test_named_and_optional_parameters() {
    struct Dispatcher {
        primary: Arc<dyn Notifier>,
        fallback: Option<Arc<EmailNotifier>>,
    }

    let container = common::container();
    container.register(email()).unwrap();
    container
        .register(
            ComponentDefinition::builder(|_| Ok(SmsNotifier))
                .with_name("pager")
                .provides::<dyn Notifier, _>(|notifier| notifier)
                .build(),
        )
        .unwrap();
    container
        .register(
            ComponentDefinition::builder(|deps| {
                Ok(Dispatcher {
                    primary: deps.required::<dyn Notifier>()?,
                    fallback: deps.optional::<EmailNotifier>()?,
                })
            })
            .with_named_param::<dyn Notifier>("pager")
            .with_optional_param::<EmailNotifier>()
            .build(),
        )
        .unwrap();
    container.start().unwrap();

    let dispatcher = container.resolve::<Dispatcher>().unwrap();
    assert_eq!(dispatcher.primary.channel(), "sms");
    assert!(dispatcher.fallback.is_some());
}

#[test]
fn test_missing_required_parameter_fails_start() {
    struct Orphan;

    let container = common::container();
    container
        .register(
            ComponentDefinition::builder(|deps| {
                deps.required::<dyn Notifier>()?;
                Ok(Orphan)
            })
            .with_param::<dyn Notifier>()
            .build(),
        )
        .unwrap();

    let error = container.start().unwrap_err();
    assert!(matches!(error, DependencyError::NotFound { ref type_name, .. } if type_name == "dyn Notifier"));
}

#[test]
fn test_factory_error_is_reported_with_source() {
    struct Flaky;

    let container = common::container();
    container
        .register(
            ComponentDefinition::builder(|_| Err::<Flaky, _>("connection refused".into()))
                .lazy()
                .build(),
        )
        .unwrap();
    container.start().unwrap();

    let error = container.resolve::<Flaky>().err().unwrap();
    assert_eq!(error.to_string(), "组件创建失败: Flaky, 原因: connection refused");
    assert!(std::error::Error::source(&error).is_some());
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let container = common::container();
    container.register(email()).unwrap();
    let error = container.register(email()).unwrap_err();
    assert!(matches!(error, DependencyError::DuplicateRegistration { ref name, .. } if name == "email_notifier"));
}

#[test]
fn test_depth_limit_from_config() {
    struct Level0;
    struct Level1;
    struct Level2;

    common::init_tracing();
    let config = ContainerConfig::from_value(serde_json::json!({ "max_resolution_depth": 2 })).unwrap();
    let container = ApplicationContainer::with_config(config);
    container
        .register(ComponentDefinition::builder(|_| Ok(Level2)).lazy().build())
        .unwrap();
    container
        .register(ComponentDefinition::builder(|_| Ok(Level1)).with_param::<Level2>().lazy().build())
        .unwrap();
    container
        .register(ComponentDefinition::builder(|_| Ok(Level0)).with_param::<Level1>().build())
        .unwrap();

    let error = container.start().unwrap_err();
    match error {
        DependencyError::ResolutionDepthExceeded { max_depth, path } => {
            assert_eq!(max_depth, 2);
            assert_eq!(path, ["Level0", "Level1", "Level2"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}
