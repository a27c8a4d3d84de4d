//! 容器生命周期、服务与后置处理器的集成测试


use di_abstractions::{
    ComponentContainer, ComponentDefinition, ContainerExt, ManagedInstance, PostProcessor, Service,
};
use di_impl::{ApplicationContainer, ContainerConfig};
use infrastructure_common::{BoxError, ContainerState, DependencyError, DependencyResult, TypeInfo};
use parking_lot::Mutex;
use std::sync::Arc;

struct Clock;

#[test]
fn test_resolve_outside_started_state() {
    let container = common::container();
    container.register_instance(Arc::new(Clock)).unwrap();

    assert!(matches!(
        container.resolve::<Clock>().err(),
        Some(DependencyError::ContainerNotStarted)
    ));

    container.start().unwrap();
    assert!(container.resolve::<Clock>().is_ok());

    container.stop().unwrap();
    assert_eq!(container.state(), ContainerState::Stopped);
    assert!(matches!(
        container.resolve::<Clock>().err(),
        Some(DependencyError::ContainerStopped)
    ));
}

#[test]
fn test_registration_closed_after_start() {
    let container = common::container();
    container.start().unwrap();

    let error = container.register_instance(Arc::new(Clock)).unwrap_err();
    assert_eq!(error.to_string(), "容器已启动，不再接受注册: clock");
}

type EventLog = Arc<Mutex<Vec<String>>>;

struct Worker {
    label: &'static str,
    log: EventLog,
}

impl Service for Worker {
    fn start(&self) -> Result<(), BoxError> {
        self.log.lock().push(format!("start {}", self.label));
        Ok(())
    }

    fn stop(&self) -> Result<(), BoxError> {
        self.log.lock().push(format!("stop {}", self.label));
        Ok(())
    }
}

struct Scheduler(Worker);
struct Indexer(Worker);
struct Mailer(Worker);

impl Service for Scheduler {
    fn start(&self) -> Result<(), BoxError> {
        self.0.start()
    }

    fn stop(&self) -> Result<(), BoxError> {
        self.0.stop()
    }
}

impl Service for Indexer {
    fn start(&self) -> Result<(), BoxError> {
        self.0.start()
    }

    fn stop(&self) -> Result<(), BoxError> {
        self.0.stop()
    }
}

impl Service for Mailer {
    fn start(&self) -> Result<(), BoxError> {
        Err("smtp unreachable".into())
    }

    fn stop(&self) -> Result<(), BoxError> {
        self.0.stop()
    }
}

#[test]
fn test_services_start_in_order_and_stop_in_reverse() {
    let log = EventLog::default();
    let container = common::container();
    let scheduler_log = log.clone();
    container
        .register(
            ComponentDefinition::builder(move |_| {
                Ok(Scheduler(Worker {
                    label: "scheduler",
                    log: scheduler_log.clone(),
                }))
            })
            .with_order(5)
            .as_service()
            .build(),
        )
        .unwrap();
    let indexer_log = log.clone();
    container
        .register(
            ComponentDefinition::builder(move |_| {
                Ok(Indexer(Worker {
                    label: "indexer",
                    log: indexer_log.clone(),
                }))
            })
            .with_order(1)
            .as_service()
            .build(),
        )
        .unwrap();

    container.start().unwrap();
    assert_eq!(*log.lock(), ["start indexer", "start scheduler"]);

    container.stop().unwrap();
    container.stop().unwrap();
    assert_eq!(
        *log.lock(),
        ["start indexer", "start scheduler", "stop scheduler", "stop indexer"]
    );
}

#[test]
fn test_failed_service_start_rolls_back() {
    let log = EventLog::default();
    let container = common::container();
    let indexer_log = log.clone();
    container
        .register(
            ComponentDefinition::builder(move |_| {
                Ok(Indexer(Worker {
                    label: "indexer",
                    log: indexer_log.clone(),
                }))
            })
            .as_service()
            .build(),
        )
        .unwrap();
    let mailer_log = log.clone();
    container
        .register(
            ComponentDefinition::builder(move |_| {
                Ok(Mailer(Worker {
                    label: "mailer",
                    log: mailer_log.clone(),
                }))
            })
            .with_order(1)
            .as_service()
            .build(),
        )
        .unwrap();

    let error = container.start().unwrap_err();
    assert_eq!(error.to_string(), "服务生命周期失败: mailer, 原因: smtp unreachable");
    assert_eq!(container.state(), ContainerState::Stopped);
    assert_eq!(*log.lock(), ["start indexer", "stop indexer"]);
}

/// 带标签的组件
struct Labelled {
    label: String,
}

struct LabelProcessor {
    prefix: &'static str,
    order: i32,
    seen: EventLog,
}

impl PostProcessor for LabelProcessor {
    fn name(&self) -> &str {
        self.prefix
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn process(
        &self,
        _definition: &ComponentDefinition,
        instance: ManagedInstance,
    ) -> DependencyResult<ManagedInstance> {
        self.seen.lock().push(format!("{}:{}", self.prefix, instance.name()));
        let current = instance
            .view::<Labelled>()
            .map(|labelled| labelled.label.clone())
            .unwrap_or_default();
        if current.is_empty() {
            return Ok(instance);
        }
        let relabelled = Arc::new(Labelled {
            label: format!("{}{}", self.prefix, current),
        });
        Ok(instance.with_override::<Labelled>(relabelled))
    }
}

#[test]
fn test_post_processors_chain_in_order() {
    let seen = EventLog::default();
    let container = common::container();
    container
        .register_post_processor(Arc::new(LabelProcessor {
            prefix: "outer-",
            order: 10,
            seen: seen.clone(),
        }))
        .unwrap();

    let component_seen = seen.clone();
    container
        .register(
            ComponentDefinition::builder(move |_| {
                Ok(LabelProcessor {
                    prefix: "inner-",
                    order: 1,
                    seen: component_seen.clone(),
                })
            })
            .as_post_processor()
            .build(),
        )
        .unwrap();
    container
        .register(
            ComponentDefinition::builder(|_| {
                Ok(Labelled {
                    label: "report".into(),
                })
            })
            .prototype()
            .build(),
        )
        .unwrap();
    container.start().unwrap();

    let labelled = container.resolve::<Labelled>().unwrap();
    assert_eq!(labelled.label, "outer-inner-report");
    assert!(seen.lock().ends_with(&["inner-:labelled".to_string(), "outer-:labelled".to_string()]));

    // 后置处理器组件本身不经过管道
    assert!(!seen.lock().iter().any(|entry| entry.ends_with("label_processor")));
}

#[test]
fn test_find_and_contains() {
    trait Plugin: Send + Sync {}

    struct Alpha;
    struct Beta;

    impl Plugin for Alpha {}
    impl Plugin for Beta {}

    let container = common::container();
    container
        .register(
            ComponentDefinition::builder(|_| Ok(Beta))
                .with_order(2)
                .provides::<dyn Plugin, _>(|plugin| plugin)
                .build(),
        )
        .unwrap();
    container
        .register(
            ComponentDefinition::builder(|_| Ok(Alpha))
                .with_order(1)
                .provides::<dyn Plugin, _>(|plugin| plugin)
                .build(),
        )
        .unwrap();
    assert!(container.contains(&TypeInfo::of::<dyn Plugin>(), Some("alpha")));
    assert!(!container.contains(&TypeInfo::of::<dyn Plugin>(), Some("gamma")));

    container.start().unwrap();
    let plugins = container
        .find(|definition| definition.satisfies(&TypeInfo::of::<dyn Plugin>()))
        .unwrap();
    let names: Vec<_> = plugins.iter().map(|plugin| plugin.name().to_string()).collect();
    assert_eq!(names, ["alpha", "beta"]);
    assert!(plugins.iter().all(|plugin| plugin.view::<dyn Plugin>().is_some()));
}

#[test]
fn test_eager_singletons_can_be_disabled() {
    common::init_tracing();
    let config = ContainerConfig::default()
        .with_eager_singletons(false)
        .without_builtin_processors();
    let container = ApplicationContainer::with_config(config);
    container
        .register(ComponentDefinition::builder(|_| Err::<Clock, _>("not yet".into())).build())
        .unwrap();

    container.start().unwrap();
    assert!(matches!(
        container.resolve::<Clock>().err(),
        Some(DependencyError::ComponentCreationFailed { .. })
    ));
}
