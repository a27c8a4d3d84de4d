//! 作用域行为的集成测试


use di_abstractions::{ComponentContainer, ComponentDefinition, ContainerExt};
use infrastructure_common::{DependencyError, LogicalUnit, LogicalUnitId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

struct Catalog;

struct Cart {
    serial: usize,
}

struct RequestContext {
    serial: usize,
}

#[test]
fn test_concurrent_singleton_is_built_once() {
    let container = common::container();
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();
    container
        .register(
            ComponentDefinition::builder(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(20));
                Ok(Catalog)
            })
            .lazy()
            .build(),
        )
        .unwrap();
    container.start().unwrap();

    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let container = container.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                container.resolve::<Catalog>().unwrap()
            })
        })
        .collect();

    let instances: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();
    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert!(instances.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}

#[test]
fn test_prototype_yields_distinct_instances() {
    let container = common::container();
    let serial = Arc::new(AtomicUsize::new(0));
    let next = serial.clone();
    container
        .register(
            ComponentDefinition::builder(move |_| {
                Ok(Cart {
                    serial: next.fetch_add(1, Ordering::SeqCst),
                })
            })
            .prototype()
            .build(),
        )
        .unwrap();
    container.start().unwrap();

    let carts: Vec<_> = (0..5).map(|_| container.resolve::<Cart>().unwrap()).collect();
    let serials: Vec<_> = carts.iter().map(|cart| cart.serial).collect();
    assert_eq!(serials, [0, 1, 2, 3, 4]);
    assert!(!Arc::ptr_eq(&carts[0], &carts[1]));
}

fn context_container() -> Arc<di_impl::ApplicationContainer> {
    let container = common::container();
    let serial = Arc::new(AtomicUsize::new(0));
    container
        .register(
            ComponentDefinition::builder(move |_| {
                Ok(RequestContext {
                    serial: serial.fetch_add(1, Ordering::SeqCst),
                })
            })
            .context_scoped()
            .build(),
        )
        .unwrap();
    container.start().unwrap();
    container
}

#[test]
fn test_context_scope_is_per_unit_until_reset() {
    let container = context_container();
    let unit = LogicalUnit::new("request");
    let other = unit.child("nested");

    let first = container.resolve_in::<RequestContext>(unit.id).unwrap();
    let again = container.resolve_in::<RequestContext>(unit.id).unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    let elsewhere = container.resolve_in::<RequestContext>(other.id).unwrap();
    assert!(!Arc::ptr_eq(&first, &elsewhere));

    container.reset_logical_unit(unit.id);
    let fresh = container.resolve_in::<RequestContext>(unit.id).unwrap();
    assert!(!Arc::ptr_eq(&first, &fresh));
    assert_eq!(fresh.serial, 2);

    // 其他单元不受影响
    let untouched = container.resolve_in::<RequestContext>(other.id).unwrap();
    assert!(Arc::ptr_eq(&elsewhere, &untouched));
}

#[test]
fn test_context_scope_requires_unit() {
    let container = context_container();
    let error = container.resolve::<RequestContext>().err().unwrap();
    assert!(matches!(error, DependencyError::LogicalUnitRequired { .. }));
}

#[test]
fn test_singleton_depending_on_context_is_rejected() {
    struct Auditor;

    let container = common::container();
    container
        .register(ComponentDefinition::builder(|_| Ok(RequestContext { serial: 0 })).context_scoped().build())
        .unwrap();
    container
        .register(
            ComponentDefinition::builder(|deps| {
                deps.required::<RequestContext>()?;
                Ok(Auditor)
            })
            .with_param::<RequestContext>()
            .build(),
        )
        .unwrap();

    let error = container.start().unwrap_err();
    match error {
        DependencyError::ScopeMismatch { consumer, .. } => assert_eq!(consumer, "Auditor"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_prototype_may_depend_on_context() {
    struct Handler {
        context: Arc<RequestContext>,
    }

    let container = common::container();
    container
        .register(ComponentDefinition::builder(|_| Ok(RequestContext { serial: 0 })).context_scoped().build())
        .unwrap();
    container
        .register(
            ComponentDefinition::builder(|deps| {
                Ok(Handler {
                    context: deps.required::<RequestContext>()?,
                })
            })
            .with_param::<RequestContext>()
            .prototype()
            .build(),
        )
        .unwrap();
    container.start().unwrap();

    let unit = LogicalUnitId::new();
    let first = container.resolve_in::<Handler>(unit).unwrap();
    let second = container.resolve_in::<Handler>(unit).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.context, &second.context));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_units_are_isolated_across_tasks() -> anyhow::Result<()> {
    let container = context_container();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let container = container.clone();
            tokio::spawn(async move {
                let unit = LogicalUnitId::new();
                let first = container.resolve_in::<RequestContext>(unit)?;
                tokio::task::yield_now().await;
                let second = container.resolve_in::<RequestContext>(unit)?;
                container.reset_logical_unit(unit);
                Ok::<_, DependencyError>((first.serial, Arc::ptr_eq(&first, &second)))
            })
        })
        .collect();

    let mut serials = Vec::new();
    for task in tasks {
        let (serial, same) = task.await??;
        assert!(same);
        serials.push(serial);
    }
    serials.sort_unstable();
    serials.dedup();
    assert_eq!(serials.len(), 8);
    Ok(())
}
