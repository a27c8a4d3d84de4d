//! 内置后置处理器
//!
//! - [`AwarePostProcessor`]：为声明了 `ContainerAware` / `LoggerAware` 的组件注入容器句柄与日志 span
//! - [`ServicePostProcessor`]：收集声明了 `Service` 的单例组件，由容器统一启停

use di_abstractions::{
    ComponentContainer, ComponentDefinition, ContainerAware, LoggerAware, ManagedInstance,
    PostProcessor, Service,
};
use infrastructure_common::{DependencyError, DependencyResult, Scope};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, info_span, warn};

/// Aware 处理器的执行顺序
pub const AWARE_PROCESSOR_ORDER: i32 = -200;
/// Service 处理器的执行顺序
pub const SERVICE_PROCESSOR_ORDER: i32 = -100;

/// Aware 后置处理器
pub struct AwarePostProcessor {
    container: Weak<dyn ComponentContainer>,
}

impl AwarePostProcessor {
    pub fn new(container: Weak<dyn ComponentContainer>) -> Self {
        Self { container }
    }
}

impl PostProcessor for AwarePostProcessor {
    fn name(&self) -> &str {
        "aware"
    }

    fn order(&self) -> i32 {
        AWARE_PROCESSOR_ORDER
    }

    fn process(
        &self,
        definition: &ComponentDefinition,
        instance: ManagedInstance,
    ) -> DependencyResult<ManagedInstance> {
        if let Some(aware) = instance.view::<dyn ContainerAware>() {
            debug!("注入容器句柄: {}", definition.name);
            aware.set_container(self.container.clone());
        }
        if let Some(aware) = instance.view::<dyn LoggerAware>() {
            debug!("注入日志 span: {}", definition.name);
            aware.set_logger(info_span!("component", name = %definition.name));
        }
        Ok(instance)
    }
}

struct ManagedService {
    name: String,
    order: i32,
    service: Arc<dyn Service>,
}

/// Service 后置处理器
///
/// 容器启动前创建的服务在 [`ServicePostProcessor::start_all`] 时按 order 启动；
/// 启动之后才创建的服务（延迟单例）在创建时立即启动。停止按启动的逆序进行。
#[derive(Default)]
pub struct ServicePostProcessor {
    pending: Mutex<Vec<ManagedService>>,
    started: Mutex<Vec<ManagedService>>,
    running: AtomicBool,
}

impl ServicePostProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已启动的服务名称，按启动顺序
    pub fn started(&self) -> Vec<String> {
        self.started
            .lock()
            .iter()
            .map(|service| service.name.clone())
            .collect()
    }

    /// 按 order 启动全部已收集的服务
    ///
    /// 任一服务启动失败时立即返回错误，已启动的服务保留在停止列表中。
    pub fn start_all(&self) -> DependencyResult<()> {
        let mut pending = std::mem::take(&mut *self.pending.lock());
        pending.sort_by_key(|service| service.order);
        for service in pending {
            self.start_one(service)?;
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// 逆序停止全部已启动的服务，返回第一个失败
    pub fn stop_all(&self) -> DependencyResult<()> {
        self.running.store(false, Ordering::SeqCst);
        let started = std::mem::take(&mut *self.started.lock());
        let mut first_error = None;
        for service in started.into_iter().rev() {
            info!("停止服务: {}", service.name);
            if let Err(source) = service.service.stop() {
                warn!("服务停止失败: {}, 原因: {}", service.name, source);
                first_error.get_or_insert(DependencyError::ServiceLifecycleFailed {
                    component: service.name,
                    source,
                });
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn start_one(&self, service: ManagedService) -> DependencyResult<()> {
        info!("启动服务: {}", service.name);
        service
            .service
            .start()
            .map_err(|source| DependencyError::ServiceLifecycleFailed {
                component: service.name.clone(),
                source,
            })?;
        self.started.lock().push(service);
        Ok(())
    }
}

impl PostProcessor for ServicePostProcessor {
    fn name(&self) -> &str {
        "service"
    }

    fn order(&self) -> i32 {
        SERVICE_PROCESSOR_ORDER
    }

    fn process(
        &self,
        definition: &ComponentDefinition,
        instance: ManagedInstance,
    ) -> DependencyResult<ManagedInstance> {
        let Some(service) = instance.view::<dyn Service>() else {
            return Ok(instance);
        };
        if definition.scope != Scope::Singleton {
            warn!(
                "忽略非单例服务: {} (作用域 = {})，容器只管理单例服务的启停",
                definition.name, definition.scope
            );
            return Ok(instance);
        }

        let managed = ManagedService {
            name: definition.name.clone(),
            order: definition.order,
            service,
        };
        if self.running.load(Ordering::SeqCst) {
            self.start_one(managed)?;
        } else {
            debug!("收集服务: {}", definition.name);
            self.pending.lock().push(managed);
        }
        Ok(instance)
    }
}
