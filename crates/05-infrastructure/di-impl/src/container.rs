//! 应用容器
//!
//! 组合注册表、作用域存储、解析器、切面织入器与后置处理管道，
//! 并管理 `Building -> Started -> Stopped` 生命周期。

use crate::config::ContainerConfig;
use crate::pipeline::PostProcessorPipeline;
use crate::processors::{AwarePostProcessor, ServicePostProcessor};
use crate::resolver::Resolver;
use crate::scope_store::ScopeStore;
use aop::{AspectDefinition, AspectProvider, AspectRegistry, AspectWeaver};
use di_abstractions::{
    ComponentContainer, ComponentDefinition, ComponentId, ComponentRegistry, ComponentScanner,
    ManagedInstance, PostProcessor, ResolveContext, ResolveRequest,
};
use infrastructure_common::{
    ContainerState, DependencyError, DependencyResult, LogicalUnitId, Scope, TypeInfo,
};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use tracing::{debug, error, info, warn};

/// 构建阶段收集的注册内容
///
/// 组件与切面共用一个注册序号，切面 order 相同时按序号先后排列。
#[derive(Default)]
struct Registrations {
    registry: ComponentRegistry,
    component_sequence: Vec<u64>,
    post_processors: Vec<Arc<dyn PostProcessor>>,
    aspects: Vec<(u64, AspectDefinition)>,
    sequence: u64,
}

impl Registrations {
    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

/// 应用容器
///
/// 通过 [`ApplicationContainer::new`] 创建后以 `Arc` 共享；
/// 构建阶段注册组件，[`start`](Self::start) 之后只读并可被多线程并发解析。
pub struct ApplicationContainer {
    config: ContainerConfig,
    this: Weak<ApplicationContainer>,
    state: RwLock<ContainerState>,
    lifecycle: Mutex<()>,
    booting: Mutex<Option<ThreadId>>,
    pending: Mutex<Registrations>,
    registry: OnceCell<Arc<ComponentRegistry>>,
    scopes: ScopeStore,
    weaver: OnceCell<AspectWeaver>,
    pipeline: OnceCell<PostProcessorPipeline>,
    services: OnceCell<Arc<ServicePostProcessor>>,
}

impl ApplicationContainer {
    /// 以默认配置创建容器
    pub fn new() -> Arc<Self> {
        Self::with_config(ContainerConfig::default())
    }

    /// 以指定配置创建容器
    pub fn with_config(config: ContainerConfig) -> Arc<Self> {
        info!("创建应用容器: {:?}", config);
        Arc::new_cyclic(|this| Self {
            config,
            this: this.clone(),
            state: RwLock::new(ContainerState::Building),
            lifecycle: Mutex::new(()),
            booting: Mutex::new(None),
            pending: Mutex::new(Registrations::default()),
            registry: OnceCell::new(),
            scopes: ScopeStore::new(),
            weaver: OnceCell::new(),
            pipeline: OnceCell::new(),
            services: OnceCell::new(),
        })
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// 容器自身的弱引用句柄
    pub fn handle(&self) -> Weak<dyn ComponentContainer> {
        self.this.clone()
    }

    /// 注册组件定义
    pub fn register(&self, definition: ComponentDefinition) -> DependencyResult<ComponentId> {
        let state = self.state.read();
        Self::ensure_building(*state, &definition.name)?;
        info!(
            "注册组件: {} ({}, 作用域 = {})",
            definition.name,
            definition.type_info.short_name(),
            definition.scope
        );
        let mut pending = self.pending.lock();
        let id = pending.registry.register(definition)?;
        let sequence = pending.next_sequence();
        pending.component_sequence.push(sequence);
        Ok(id)
    }

    /// 注册现成的单例实例
    pub fn register_instance<T: Send + Sync + 'static>(&self, value: Arc<T>) -> DependencyResult<ComponentId> {
        self.register(ComponentDefinition::instance(value).build())
    }

    /// 通过扫描器注册指定位置中的组件，返回新注册数量
    ///
    /// 位置之间有重叠时，同一组件只注册一次。
    pub fn scan(&self, scanner: &dyn ComponentScanner, locations: &[&str]) -> DependencyResult<usize> {
        let mut seen = HashSet::new();
        let mut count = 0;
        for location in locations {
            if !scanner.supports(location) {
                warn!("扫描器 {} 不支持位置: {:?}", scanner.name(), location);
                continue;
            }
            let definitions = scanner.scan(location)?;
            debug!("扫描 {}: 发现 {} 个组件", location, definitions.len());
            for definition in definitions {
                if seen.insert((definition.type_info, definition.name.clone())) {
                    self.register(definition)?;
                    count += 1;
                }
            }
        }
        info!("扫描完成: {} 个位置, 注册 {} 个组件", locations.len(), count);
        Ok(count)
    }

    /// 注册后置处理器实例
    pub fn register_post_processor(&self, processor: Arc<dyn PostProcessor>) -> DependencyResult<()> {
        let state = self.state.read();
        Self::ensure_building(*state, processor.name())?;
        info!("注册后置处理器: {} (order = {})", processor.name(), processor.order());
        self.pending.lock().post_processors.push(processor);
        Ok(())
    }

    /// 注册切面定义
    pub fn register_aspect(&self, aspect: AspectDefinition) -> DependencyResult<()> {
        let state = self.state.read();
        Self::ensure_building(*state, &aspect.name)?;
        info!("注册切面: {} (order = {})", aspect.name, aspect.order);
        let mut pending = self.pending.lock();
        let sequence = pending.next_sequence();
        pending.aspects.push((sequence, aspect));
        Ok(())
    }

    fn ensure_building(state: ContainerState, what: &str) -> DependencyResult<()> {
        if state.accepts_registration() {
            Ok(())
        } else {
            Err(DependencyError::RegistrationClosed {
                what: what.to_string(),
            })
        }
    }

    /// 启动容器
    ///
    /// 冻结注册表，解析切面与后置处理器组件并定稿，按 order 预先实例化非延迟单例，
    /// 最后启动服务。任一步失败时清空作用域并进入 `Stopped`。
    ///
    /// 启动期间其他线程的解析请求会等待启动结束。
    pub fn start(&self) -> DependencyResult<()> {
        let _lifecycle = self.lifecycle.lock();
        {
            let mut state = self.state.write();
            match *state {
                ContainerState::Started => return Ok(()),
                ContainerState::Stopped => return Err(DependencyError::ContainerStopped),
                _ => *state = ContainerState::Starting,
            }
        }
        info!("容器启动中");

        *self.booting.lock() = Some(thread::current().id());
        let registrations = std::mem::take(&mut *self.pending.lock());
        let booted = self.boot(registrations);
        *self.booting.lock() = None;
        match booted {
            Ok(()) => {
                *self.state.write() = ContainerState::Started;
                info!(
                    "容器已启动: {} 个组件, {} 个单例已实例化",
                    self.registry().map(|registry| registry.len()).unwrap_or(0),
                    self.scopes.singleton_count()
                );
                Ok(())
            }
            Err(cause) => {
                error!("容器启动失败: {}", cause);
                if let Some(Err(stop_error)) = self.services.get().map(|services| services.stop_all()) {
                    warn!("回滚已启动服务时出错: {}", stop_error);
                }
                self.scopes.clear();
                *self.state.write() = ContainerState::Stopped;
                Err(cause)
            }
        }
    }

    fn boot(&self, registrations: Registrations) -> DependencyResult<()> {
        let Registrations {
            registry: components,
            component_sequence,
            mut post_processors,
            mut aspects,
            ..
        } = registrations;
        let registry = self.registry.get_or_init(|| Arc::new(components)).clone();

        let bootstrap = Resolver::new(&registry, &self.scopes);
        for (id, _) in registry.ordered_candidates(&TypeInfo::of::<dyn AspectProvider>()) {
            let instance = bootstrap.resolve_definition(id, &mut self.new_context(None))?;
            if let Some(provider) = instance.view::<dyn AspectProvider>() {
                let sequence = component_sequence.get(id.index()).copied().unwrap_or(u64::MAX);
                aspects.push((sequence, provider.aspect()));
            }
        }
        aspects.sort_by_key(|(sequence, _)| *sequence);
        let mut aspect_registry = AspectRegistry::new();
        for (_, aspect) in aspects {
            aspect_registry.register(aspect);
        }
        info!("切面定稿: {} 个", aspect_registry.len());
        let weaver = self.weaver.get_or_init(|| aspect_registry.into_weaver());

        if self.config.register_builtin_processors {
            let services = self
                .services
                .get_or_init(|| Arc::new(ServicePostProcessor::new()))
                .clone();
            post_processors.push(Arc::new(AwarePostProcessor::new(self.handle())));
            post_processors.push(services);
        }
        for instance in self.resolve_capable::<dyn PostProcessor>(&registry, weaver)? {
            if let Some(processor) = instance.view::<dyn PostProcessor>() {
                post_processors.push(processor);
            }
        }
        let pipeline = self
            .pipeline
            .get_or_init(|| PostProcessorPipeline::new(post_processors));
        info!("后置处理器定稿: {:?}", pipeline.names());

        if self.config.eager_singletons {
            let resolver = Resolver::new(&registry, &self.scopes)
                .with_weaver(Some(weaver))
                .with_pipeline(Some(pipeline));
            let mut eager: Vec<_> = registry
                .iter()
                .filter(|(_, definition)| definition.scope == Scope::Singleton && !definition.lazy)
                .collect();
            eager.sort_by_key(|(id, definition)| (definition.order, *id));
            for (id, definition) in eager {
                debug!("预先实例化单例: {}", definition.name);
                resolver.resolve_definition(id, &mut self.new_context(None))?;
            }
        }

        if let Some(services) = self.services.get() {
            services.start_all()?;
        }
        Ok(())
    }

    /// 在管道定稿前解析全部声明了契约 `I` 的组件，按 (order, 注册顺序)
    fn resolve_capable<I: ?Sized + 'static>(
        &self,
        registry: &ComponentRegistry,
        weaver: &AspectWeaver,
    ) -> DependencyResult<Vec<ManagedInstance>> {
        let resolver = Resolver::new(registry, &self.scopes).with_weaver(Some(weaver));
        registry
            .ordered_candidates(&TypeInfo::of::<I>())
            .into_iter()
            .map(|(id, _)| resolver.resolve_definition(id, &mut self.new_context(None)))
            .collect()
    }

    /// 停止容器
    ///
    /// 逆序停止服务并清空全部作用域；重复调用无副作用。服务停止失败不会中断停止流程，
    /// 第一个失败在最后返回。
    pub fn stop(&self) -> DependencyResult<()> {
        let _lifecycle = self.lifecycle.lock();
        let previous = std::mem::replace(&mut *self.state.write(), ContainerState::Stopped);
        if previous == ContainerState::Stopped {
            return Ok(());
        }

        let stopped = match self.services.get() {
            Some(services) => services.stop_all(),
            None => Ok(()),
        };
        self.scopes.clear();
        info!("容器已停止 (之前状态: {:?})", previous);
        stopped
    }

    /// 解析全部满足条件的组件，按 (order, 注册顺序)
    pub fn find<F>(&self, selector: F) -> DependencyResult<Vec<ManagedInstance>>
    where
        F: Fn(&ComponentDefinition) -> bool,
    {
        self.find_in(selector, None)
    }

    /// 在逻辑单元内解析全部满足条件的组件
    pub fn find_in<F>(&self, selector: F, unit: Option<LogicalUnitId>) -> DependencyResult<Vec<ManagedInstance>>
    where
        F: Fn(&ComponentDefinition) -> bool,
    {
        let registry = self.serving_registry()?;
        let resolver = self.resolver(&registry);
        let mut matched: Vec<_> = registry
            .iter()
            .filter(|(_, definition)| selector(definition))
            .collect();
        matched.sort_by_key(|(id, definition)| (definition.order, *id));
        matched
            .into_iter()
            .map(|(id, _)| resolver.resolve_definition(id, &mut self.new_context(unit)))
            .collect()
    }

    /// 已注册的全部定义，按注册顺序
    pub fn definitions(&self) -> Vec<Arc<ComponentDefinition>> {
        match self.registry() {
            Some(registry) => registry.iter().map(|(_, definition)| definition.clone()).collect(),
            None => self
                .pending
                .lock()
                .registry
                .iter()
                .map(|(_, definition)| definition.clone())
                .collect(),
        }
    }

    fn registry(&self) -> Option<&Arc<ComponentRegistry>> {
        self.registry.get()
    }

    /// 可对外解析的注册表；构建阶段与停止后分别报错
    ///
    /// `Starting` 期间只有执行启动的线程可以解析，其他线程等到启动结束，
    /// 以免在织入器与管道定稿前缓存未经处理的实例。
    fn serving_registry(&self) -> DependencyResult<Arc<ComponentRegistry>> {
        loop {
            let state = *self.state.read();
            match state {
                ContainerState::Building => return Err(DependencyError::ContainerNotStarted),
                ContainerState::Stopped => return Err(DependencyError::ContainerStopped),
                ContainerState::Started => break,
                ContainerState::Starting if self.is_booting_thread() => break,
                ContainerState::Starting => {
                    debug!("容器启动中，等待启动完成后再解析");
                    drop(self.lifecycle.lock());
                }
            }
        }
        self.registry()
            .cloned()
            .ok_or(DependencyError::ContainerNotStarted)
    }

    fn is_booting_thread(&self) -> bool {
        *self.booting.lock() == Some(thread::current().id())
    }

    fn resolver<'a>(&'a self, registry: &'a ComponentRegistry) -> Resolver<'a> {
        Resolver::new(registry, &self.scopes)
            .with_weaver(self.weaver.get())
            .with_pipeline(self.pipeline.get())
    }

    fn new_context(&self, unit: Option<LogicalUnitId>) -> ResolveContext {
        ResolveContext::new(unit, self.config.max_resolution_depth)
    }
}

impl ComponentContainer for ApplicationContainer {
    fn resolve_instance(&self, request: &ResolveRequest) -> DependencyResult<ManagedInstance> {
        let registry = self.serving_registry()?;
        self.resolver(&registry)
            .resolve(request, &mut self.new_context(request.unit))
    }

    fn contains(&self, contract: &TypeInfo, name: Option<&str>) -> bool {
        match self.registry() {
            Some(registry) => registry.contains(contract, name),
            None => self.pending.lock().registry.contains(contract, name),
        }
    }

    fn reset_logical_unit(&self, unit: LogicalUnitId) {
        self.scopes.reset_logical_unit(unit);
    }

    fn state(&self) -> ContainerState {
        *self.state.read()
    }
}

impl fmt::Debug for ApplicationContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationContainer")
            .field("state", &*self.state.read())
            .field("config", &self.config)
            .field("singletons", &self.scopes.singleton_count())
            .finish_non_exhaustive()
    }
}
