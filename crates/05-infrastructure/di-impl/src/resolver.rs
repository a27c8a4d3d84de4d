//! 依赖解析器
//!
//! 候选选择、递归解析构造参数、循环依赖与作用域检查，
//! 新建实例依次经过切面织入与后置处理后存入作用域。

use crate::pipeline::PostProcessorPipeline;
use crate::scope_store::ScopeStore;
use aop::{Advisable, AspectWeaver};
use di_abstractions::{
    ComponentDefinition, ComponentId, ComponentRegistry, Dependencies, ManagedInstance,
    ResolutionFrame, ResolveContext, ResolveRequest,
};
use infrastructure_common::{DependencyError, DependencyResult, Scope, TypeInfo};
use tracing::debug;

/// 从注册表中为契约（及名称）选出唯一候选
///
/// 指定名称时只保留同名候选；剩余多个候选时取唯一的 primary，
/// 没有或有多个 primary 都视为歧义。
pub fn select_candidate(
    registry: &ComponentRegistry,
    contract: &TypeInfo,
    name: Option<&str>,
) -> DependencyResult<ComponentId> {
    let candidates: Vec<_> = registry
        .candidates(contract)
        .into_iter()
        .filter(|(_, definition)| name.map_or(true, |name| definition.name == name))
        .collect();

    match candidates.as_slice() {
        [] => Err(DependencyError::not_found(contract.short_name(), name)),
        [(id, _)] => Ok(*id),
        _ => {
            let primaries: Vec<_> = candidates
                .iter()
                .filter(|(_, definition)| definition.primary)
                .collect();
            match primaries.as_slice() {
                [(id, _)] => Ok(*id),
                _ => Err(DependencyError::AmbiguousCandidate {
                    type_name: contract.short_name(),
                    candidates: candidates
                        .iter()
                        .map(|(_, definition)| definition.name.clone())
                        .collect(),
                }),
            }
        }
    }
}

/// 依赖解析器
///
/// 启动过程中切面与后置处理器尚未定稿时，解析器不带织入器或管道运行，
/// 此时创建的组件不会被织入或后置处理。
pub struct Resolver<'a> {
    registry: &'a ComponentRegistry,
    scopes: &'a ScopeStore,
    weaver: Option<&'a AspectWeaver>,
    pipeline: Option<&'a PostProcessorPipeline>,
}

impl<'a> Resolver<'a> {
    /// 创建不带织入器与管道的解析器
    pub fn new(registry: &'a ComponentRegistry, scopes: &'a ScopeStore) -> Self {
        Self {
            registry,
            scopes,
            weaver: None,
            pipeline: None,
        }
    }

    /// 设置切面织入器
    pub fn with_weaver(mut self, weaver: Option<&'a AspectWeaver>) -> Self {
        self.weaver = weaver;
        self
    }

    /// 设置后置处理管道
    pub fn with_pipeline(mut self, pipeline: Option<&'a PostProcessorPipeline>) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// 按请求解析
    pub fn resolve(&self, request: &ResolveRequest, context: &mut ResolveContext) -> DependencyResult<ManagedInstance> {
        let id = select_candidate(self.registry, &request.contract, request.name.as_deref())?;
        self.resolve_definition(id, context)
    }

    /// 解析指定组件
    pub fn resolve_definition(&self, id: ComponentId, context: &mut ResolveContext) -> DependencyResult<ManagedInstance> {
        let definition = self
            .registry
            .get(id)
            .ok_or_else(|| DependencyError::not_found(id.to_string(), None))?;

        if definition.scope == Scope::Context {
            if let Some(consumer) = context.nearest_singleton() {
                return Err(DependencyError::ScopeMismatch {
                    consumer: consumer.type_info.short_name(),
                    expected: Scope::Singleton.to_string(),
                    actual: format!("{} ({})", definition.type_info.short_name(), Scope::Context),
                });
            }
            if context.unit.is_none() {
                return Err(DependencyError::LogicalUnitRequired {
                    type_name: definition.type_info.short_name(),
                });
            }
        }

        let frame = ResolutionFrame {
            id,
            type_info: definition.type_info,
            scope: definition.scope,
        };

        let Some(slot) = self.scopes.slot(id, definition.scope, context.unit) else {
            context.push(frame)?;
            let created = self.create(definition, context);
            context.pop();
            return created;
        };

        if let Some(instance) = slot.get() {
            return Ok(instance.clone());
        }

        context.push(frame)?;
        let stored = slot
            .get_or_try_init(|| self.create(definition, context))
            .cloned();
        context.pop();
        stored
    }

    fn create(&self, definition: &ComponentDefinition, context: &mut ResolveContext) -> DependencyResult<ManagedInstance> {
        debug!(
            "创建组件: {} ({}, 作用域 = {})",
            definition.name,
            definition.type_info.short_name(),
            definition.scope
        );

        let mut resolved = Vec::with_capacity(definition.params.len());
        for param in &definition.params {
            if param.optional && !self.registry.contains(&param.declared_type, param.name.as_deref()) {
                resolved.push((param.clone(), None));
                continue;
            }
            let request = ResolveRequest {
                contract: param.declared_type,
                name: param.name.clone(),
                unit: context.unit,
            };
            let instance = self.resolve(&request, context)?;
            resolved.push((param.clone(), Some(instance)));
        }

        let mut dependencies = Dependencies::new(definition.name.clone(), resolved);
        let instance = definition.instantiate(&mut dependencies)?;
        let instance = self.weave(definition, instance);

        match self.pipeline {
            Some(pipeline) => pipeline.apply_all(definition, instance),
            None => Ok(instance),
        }
    }

    fn weave(&self, definition: &ComponentDefinition, instance: ManagedInstance) -> ManagedInstance {
        let Some(weaver) = self.weaver else {
            return instance;
        };
        let Some(target) = instance.target_view::<dyn Advisable>() else {
            return instance;
        };
        match weaver.weave(&definition.name, target) {
            Some(proxy) => {
                debug!("组件已织入切面: {}", definition.name);
                instance.with_override::<dyn Advisable>(proxy)
            }
            None => instance,
        }
    }
}
