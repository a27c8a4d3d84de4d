//! 组件定义
//!
//! 组件在注册时以 [`ComponentDefinition`] 描述：具体类型、满足的契约、
//! 名称、作用域、构造参数、primary 标记与顺序值。定义注册后不可变。

use crate::capability::{ContainerAware, LoggerAware, PostProcessor, Service};
use crate::instance::ManagedInstance;
use infrastructure_common::{BoxError, DependencyError, DependencyResult, Scope, TypeInfo};
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 类型擦除后的组件实例（内部为 `Arc<T>`）
pub type AnyInstance = Arc<dyn Any + Send + Sync>;

/// 契约转换函数：从具体实例得到 `Box<Arc<dyn Contract>>`
type CastFn = Arc<dyn Fn(&AnyInstance) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// 组件工厂函数类型
pub type FactoryFn = Arc<dyn Fn(&mut Dependencies) -> Result<AnyInstance, BoxError> + Send + Sync>;

/// 契约绑定
#[derive(Clone)]
pub struct ContractBinding {
    /// 契约类型
    pub contract: TypeInfo,
    cast: CastFn,
}

impl ContractBinding {
    /// 具体类型自身作为契约
    fn identity<T: Send + Sync + 'static>() -> Self {
        Self {
            contract: TypeInfo::of::<T>(),
            cast: Arc::new(|target: &AnyInstance| {
                target
                    .clone()
                    .downcast::<T>()
                    .ok()
                    .map(|typed| Box::new(typed) as Box<dyn Any + Send + Sync>)
            }),
        }
    }

    /// trait object 契约
    fn upcast<T, I, F>(upcast: F) -> Self
    where
        T: Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        Self {
            contract: TypeInfo::of::<I>(),
            cast: Arc::new(move |target: &AnyInstance| {
                target
                    .clone()
                    .downcast::<T>()
                    .ok()
                    .map(|typed| Box::new(upcast(typed)) as Box<dyn Any + Send + Sync>)
            }),
        }
    }

    /// 以该契约查看目标实例
    pub fn view<I: ?Sized + Send + Sync + 'static>(&self, target: &AnyInstance) -> Option<Arc<I>> {
        (self.cast)(target)
            .and_then(|boxed| boxed.downcast::<Arc<I>>().ok())
            .map(|boxed| *boxed)
    }
}

impl fmt::Debug for ContractBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractBinding")
            .field("contract", &self.contract.path)
            .finish()
    }
}

/// 构造参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// 声明的契约类型
    pub declared_type: TypeInfo,
    /// 限定名称
    pub name: Option<String>,
    /// 是否可选
    pub optional: bool,
}

/// 组件定义
#[derive(Clone)]
pub struct ComponentDefinition {
    /// 具体类型
    pub type_info: TypeInfo,
    /// 组件名称（限定符）
    pub name: String,
    /// 作用域
    pub scope: Scope,
    /// 构造参数，按声明顺序
    pub params: Vec<Parameter>,
    /// 是否为 primary 候选
    pub primary: bool,
    /// 顺序值，越小越先
    pub order: i32,
    /// 是否跳过启动时的预先实例化
    pub lazy: bool,
    contracts: Arc<Vec<ContractBinding>>,
    factory: FactoryFn,
}

impl ComponentDefinition {
    /// 以工厂函数开始构建定义
    pub fn builder<T, F>(factory: F) -> DefinitionBuilder<T>
    where
        T: Send + Sync + 'static,
        F: Fn(&mut Dependencies) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        DefinitionBuilder::new(Arc::new(move |deps: &mut Dependencies| {
            factory(deps).map(|value| Arc::new(value) as AnyInstance)
        }))
    }

    /// 以现成实例构建单例定义
    pub fn instance<T: Send + Sync + 'static>(value: Arc<T>) -> DefinitionBuilder<T> {
        DefinitionBuilder::new(Arc::new(move |_: &mut Dependencies| {
            Ok(value.clone() as AnyInstance)
        }))
    }

    /// 满足的契约
    pub fn contracts(&self) -> &[ContractBinding] {
        &self.contracts
    }

    /// 是否满足指定契约
    pub fn satisfies(&self, contract: &TypeInfo) -> bool {
        self.contracts.iter().any(|binding| binding.contract == *contract)
    }

    /// 调用工厂创建原始实例
    pub fn instantiate(&self, dependencies: &mut Dependencies) -> DependencyResult<ManagedInstance> {
        let target = (self.factory)(dependencies)
            .map_err(|source| DependencyError::creation_failed(self.type_info.short_name(), source))?;
        Ok(ManagedInstance::new(
            self.name.clone(),
            self.type_info,
            target,
            self.contracts.clone(),
        ))
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("type", &self.type_info.path)
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("params", &self.params)
            .field("primary", &self.primary)
            .field("order", &self.order)
            .field("lazy", &self.lazy)
            .field("contracts", &self.contracts)
            .finish()
    }
}

/// 组件定义构建器
pub struct DefinitionBuilder<T> {
    name: Option<String>,
    scope: Scope,
    params: Vec<Parameter>,
    primary: bool,
    order: i32,
    lazy: bool,
    contracts: Vec<ContractBinding>,
    factory: FactoryFn,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> DefinitionBuilder<T> {
    fn new(factory: FactoryFn) -> Self {
        Self {
            name: None,
            scope: Scope::default(),
            params: Vec::new(),
            primary: false,
            order: 0,
            lazy: false,
            contracts: vec![ContractBinding::identity::<T>()],
            factory,
            _marker: PhantomData,
        }
    }

    /// 设置名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 设置作用域
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// 设置为原型作用域
    pub fn prototype(self) -> Self {
        self.with_scope(Scope::Prototype)
    }

    /// 设置为上下文作用域
    pub fn context_scoped(self) -> Self {
        self.with_scope(Scope::Context)
    }

    /// 标记为 primary
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// 设置顺序值
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// 启动时不预先实例化
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    /// 添加必需的构造参数
    pub fn with_param<I: ?Sized + 'static>(self) -> Self {
        self.push_param(TypeInfo::of::<I>(), None, false)
    }

    /// 添加带限定名称的构造参数
    pub fn with_named_param<I: ?Sized + 'static>(self, name: impl Into<String>) -> Self {
        self.push_param(TypeInfo::of::<I>(), Some(name.into()), false)
    }

    /// 添加可选的构造参数
    pub fn with_optional_param<I: ?Sized + 'static>(self) -> Self {
        self.push_param(TypeInfo::of::<I>(), None, true)
    }

    fn push_param(mut self, declared_type: TypeInfo, name: Option<String>, optional: bool) -> Self {
        self.params.push(Parameter {
            declared_type,
            name,
            optional,
        });
        self
    }

    /// 声明组件满足的 trait object 契约
    pub fn provides<I, F>(mut self, upcast: F) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        let binding = ContractBinding::upcast::<T, I, F>(upcast);
        self.contracts.retain(|existing| existing.contract != binding.contract);
        self.contracts.push(binding);
        self
    }

    /// 构建定义
    pub fn build(self) -> ComponentDefinition {
        let type_info = TypeInfo::of::<T>();
        ComponentDefinition {
            name: self.name.unwrap_or_else(|| type_info.canonical_name()),
            type_info,
            scope: self.scope,
            params: self.params,
            primary: self.primary,
            order: self.order,
            lazy: self.lazy,
            contracts: Arc::new(self.contracts),
            factory: self.factory,
        }
    }
}

impl<T: PostProcessor> DefinitionBuilder<T> {
    /// 作为后置处理器注册
    pub fn as_post_processor(self) -> Self {
        self.provides::<dyn PostProcessor, _>(|processor| processor)
    }
}

impl<T: Service> DefinitionBuilder<T> {
    /// 作为受容器管理的服务注册
    pub fn as_service(self) -> Self {
        self.provides::<dyn Service, _>(|service| service)
    }
}

impl<T: ContainerAware> DefinitionBuilder<T> {
    /// 启动时注入容器句柄
    pub fn container_aware(self) -> Self {
        self.provides::<dyn ContainerAware, _>(|aware| aware)
    }
}

impl<T: LoggerAware> DefinitionBuilder<T> {
    /// 启动时注入日志 span
    pub fn logger_aware(self) -> Self {
        self.provides::<dyn LoggerAware, _>(|aware| aware)
    }
}

/// 工厂可见的已解析依赖，按参数声明顺序依次取出
pub struct Dependencies {
    owner: String,
    resolved: VecDeque<(Parameter, Option<ManagedInstance>)>,
}

impl Dependencies {
    /// 创建依赖集合
    pub fn new(owner: impl Into<String>, resolved: Vec<(Parameter, Option<ManagedInstance>)>) -> Self {
        Self {
            owner: owner.into(),
            resolved: resolved.into(),
        }
    }

    /// 无依赖
    pub fn empty(owner: impl Into<String>) -> Self {
        Self::new(owner, Vec::new())
    }

    /// 剩余参数数量
    pub fn remaining(&self) -> usize {
        self.resolved.len()
    }

    /// 取出下一个必需参数
    pub fn required<I: ?Sized + Send + Sync + 'static>(&mut self) -> DependencyResult<Arc<I>> {
        let (param, instance) = self.next_param::<I>()?;
        let instance = instance.ok_or_else(|| {
            DependencyError::not_found(param.declared_type.short_name(), param.name.as_deref())
        })?;
        instance.view::<I>().ok_or_else(|| DependencyError::TypeMismatch {
            component: instance.name().to_string(),
            requested: TypeInfo::of::<I>().short_name(),
        })
    }

    /// 取出下一个可选参数，缺失时为 `None`
    pub fn optional<I: ?Sized + Send + Sync + 'static>(&mut self) -> DependencyResult<Option<Arc<I>>> {
        let (_, instance) = self.next_param::<I>()?;
        match instance {
            Some(instance) => instance
                .view::<I>()
                .map(Some)
                .ok_or_else(|| DependencyError::TypeMismatch {
                    component: instance.name().to_string(),
                    requested: TypeInfo::of::<I>().short_name(),
                }),
            None => Ok(None),
        }
    }

    fn next_param<I: ?Sized + 'static>(&mut self) -> DependencyResult<(Parameter, Option<ManagedInstance>)> {
        let requested = TypeInfo::of::<I>();
        let (param, instance) = self.resolved.pop_front().ok_or_else(|| {
            DependencyError::ParameterMismatch {
                component: self.owner.clone(),
                message: format!("没有剩余参数可作为 {requested} 使用"),
            }
        })?;
        if param.declared_type != requested {
            return Err(DependencyError::ParameterMismatch {
                component: self.owner.clone(),
                message: format!("参数声明为 {}, 实际按 {requested} 读取", param.declared_type),
            });
        }
        Ok((param, instance))
    }
}
