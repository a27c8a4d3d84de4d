//! 组件解析抽象接口
//!
//! 提供解析请求、解析上下文（循环依赖检测）以及容器对外的解析入口

use crate::instance::ManagedInstance;
use crate::registry::ComponentId;
use infrastructure_common::{
    ContainerState, DependencyError, DependencyResult, LogicalUnitId, Scope, TypeInfo,
};
use std::sync::Arc;

/// 解析请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    /// 请求的契约类型
    pub contract: TypeInfo,
    /// 限定名称
    pub name: Option<String>,
    /// 当前逻辑单元
    pub unit: Option<LogicalUnitId>,
}

impl ResolveRequest {
    /// 请求契约 `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            contract: TypeInfo::of::<T>(),
            name: None,
            unit: None,
        }
    }

    /// 按名称限定
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 在逻辑单元内解析
    pub fn in_unit(mut self, unit: LogicalUnitId) -> Self {
        self.unit = Some(unit);
        self
    }
}

/// 解析链中的一帧
#[derive(Debug, Clone)]
pub struct ResolutionFrame {
    pub id: ComponentId,
    pub type_info: TypeInfo,
    pub scope: Scope,
}

/// 解析上下文
///
/// 每次对外解析调用各自持有一个上下文；解析链用于检测循环依赖。
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// 当前逻辑单元
    pub unit: Option<LogicalUnitId>,
    chain: Vec<ResolutionFrame>,
    max_depth: usize,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new(unit: Option<LogicalUnitId>, max_depth: usize) -> Self {
        Self {
            unit,
            chain: Vec::new(),
            max_depth,
        }
    }

    /// 将组件压入解析链；若已在链上则报告循环依赖
    pub fn push(&mut self, frame: ResolutionFrame) -> DependencyResult<()> {
        if let Some(start) = self.chain.iter().position(|entry| entry.id == frame.id) {
            let mut path: Vec<String> = self.chain[start..]
                .iter()
                .map(|entry| entry.type_info.short_name())
                .collect();
            path.push(frame.type_info.short_name());
            return Err(DependencyError::CircularDependency { path });
        }
        if self.chain.len() >= self.max_depth {
            let mut path = self.path();
            path.push(frame.type_info.short_name());
            return Err(DependencyError::ResolutionDepthExceeded {
                max_depth: self.max_depth,
                path,
            });
        }
        self.chain.push(frame);
        Ok(())
    }

    /// 从解析链中移除最后一帧
    pub fn pop(&mut self) {
        self.chain.pop();
    }

    /// 当前解析深度
    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    /// 当前解析路径
    pub fn path(&self) -> Vec<String> {
        self.chain
            .iter()
            .map(|entry| entry.type_info.short_name())
            .collect()
    }

    /// 解析链上最近的单例组件
    pub fn nearest_singleton(&self) -> Option<&ResolutionFrame> {
        self.chain
            .iter()
            .rev()
            .find(|entry| entry.scope == Scope::Singleton)
    }
}

/// 容器对外的解析入口（对象安全）
pub trait ComponentContainer: Send + Sync {
    /// 解析受管实例
    fn resolve_instance(&self, request: &ResolveRequest) -> DependencyResult<ManagedInstance>;

    /// 是否存在满足契约（及名称）的组件
    fn contains(&self, contract: &TypeInfo, name: Option<&str>) -> bool;

    /// 丢弃逻辑单元的全部上下文作用域实例
    fn reset_logical_unit(&self, unit: LogicalUnitId);

    /// 当前生命周期状态
    fn state(&self) -> ContainerState;
}

/// 类型化解析的便捷方法
pub trait ContainerExt: ComponentContainer {
    /// 解析契约 `T`
    fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> DependencyResult<Arc<T>> {
        self.resolve_request(ResolveRequest::of::<T>())
    }

    /// 按名称解析契约 `T`
    fn resolve_named<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DependencyResult<Arc<T>> {
        self.resolve_request(ResolveRequest::of::<T>().named(name))
    }

    /// 在逻辑单元内解析契约 `T`
    fn resolve_in<T: ?Sized + Send + Sync + 'static>(&self, unit: LogicalUnitId) -> DependencyResult<Arc<T>> {
        self.resolve_request(ResolveRequest::of::<T>().in_unit(unit))
    }

    /// 按请求解析契约 `T`
    fn resolve_request<T: ?Sized + Send + Sync + 'static>(&self, request: ResolveRequest) -> DependencyResult<Arc<T>> {
        debug_assert_eq!(request.contract, TypeInfo::of::<T>());
        let instance = self.resolve_instance(&request)?;
        instance.view::<T>().ok_or_else(|| DependencyError::TypeMismatch {
            component: instance.name().to_string(),
            requested: request.contract.short_name(),
        })
    }

    /// 是否存在契约 `T` 的组件
    fn contains_type<T: ?Sized + 'static>(&self) -> bool {
        self.contains(&TypeInfo::of::<T>(), None)
    }
}

impl<C: ComponentContainer + ?Sized> ContainerExt for C {}
