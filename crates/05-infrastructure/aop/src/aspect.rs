//! 切面定义与切面注册表

use crate::joinpoint::{JoinPoint, MethodInfo, ProceedingJoinPoint};
use crate::pointcut::{MethodMatcher, Pointcut};
use crate::weaver::AspectWeaver;
use infrastructure_common::{InvocationError, InvocationResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// 切面定义
///
/// `order` 越小越靠外层；同一切面内的切点按声明顺序由外向内排列。
#[derive(Debug, Clone)]
pub struct AspectDefinition {
    pub name: String,
    pub order: i32,
    pointcuts: Vec<Pointcut>,
}

impl AspectDefinition {
    /// 创建切面，默认顺序为 0
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: 0,
            pointcuts: Vec::new(),
        }
    }

    /// 设置顺序值，越小越靠外
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// 添加切点
    pub fn pointcut(mut self, pointcut: Pointcut) -> Self {
        self.pointcuts.push(pointcut);
        self
    }

    /// 添加前置 advice
    pub fn before<F>(self, matcher: MethodMatcher, handler: F) -> Self
    where
        F: Fn(&JoinPoint) -> InvocationResult<()> + Send + Sync + 'static,
    {
        self.pointcut(Pointcut::before(matcher, handler))
    }

    /// 添加后置 advice，无论成败都会执行
    pub fn after<F>(self, matcher: MethodMatcher, handler: F) -> Self
    where
        F: Fn(&JoinPoint) -> InvocationResult<()> + Send + Sync + 'static,
    {
        self.pointcut(Pointcut::after(matcher, handler))
    }

    /// 添加环绕 advice
    pub fn around<F>(self, matcher: MethodMatcher, handler: F) -> Self
    where
        F: Fn(&ProceedingJoinPoint<'_>) -> InvocationResult<Value> + Send + Sync + 'static,
    {
        self.pointcut(Pointcut::around(matcher, handler))
    }

    /// 添加正常返回后的 advice
    pub fn after_returning<F>(self, matcher: MethodMatcher, handler: F) -> Self
    where
        F: Fn(&JoinPoint, Value) -> InvocationResult<Value> + Send + Sync + 'static,
    {
        self.pointcut(Pointcut::after_returning(matcher, handler))
    }

    /// 添加抛出错误后的 advice
    pub fn after_raising<F>(self, matcher: MethodMatcher, handler: F) -> Self
    where
        F: Fn(&JoinPoint, InvocationError) -> InvocationResult<Value> + Send + Sync + 'static,
    {
        self.pointcut(Pointcut::after_raising(matcher, handler))
    }

    /// 全部切点，按声明顺序
    pub fn pointcuts(&self) -> &[Pointcut] {
        &self.pointcuts
    }

    /// 切面是否选中方法
    pub fn applies_to(&self, method: &MethodInfo) -> bool {
        self.pointcuts.iter().any(|pointcut| pointcut.matches(method))
    }
}

/// 提供切面的组件
///
/// 切面本身可以是受管组件并拥有依赖，容器启动时解析它并收集定义。
pub trait AspectProvider: Send + Sync {
    fn aspect(self: Arc<Self>) -> AspectDefinition;
}

/// 切面注册表
///
/// 启动阶段收集切面，收集完毕后通过 [`AspectRegistry::into_weaver`] 定稿。
#[derive(Debug, Default)]
pub struct AspectRegistry {
    aspects: Vec<AspectDefinition>,
}

impl AspectRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册切面
    pub fn register(&mut self, aspect: AspectDefinition) {
        debug!(
            "注册切面: {} (order = {}, 切点数 = {})",
            aspect.name,
            aspect.order,
            aspect.pointcuts.len()
        );
        self.aspects.push(aspect);
    }

    /// 已注册的切面数
    pub fn len(&self) -> usize {
        self.aspects.len()
    }

    /// 是否没有切面
    pub fn is_empty(&self) -> bool {
        self.aspects.is_empty()
    }

    /// 按 order 排序（相同 order 保持注册顺序）并生成织入器
    pub fn into_weaver(mut self) -> AspectWeaver {
        self.aspects.sort_by_key(|aspect| aspect.order);
        AspectWeaver::new(self.aspects)
    }
}
