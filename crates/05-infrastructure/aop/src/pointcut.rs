//! 切点
//!
//! 切点由方法匹配谓词和一条 advice 组成。

use crate::advice::Advice;
use crate::joinpoint::{JoinPoint, MethodInfo, ProceedingJoinPoint};
use infrastructure_common::{InvocationError, InvocationResult};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// 方法匹配谓词
pub type MethodMatcher = Arc<dyn Fn(&MethodInfo) -> bool + Send + Sync>;

/// 匹配所有方法
pub fn any_method() -> MethodMatcher {
    Arc::new(|_| true)
}

/// 按方法名匹配
pub fn method_named(name: impl Into<String>) -> MethodMatcher {
    let name = name.into();
    Arc::new(move |method| method.name == name)
}

/// 按标注匹配
pub fn annotated_with(annotation: impl Into<String>) -> MethodMatcher {
    let annotation = annotation.into();
    Arc::new(move |method| method.has_annotation(&annotation))
}

/// 切点
#[derive(Clone)]
pub struct Pointcut {
    matcher: MethodMatcher,
    advice: Advice,
}

impl Pointcut {
    /// 由谓词和 advice 创建切点
    pub fn new(matcher: MethodMatcher, advice: Advice) -> Self {
        Self { matcher, advice }
    }

    /// 前置切点
    pub fn before<F>(matcher: MethodMatcher, handler: F) -> Self
    where
        F: Fn(&JoinPoint) -> InvocationResult<()> + Send + Sync + 'static,
    {
        Self::new(matcher, Advice::Before(Arc::new(handler)))
    }

    /// 后置切点
    pub fn after<F>(matcher: MethodMatcher, handler: F) -> Self
    where
        F: Fn(&JoinPoint) -> InvocationResult<()> + Send + Sync + 'static,
    {
        Self::new(matcher, Advice::After(Arc::new(handler)))
    }

    /// 环绕切点
    pub fn around<F>(matcher: MethodMatcher, handler: F) -> Self
    where
        F: Fn(&ProceedingJoinPoint<'_>) -> InvocationResult<Value> + Send + Sync + 'static,
    {
        Self::new(matcher, Advice::Around(Arc::new(handler)))
    }

    /// 正常返回切点
    pub fn after_returning<F>(matcher: MethodMatcher, handler: F) -> Self
    where
        F: Fn(&JoinPoint, Value) -> InvocationResult<Value> + Send + Sync + 'static,
    {
        Self::new(matcher, Advice::AfterReturning(Arc::new(handler)))
    }

    /// 错误切点
    pub fn after_raising<F>(matcher: MethodMatcher, handler: F) -> Self
    where
        F: Fn(&JoinPoint, InvocationError) -> InvocationResult<Value> + Send + Sync + 'static,
    {
        Self::new(matcher, Advice::AfterRaising(Arc::new(handler)))
    }

    /// 方法是否被该切点选中
    pub fn matches(&self, method: &MethodInfo) -> bool {
        (self.matcher)(method)
    }

    /// 切点携带的 advice
    pub fn advice(&self) -> &Advice {
        &self.advice
    }
}

impl fmt::Debug for Pointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pointcut")
            .field("advice", &self.advice.kind())
            .finish_non_exhaustive()
    }
}
