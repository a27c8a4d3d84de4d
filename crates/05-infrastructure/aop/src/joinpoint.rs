//! 连接点
//!
//! 被拦截方法的描述（[`MethodInfo`]）与 advice 可见的调用现场
//! （[`JoinPoint`] / [`ProceedingJoinPoint`]）。

use crate::proxy::{Advisable, MethodChain};
use infrastructure_common::InvocationResult;
use serde_json::Value;
use std::collections::BTreeSet;

/// 方法描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    /// 方法名
    pub name: String,
    /// 方法上的标注（如 `"transactional"`）
    pub annotations: BTreeSet<String>,
}

impl MethodInfo {
    /// 创建方法描述
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: BTreeSet::new(),
        }
    }

    /// 添加标注
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.insert(annotation.into());
        self
    }

    /// 是否带有标注
    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations.contains(annotation)
    }
}

/// 调用现场
#[derive(Debug, Clone)]
pub struct JoinPoint {
    /// 组件名称
    pub component: String,
    /// 被调用的方法
    pub method: MethodInfo,
    /// 调用参数
    pub args: Vec<Value>,
}

/// Around advice 可见的调用现场，可通过 `proceed` 执行链的剩余部分
pub struct ProceedingJoinPoint<'a> {
    joinpoint: &'a JoinPoint,
    target: &'a dyn Advisable,
    chain: &'a MethodChain,
    next: usize,
}

impl<'a> ProceedingJoinPoint<'a> {
    pub(crate) fn new(
        joinpoint: &'a JoinPoint,
        target: &'a dyn Advisable,
        chain: &'a MethodChain,
        next: usize,
    ) -> Self {
        Self {
            joinpoint,
            target,
            chain,
            next,
        }
    }

    /// 调用现场
    pub fn joinpoint(&self) -> &JoinPoint {
        self.joinpoint
    }

    /// 调用参数
    pub fn args(&self) -> &[Value] {
        &self.joinpoint.args
    }

    /// 方法描述
    pub fn method(&self) -> &MethodInfo {
        &self.joinpoint.method
    }

    /// 以原参数执行链的剩余部分
    pub fn proceed(&self) -> InvocationResult<Value> {
        self.proceed_with(self.joinpoint.args.clone())
    }

    /// 以新参数执行链的剩余部分
    pub fn proceed_with(&self, args: Vec<Value>) -> InvocationResult<Value> {
        self.chain
            .run(self.target, &self.joinpoint.component, self.next, args)
    }
}
