//! 可拦截组件与代理

use crate::advice::Advice;
use crate::joinpoint::{JoinPoint, MethodInfo, ProceedingJoinPoint};
use infrastructure_common::InvocationResult;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 可被切面拦截的组件
///
/// 组件声明自身的方法表，并通过统一的 `invoke` 入口分派调用，
/// 代理与目标因此共享同一套调用接口。
pub trait Advisable: Send + Sync {
    /// 方法表
    fn methods(&self) -> Vec<MethodInfo>;

    /// 调用方法
    fn invoke(&self, method: &str, args: Vec<Value>) -> InvocationResult<Value>;
}

/// 单个方法上的 advice 链，下标 0 为最外层
#[derive(Debug, Clone)]
pub struct MethodChain {
    method: MethodInfo,
    links: Vec<Advice>,
}

impl MethodChain {
    pub(crate) fn new(method: MethodInfo, links: Vec<Advice>) -> Self {
        Self { method, links }
    }

    /// 链所属的方法
    pub fn method(&self) -> &MethodInfo {
        &self.method
    }

    /// 按从外到内排列的 advice
    pub fn links(&self) -> &[Advice] {
        &self.links
    }

    /// 从第 `index` 层开始执行链，链尾调用目标
    pub(crate) fn run(
        &self,
        target: &dyn Advisable,
        component: &str,
        index: usize,
        args: Vec<Value>,
    ) -> InvocationResult<Value> {
        let Some(advice) = self.links.get(index) else {
            return target.invoke(&self.method.name, args);
        };

        let joinpoint = JoinPoint {
            component: component.to_string(),
            method: self.method.clone(),
            args,
        };
        let next = index + 1;

        match advice {
            Advice::Before(handler) => {
                handler(&joinpoint)?;
                self.run(target, component, next, joinpoint.args)
            }
            Advice::After(handler) => {
                let outcome = self.run(target, component, next, joinpoint.args.clone());
                handler(&joinpoint)?;
                outcome
            }
            Advice::Around(handler) => {
                handler(&ProceedingJoinPoint::new(&joinpoint, target, self, next))
            }
            Advice::AfterReturning(handler) => {
                let value = self.run(target, component, next, joinpoint.args.clone())?;
                handler(&joinpoint, value)
            }
            Advice::AfterRaising(handler) => {
                match self.run(target, component, next, joinpoint.args.clone()) {
                    Ok(value) => Ok(value),
                    Err(error) => handler(&joinpoint, error),
                }
            }
        }
    }
}

/// 织入切面后的代理
///
/// 未被任何切点选中的方法直接转发给目标。
pub struct AdvisedProxy {
    component: String,
    target: Arc<dyn Advisable>,
    chains: HashMap<String, MethodChain>,
}

impl AdvisedProxy {
    pub(crate) fn new(
        component: impl Into<String>,
        target: Arc<dyn Advisable>,
        chains: HashMap<String, MethodChain>,
    ) -> Self {
        Self {
            component: component.into(),
            target,
            chains,
        }
    }

    /// 被代理的组件名
    pub fn component(&self) -> &str {
        &self.component
    }

    /// 被代理的目标
    pub fn target(&self) -> &Arc<dyn Advisable> {
        &self.target
    }

    /// 方法上的 advice 链
    pub fn chain(&self, method: &str) -> Option<&MethodChain> {
        self.chains.get(method)
    }

    /// 是否有方法被拦截
    pub fn is_advised(&self, method: &str) -> bool {
        self.chains.contains_key(method)
    }
}

impl Advisable for AdvisedProxy {
    fn methods(&self) -> Vec<MethodInfo> {
        self.target.methods()
    }

    fn invoke(&self, method: &str, args: Vec<Value>) -> InvocationResult<Value> {
        match self.chains.get(method) {
            Some(chain) => chain.run(self.target.as_ref(), &self.component, 0, args),
            None => self.target.invoke(method, args),
        }
    }
}

impl fmt::Debug for AdvisedProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut advised: Vec<_> = self.chains.keys().collect();
        advised.sort();
        f.debug_struct("AdvisedProxy")
            .field("component", &self.component)
            .field("advised", &advised)
            .finish_non_exhaustive()
    }
}
