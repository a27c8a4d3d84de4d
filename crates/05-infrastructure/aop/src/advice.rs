//! Advice 类型

use crate::joinpoint::{JoinPoint, ProceedingJoinPoint};
use infrastructure_common::{InvocationError, InvocationResult};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub type BeforeFn = Arc<dyn Fn(&JoinPoint) -> InvocationResult<()> + Send + Sync>;
pub type AfterFn = Arc<dyn Fn(&JoinPoint) -> InvocationResult<()> + Send + Sync>;
pub type AroundFn = Arc<dyn Fn(&ProceedingJoinPoint<'_>) -> InvocationResult<Value> + Send + Sync>;
pub type AfterReturningFn = Arc<dyn Fn(&JoinPoint, Value) -> InvocationResult<Value> + Send + Sync>;
pub type AfterRaisingFn =
    Arc<dyn Fn(&JoinPoint, InvocationError) -> InvocationResult<Value> + Send + Sync>;

/// Advice 种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdviceKind {
    Before,
    After,
    Around,
    AfterReturning,
    AfterRaising,
}

/// Advice：种类加处理函数
#[derive(Clone)]
pub enum Advice {
    /// 调用前执行；返回错误则中止调用
    Before(BeforeFn),
    /// 调用后执行，无论成功或失败
    After(AfterFn),
    /// 包裹调用，自行决定是否、何时、几次执行剩余链
    Around(AroundFn),
    /// 仅在成功返回后执行，可替换返回值
    AfterReturning(AfterReturningFn),
    /// 仅在调用失败后执行，可吞掉、重抛或替换错误
    AfterRaising(AfterRaisingFn),
}

impl Advice {
    /// Advice 种类
    pub fn kind(&self) -> AdviceKind {
        match self {
            Self::Before(_) => AdviceKind::Before,
            Self::After(_) => AdviceKind::After,
            Self::Around(_) => AdviceKind::Around,
            Self::AfterReturning(_) => AdviceKind::AfterReturning,
            Self::AfterRaising(_) => AdviceKind::AfterRaising,
        }
    }
}

impl fmt::Debug for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Advice::{:?}", self.kind())
    }
}
