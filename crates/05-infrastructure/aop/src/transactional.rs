//! 事务切面
//!
//! 为标注了 [`TRANSACTIONAL`] 的方法包裹事务：调用前开启，成功后提交，失败时回滚并重新抛出错误。

use crate::aspect::{AspectDefinition, AspectProvider};
use crate::pointcut::annotated_with;
use infrastructure_common::InvocationResult;
use std::sync::Arc;
use tracing::{debug, warn};

/// 事务标注
pub const TRANSACTIONAL: &str = "transactional";

/// 事务
pub trait Transaction: Send + Sync {
    fn begin(&self) -> InvocationResult<()>;
    fn commit(&self) -> InvocationResult<()>;
    fn rollback(&self) -> InvocationResult<()>;
}

/// 事务切面
pub struct TransactionalAspect {
    transaction: Arc<dyn Transaction>,
    order: i32,
}

impl TransactionalAspect {
    pub fn new(transaction: Arc<dyn Transaction>) -> Self {
        Self {
            transaction,
            order: 0,
        }
    }

    /// 设置切面顺序
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

impl AspectProvider for TransactionalAspect {
    fn aspect(self: Arc<Self>) -> AspectDefinition {
        let transaction = self.transaction.clone();
        AspectDefinition::new(TRANSACTIONAL)
            .with_order(self.order)
            .around(annotated_with(TRANSACTIONAL), move |pjp| {
                transaction.begin()?;
                match pjp.proceed() {
                    Ok(value) => {
                        transaction.commit()?;
                        debug!("事务已提交: {}.{}", pjp.joinpoint().component, pjp.method().name);
                        Ok(value)
                    }
                    Err(error) => {
                        warn!(
                            "事务回滚: {}.{}, 原因: {}",
                            pjp.joinpoint().component,
                            pjp.method().name,
                            error
                        );
                        transaction.rollback()?;
                        Err(error)
                    }
                }
            })
    }
}
