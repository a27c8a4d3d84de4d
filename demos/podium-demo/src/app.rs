//! 演示应用的组件
//!
//! 订单仓储、带事务方法的订单服务、请求级追踪、审计服务与计时切面。

use aop::{
    any_method, AspectDefinition, AspectProvider, Advisable, MethodInfo, Transaction,
    TransactionalAspect, TRANSACTIONAL,
};
use di_abstractions::{CatalogScanner, ComponentDefinition, LoggerAware, Service};
use di_impl::DefinitionBuilderExt;
use infrastructure_common::{BoxError, InvocationError, InvocationResult};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{debug, info, warn, Span};

/// 扫描位置
pub const LOCATION: &str = module_path!();

/// 订单仓储
pub trait OrderRepository: Send + Sync {
    fn save(&self, item: &str, quantity: u64) -> u64;

    fn count(&self) -> usize;

    fn total_quantity(&self) -> u64;
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<Vec<(String, u64)>>,
    next_id: AtomicU64,
}

impl OrderRepository for InMemoryOrderRepository {
    fn save(&self, item: &str, quantity: u64) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.orders.lock().push((item.to_string(), quantity));
        id
    }

    fn count(&self) -> usize {
        self.orders.lock().len()
    }

    fn total_quantity(&self) -> u64 {
        self.orders.lock().iter().map(|(_, quantity)| quantity).sum()
    }
}

/// 只写日志的事务
pub struct LoggingTransaction;

impl Transaction for LoggingTransaction {
    fn begin(&self) -> InvocationResult<()> {
        debug!("事务开始");
        Ok(())
    }

    fn commit(&self) -> InvocationResult<()> {
        debug!("事务提交");
        Ok(())
    }

    fn rollback(&self) -> InvocationResult<()> {
        warn!("事务回滚");
        Ok(())
    }
}

/// 事务切面组件
pub struct TransactionSupport {
    aspect: Arc<TransactionalAspect>,
}

impl AspectProvider for TransactionSupport {
    fn aspect(self: Arc<Self>) -> AspectDefinition {
        self.aspect.clone().aspect()
    }
}

/// 订单服务
pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
}

impl OrderService {
    fn place(&self, args: &[Value]) -> InvocationResult<Value> {
        let (Some(item), Some(quantity)) = (
            args.first().and_then(Value::as_str),
            args.get(1).and_then(Value::as_u64),
        ) else {
            return Err(InvocationError::invalid_arguments("place", "需要 (item, quantity)"));
        };
        if quantity == 0 {
            return Err(InvocationError::raised("ValidationError", format!("{item} 的数量不能为 0")));
        }
        let id = self.repository.save(item, quantity);
        Ok(json!({ "order_id": id, "item": item, "quantity": quantity }))
    }
}

impl Advisable for OrderService {
    fn methods(&self) -> Vec<MethodInfo> {
        vec![
            MethodInfo::new("place").with_annotation(TRANSACTIONAL),
            MethodInfo::new("count"),
        ]
    }

    fn invoke(&self, method: &str, args: Vec<Value>) -> InvocationResult<Value> {
        match method {
            "place" => self.place(&args),
            "count" => Ok(json!({
                "orders": self.repository.count(),
                "quantity": self.repository.total_quantity(),
            })),
            other => Err(InvocationError::NoSuchMethod {
                component: "order_service".into(),
                method: other.into(),
            }),
        }
    }
}

/// 请求级追踪，每个逻辑单元一份
pub struct RequestTrace {
    pub id: uuid::Uuid,
    started: Instant,
}

impl RequestTrace {
    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }
}

/// 审计服务，随容器启停
#[derive(Default)]
pub struct AuditService {
    span: OnceLock<Span>,
}

impl LoggerAware for AuditService {
    fn set_logger(&self, span: Span) {
        let _ = self.span.set(span);
    }
}

impl Service for AuditService {
    fn start(&self) -> Result<(), BoxError> {
        let _entered = self.span.get().map(Span::enter);
        info!("审计服务已启动");
        Ok(())
    }

    fn stop(&self) -> Result<(), BoxError> {
        let _entered = self.span.get().map(Span::enter);
        info!("审计服务已停止");
        Ok(())
    }
}

/// 记录每次调用耗时的切面，包在事务外层
pub fn timing_aspect() -> AspectDefinition {
    AspectDefinition::new("timing")
        .with_order(-10)
        .around(any_method(), |pjp| {
            let started = Instant::now();
            let result = pjp.proceed();
            debug!(
                "{}.{} 耗时 {:?} (成功 = {})",
                pjp.joinpoint().component,
                pjp.method().name,
                started.elapsed(),
                result.is_ok()
            );
            result
        })
}

/// 本模块的组件目录
pub fn catalog() -> CatalogScanner {
    CatalogScanner::new().add_module(|| {
        vec![
            ComponentDefinition::builder(|_| Ok(InMemoryOrderRepository::default()))
                .provides::<dyn OrderRepository, _>(|repository| repository)
                .build(),
            ComponentDefinition::builder(|_| Ok(LoggingTransaction))
                .provides::<dyn Transaction, _>(|transaction| transaction)
                .build(),
            ComponentDefinition::builder(|deps| {
                Ok(TransactionSupport {
                    aspect: Arc::new(TransactionalAspect::new(deps.required::<dyn Transaction>()?)),
                })
            })
            .with_param::<dyn Transaction>()
            .as_aspect()
            .build(),
            ComponentDefinition::builder(|deps| {
                Ok(OrderService {
                    repository: deps.required::<dyn OrderRepository>()?,
                })
            })
            .with_param::<dyn OrderRepository>()
            .advisable()
            .build(),
            ComponentDefinition::builder(|_| {
                Ok(RequestTrace {
                    id: uuid::Uuid::new_v4(),
                    started: Instant::now(),
                })
            })
            .context_scoped()
            .build(),
            ComponentDefinition::builder(|_| Ok(AuditService::default()))
                .logger_aware()
                .as_service()
                .build(),
        ]
    })
}
