//! 作用域存储
//!
//! 单例与上下文实例按组件各占一个 `OnceCell` 槽位。槽位先从 map 中克隆出来再初始化，
//! 初始化期间不持有任何 map 分片锁，不相关的组件因此可以并发构造。

use dashmap::DashMap;
use di_abstractions::{ComponentId, ManagedInstance};
use infrastructure_common::{LogicalUnitId, Scope};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::debug;

/// 实例槽位
pub type Slot = Arc<OnceCell<ManagedInstance>>;

/// 作用域存储
#[derive(Debug, Default)]
pub struct ScopeStore {
    singletons: DashMap<ComponentId, Slot>,
    contexts: DashMap<LogicalUnitId, DashMap<ComponentId, Slot>>,
}

impl ScopeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取组件在作用域中的槽位，不存在时创建
    ///
    /// 原型作用域以及缺少逻辑单元的上下文作用域没有槽位。
    pub fn slot(&self, id: ComponentId, scope: Scope, unit: Option<LogicalUnitId>) -> Option<Slot> {
        match (scope, unit) {
            (Scope::Singleton, _) => Some(self.singletons.entry(id).or_default().clone()),
            (Scope::Context, Some(unit)) => Some(
                self.contexts
                    .entry(unit)
                    .or_default()
                    .entry(id)
                    .or_default()
                    .clone(),
            ),
            _ => None,
        }
    }

    /// 读取已存储的实例
    pub fn get(&self, id: ComponentId, scope: Scope, unit: Option<LogicalUnitId>) -> Option<ManagedInstance> {
        match (scope, unit) {
            (Scope::Singleton, _) => self.singletons.get(&id).and_then(|slot| slot.value().get().cloned()),
            (Scope::Context, Some(unit)) => self
                .contexts
                .get(&unit)
                .and_then(|slots| slots.get(&id).and_then(|slot| slot.value().get().cloned())),
            _ => None,
        }
    }

    /// 存储实例；槽位已有值时保留原值并返回它
    pub fn put(
        &self,
        id: ComponentId,
        scope: Scope,
        unit: Option<LogicalUnitId>,
        instance: ManagedInstance,
    ) -> ManagedInstance {
        match self.slot(id, scope, unit) {
            Some(slot) => slot.get_or_init(|| instance).clone(),
            None => instance,
        }
    }

    /// 丢弃逻辑单元的全部上下文实例，返回丢弃数量
    pub fn reset_logical_unit(&self, unit: LogicalUnitId) -> usize {
        let removed = self
            .contexts
            .remove(&unit)
            .map(|(_, slots)| slots.iter().filter(|slot| slot.value().get().is_some()).count())
            .unwrap_or(0);
        debug!("重置逻辑单元 {}: 丢弃 {} 个上下文实例", unit, removed);
        removed
    }

    /// 已构造的单例数量
    pub fn singleton_count(&self) -> usize {
        self.singletons.iter().filter(|slot| slot.value().get().is_some()).count()
    }

    /// 逻辑单元中已构造的上下文实例数量
    pub fn context_count(&self, unit: LogicalUnitId) -> usize {
        self.contexts
            .get(&unit)
            .map(|slots| slots.iter().filter(|slot| slot.value().get().is_some()).count())
            .unwrap_or(0)
    }

    /// 清空全部作用域
    pub fn clear(&self) {
        self.singletons.clear();
        self.contexts.clear();
    }
}
