//! 受管组件实例
//!
//! 作用域存储、切面织入与后置处理之间传递的都是 [`ManagedInstance`]：
//! 原始目标对象、定义声明的契约表，以及按契约安装的替换实现
//! （织入后的代理、后置处理器包装的对象）。

use crate::definition::{AnyInstance, ContractBinding};
use infrastructure_common::TypeInfo;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 受管组件实例
#[derive(Clone)]
pub struct ManagedInstance {
    name: String,
    type_info: TypeInfo,
    target: AnyInstance,
    contracts: Arc<Vec<ContractBinding>>,
    overrides: HashMap<TypeId, AnyInstance>,
}

impl ManagedInstance {
    /// 创建受管实例
    pub fn new(
        name: impl Into<String>,
        type_info: TypeInfo,
        target: AnyInstance,
        contracts: Arc<Vec<ContractBinding>>,
    ) -> Self {
        Self {
            name: name.into(),
            type_info,
            target,
            contracts,
            overrides: HashMap::new(),
        }
    }

    /// 组件名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 具体类型
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    /// 以契约 `I` 查看实例；已安装替换实现时返回替换实现
    pub fn view<I: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<I>> {
        let contract = TypeId::of::<I>();
        if let Some(replacement) = self.overrides.get(&contract) {
            return replacement.downcast_ref::<Arc<I>>().cloned();
        }
        self.contracts
            .iter()
            .find(|binding| binding.contract.id == contract)
            .and_then(|binding| binding.view::<I>(&self.target))
    }

    /// 绕过替换实现，直接以契约 `I` 查看原始目标
    pub fn target_view<I: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<I>> {
        let contract = TypeId::of::<I>();
        self.contracts
            .iter()
            .find(|binding| binding.contract.id == contract)
            .and_then(|binding| binding.view::<I>(&self.target))
    }

    /// 是否暴露契约 `I`
    pub fn exposes<I: ?Sized + 'static>(&self) -> bool {
        let contract = TypeId::of::<I>();
        self.overrides.contains_key(&contract)
            || self.contracts.iter().any(|binding| binding.contract.id == contract)
    }

    /// 为契约 `I` 安装替换实现
    pub fn with_override<I: ?Sized + Send + Sync + 'static>(mut self, replacement: Arc<I>) -> Self {
        self.overrides
            .insert(TypeId::of::<I>(), Arc::new(replacement) as AnyInstance);
        self
    }

    /// 契约 `I` 是否已被替换
    pub fn is_overridden<I: ?Sized + 'static>(&self) -> bool {
        self.overrides.contains_key(&TypeId::of::<I>())
    }

    /// 两个受管实例是否指向同一目标对象
    pub fn same_target(&self, other: &ManagedInstance) -> bool {
        Arc::ptr_eq(&self.target, &other.target)
    }
}

impl fmt::Debug for ManagedInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedInstance")
            .field("name", &self.name)
            .field("type", &self.type_info.path)
            .field("overrides", &self.overrides.len())
            .finish()
    }
}
