//! 组件注册表
//!
//! 纯数据结构：保存 [`ComponentDefinition`] 并按契约索引。
//! 容器启动后注册表被冻结为 `Arc<ComponentRegistry>`，之后只读、无需加锁。

use crate::definition::ComponentDefinition;
use infrastructure_common::{DependencyError, DependencyResult, TypeInfo};
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// 组件标识（注册顺序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(usize);

impl ComponentId {
    /// 注册序号
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 组件注册表
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    definitions: Vec<Arc<ComponentDefinition>>,
    by_contract: HashMap<TypeId, Vec<ComponentId>>,
    keys: HashSet<(TypeId, String)>,
}

impl ComponentRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册组件定义；(具体类型, 名称) 必须唯一
    pub fn register(&mut self, definition: ComponentDefinition) -> DependencyResult<ComponentId> {
        let key = (definition.type_info.id, definition.name.clone());
        if self.keys.contains(&key) {
            return Err(DependencyError::DuplicateRegistration {
                type_name: definition.type_info.short_name(),
                name: definition.name,
            });
        }

        let id = ComponentId(self.definitions.len());
        for binding in definition.contracts() {
            self.by_contract.entry(binding.contract.id).or_default().push(id);
        }
        self.keys.insert(key);
        self.definitions.push(Arc::new(definition));
        Ok(id)
    }

    /// 按标识获取定义
    pub fn get(&self, id: ComponentId) -> Option<&Arc<ComponentDefinition>> {
        self.definitions.get(id.0)
    }

    /// 满足指定契约的全部候选，按注册顺序
    pub fn candidates(&self, contract: &TypeInfo) -> Vec<(ComponentId, &Arc<ComponentDefinition>)> {
        self.by_contract
            .get(&contract.id)
            .map(|ids| ids.iter().map(|id| (*id, &self.definitions[id.0])).collect())
            .unwrap_or_default()
    }

    /// 满足指定契约的全部候选，按 (order, 注册顺序) 排序
    pub fn ordered_candidates(&self, contract: &TypeInfo) -> Vec<(ComponentId, &Arc<ComponentDefinition>)> {
        let mut candidates = self.candidates(contract);
        candidates.sort_by_key(|(id, definition)| (definition.order, *id));
        candidates
    }

    /// 是否存在满足契约（及名称）的定义
    pub fn contains(&self, contract: &TypeInfo, name: Option<&str>) -> bool {
        self.candidates(contract)
            .iter()
            .any(|(_, definition)| name.map_or(true, |name| definition.name == name))
    }

    /// 遍历全部定义
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, &Arc<ComponentDefinition>)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(index, definition)| (ComponentId(index), definition))
    }

    /// 已注册数量
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
