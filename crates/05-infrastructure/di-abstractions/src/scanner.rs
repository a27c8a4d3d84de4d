//! 组件扫描器抽象接口
//!
//! Rust 没有运行时反射，扫描的对象是各模块预先登记的组件定义目录，
//! 按模块路径前缀筛选。

use crate::definition::ComponentDefinition;
use infrastructure_common::DependencyResult;

/// 组件扫描器 trait
pub trait ComponentScanner: Send + Sync {
    /// 获取扫描器名称
    fn name(&self) -> &str;

    /// 扫描指定位置（模块路径）中的组件
    fn scan(&self, location: &str) -> DependencyResult<Vec<ComponentDefinition>>;

    /// 检查是否支持指定的扫描位置
    fn supports(&self, location: &str) -> bool {
        !location.is_empty()
    }
}

/// 组件目录扫描器
///
/// 模块通过 [`CatalogScanner::add`] / [`CatalogScanner::add_module`] 登记组件，
/// 扫描时返回类型路径位于给定模块之下的定义。
#[derive(Debug, Default, Clone)]
pub struct CatalogScanner {
    entries: Vec<ComponentDefinition>,
}

impl CatalogScanner {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记单个定义
    pub fn add(mut self, definition: ComponentDefinition) -> Self {
        self.entries.push(definition);
        self
    }

    /// 登记一个模块导出的全部定义
    pub fn add_module<F>(mut self, module: F) -> Self
    where
        F: FnOnce() -> Vec<ComponentDefinition>,
    {
        self.entries.extend(module());
        self
    }

    /// 目录中的定义数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 目录是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ComponentScanner for CatalogScanner {
    fn name(&self) -> &str {
        "catalog"
    }

    fn scan(&self, location: &str) -> DependencyResult<Vec<ComponentDefinition>> {
        let location = location.trim_end_matches("::");
        Ok(self
            .entries
            .iter()
            .filter(|definition| {
                let module = definition.type_info.module_path();
                module == location
                    || module
                        .strip_prefix(location)
                        .is_some_and(|rest| rest.starts_with("::"))
            })
            .cloned()
            .collect())
    }
}
