//! 容器配置

use serde::{Deserialize, Serialize};

/// 容器配置
///
/// 可从任意 serde 数据源构建，缺省字段取默认值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 解析链最大深度
    pub max_resolution_depth: usize,
    /// 启动时是否预先实例化非延迟单例
    pub eager_singletons: bool,
    /// 启动时是否注册内置后置处理器
    pub register_builtin_processors: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_resolution_depth: 100,
            eager_singletons: true,
            register_builtin_processors: true,
        }
    }
}

impl ContainerConfig {
    /// 从 JSON 值构建
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// 设置解析链最大深度
    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }

    /// 设置是否预先实例化单例
    pub fn with_eager_singletons(mut self, eager: bool) -> Self {
        self.eager_singletons = eager;
        self
    }

    /// 不注册内置后置处理器
    pub fn without_builtin_processors(mut self) -> Self {
        self.register_builtin_processors = false;
        self
    }
}
