//! 组件作用域与容器生命周期

use serde::{Deserialize, Serialize};
use std::fmt;

/// 组件作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// 单例模式 - 整个容器生命周期内只创建一个实例
    #[default]
    Singleton,
    /// 原型模式 - 每次解析都创建新实例，从不缓存
    Prototype,
    /// 上下文模式 - 每个逻辑单元内共享一个实例
    Context,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Singleton => "singleton",
            Self::Prototype => "prototype",
            Self::Context => "context",
        };
        f.write_str(name)
    }
}

/// 逻辑单元标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogicalUnitId(uuid::Uuid);

impl LogicalUnitId {
    /// 分配新的标识
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// 底层 UUID
    pub fn as_uuid(&self) -> uuid::Uuid {
        self.0
    }
}

impl Default for LogicalUnitId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<uuid::Uuid> for LogicalUnitId {
    fn from(id: uuid::Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for LogicalUnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 逻辑工作单元（一次请求、一条命令或一条消息）
///
/// 由边界层在每个工作单元开始时创建，并在结束时通过
/// `reset_logical_unit` 释放其上下文作用域实例。
#[derive(Debug, Clone)]
pub struct LogicalUnit {
    pub id: LogicalUnitId,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl LogicalUnit {
    /// 创建新的逻辑单元
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: LogicalUnitId::new(),
            name: name.into(),
            created_at: chrono::Utc::now(),
        }
    }

    /// 创建子单元，名称以父单元为前缀
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self::new(format!("{}.{}", self.name, name.into()))
    }
}

/// 容器生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerState {
    /// 构建中，接受注册
    #[default]
    Building,
    /// 启动中，正在预先实例化单例
    Starting,
    /// 运行中
    Started,
    /// 已停止
    Stopped,
}

impl ContainerState {
    /// 是否仍接受注册
    pub fn accepts_registration(&self) -> bool {
        matches!(self, Self::Building)
    }
}
