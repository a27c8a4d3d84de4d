//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义组件注册和依赖解析的核心数据结构与接口。
//!
//! ## 核心接口
//!
//! - [`ComponentDefinition`] - 组件定义与构建器
//! - [`ComponentRegistry`] - 组件注册表
//! - [`ManagedInstance`] - 受管组件实例
//! - [`ResolveContext`] - 解析上下文（循环依赖检测）
//! - [`ComponentContainer`] / [`ContainerExt`] - 对外解析入口
//! - [`PostProcessor`] 等能力接口
//! - [`ComponentScanner`] - 组件扫描器

pub mod capability;
pub mod definition;
pub mod instance;
pub mod registry;
pub mod resolver;
pub mod scanner;

pub use capability::*;
pub use definition::*;
pub use instance::*;
pub use registry::*;
pub use resolver::*;
pub use scanner::*;
