//! # Infrastructure Common
//!
//! 这个 crate 提供了 Podium 容器各层共享的基础类型。
//!
//! ## 核心内容
//!
//! - [`DependencyError`] / [`InvocationError`] - 错误类型
//! - [`TypeInfo`] - 组件与契约的类型信息
//! - [`Scope`] - 组件作用域
//! - [`LogicalUnit`] - 上下文作用域的逻辑工作单元
//! - [`ContainerState`] - 容器生命周期状态

pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
