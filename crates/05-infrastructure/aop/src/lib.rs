//! # AOP
//!
//! 切面注册与织入。组件实现 [`Advisable`] 暴露方法表与统一调用入口，
//! [`AspectWeaver`] 按切面顺序为被选中的方法构建 advice 链并生成 [`AdvisedProxy`]。

pub mod advice;
pub mod aspect;
pub mod joinpoint;
pub mod pointcut;
pub mod proxy;
pub mod transactional;
pub mod weaver;

pub use advice::*;
pub use aspect::*;
pub use joinpoint::*;
pub use pointcut::*;
pub use proxy::*;
pub use transactional::*;
pub use weaver::*;
