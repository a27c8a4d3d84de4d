//! # 依赖注入具体实现
//!
//! 提供作用域存储、依赖解析器、后置处理管道、内置处理器以及应用容器。
//!
//! ```ignore
//! let container = ApplicationContainer::new();
//! container.register(ComponentDefinition::builder(|_| Ok(Clock)).build())?;
//! container.start()?;
//! let clock = container.resolve::<Clock>()?;
//! ```

pub mod config;
pub mod container;
pub mod pipeline;
pub mod processors;
pub mod resolver;
pub mod scope_store;

pub use config::ContainerConfig;
pub use container::ApplicationContainer;
pub use pipeline::PostProcessorPipeline;
pub use processors::{AwarePostProcessor, ServicePostProcessor};
pub use resolver::{select_candidate, Resolver};
pub use scope_store::ScopeStore;

use aop::{Advisable, AspectProvider};
use di_abstractions::DefinitionBuilder;

/// 组件定义构建器的 AOP 扩展
pub trait DefinitionBuilderExt<T> {
    /// 声明组件可被切面拦截
    fn advisable(self) -> Self
    where
        T: Advisable;

    /// 声明组件提供切面
    fn as_aspect(self) -> Self
    where
        T: AspectProvider;
}

impl<T: Send + Sync + 'static> DefinitionBuilderExt<T> for DefinitionBuilder<T> {
    fn advisable(self) -> Self
    where
        T: Advisable,
    {
        self.provides::<dyn Advisable, _>(|target| target)
    }

    fn as_aspect(self) -> Self
    where
        T: AspectProvider,
    {
        self.provides::<dyn AspectProvider, _>(|aspect| aspect)
    }
}
