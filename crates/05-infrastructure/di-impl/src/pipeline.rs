//! 后置处理管道

use di_abstractions::{ComponentDefinition, ManagedInstance, PostProcessor};
use infrastructure_common::DependencyResult;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 后置处理管道
///
/// 处理器按 order 升序执行（相同 order 保持加入顺序），前一个的输出作为后一个的输入。
#[derive(Default)]
pub struct PostProcessorPipeline {
    processors: Vec<Arc<dyn PostProcessor>>,
}

impl PostProcessorPipeline {
    pub fn new(mut processors: Vec<Arc<dyn PostProcessor>>) -> Self {
        processors.sort_by_key(|processor| processor.order());
        Self { processors }
    }

    /// 处理器数量
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// 是否没有处理器
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// 处理器名称，按执行顺序
    pub fn names(&self) -> Vec<String> {
        self.processors
            .iter()
            .map(|processor| processor.name().to_string())
            .collect()
    }

    /// 依次应用全部处理器
    pub fn apply_all(
        &self,
        definition: &ComponentDefinition,
        instance: ManagedInstance,
    ) -> DependencyResult<ManagedInstance> {
        self.processors
            .iter()
            .try_fold(instance, |instance, processor| {
                debug!("后置处理: {} -> {}", processor.name(), definition.name);
                processor.process(definition, instance)
            })
    }
}

impl fmt::Debug for PostProcessorPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostProcessorPipeline")
            .field("processors", &self.names())
            .finish()
    }
}
