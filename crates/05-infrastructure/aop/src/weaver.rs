//! 切面织入器

use crate::aspect::AspectDefinition;
use crate::proxy::{AdvisedProxy, Advisable, MethodChain};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 切面织入器
///
/// 持有已排序的切面，为每个组件构建按方法划分的 advice 链。
#[derive(Debug, Default)]
pub struct AspectWeaver {
    aspects: Vec<AspectDefinition>,
}

impl AspectWeaver {
    /// 以已排序的切面创建织入器
    pub(crate) fn new(aspects: Vec<AspectDefinition>) -> Self {
        Self { aspects }
    }

    /// 按 order 排好的切面
    pub fn aspects(&self) -> &[AspectDefinition] {
        &self.aspects
    }

    /// 是否没有任何切面
    pub fn is_empty(&self) -> bool {
        self.aspects.is_empty()
    }

    /// 为目标织入切面
    ///
    /// 没有任何方法被选中时返回 `None`，调用方应继续使用原实例。
    pub fn weave(&self, component: &str, target: Arc<dyn Advisable>) -> Option<Arc<AdvisedProxy>> {
        if self.aspects.is_empty() {
            return None;
        }

        let mut chains = HashMap::new();
        for method in target.methods() {
            let links: Vec<_> = self
                .aspects
                .iter()
                .flat_map(|aspect| aspect.pointcuts())
                .filter(|pointcut| pointcut.matches(&method))
                .map(|pointcut| pointcut.advice().clone())
                .collect();
            if !links.is_empty() {
                debug!("织入方法: {}.{} ({} 个 advice)", component, method.name, links.len());
                chains.insert(method.name.clone(), MethodChain::new(method, links));
            }
        }

        if chains.is_empty() {
            return None;
        }
        Some(Arc::new(AdvisedProxy::new(component, target, chains)))
    }
}
