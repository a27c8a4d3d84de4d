//! 能力接口
//!
//! 组件通过在定义中声明这些契约来参与容器的扩展点。
//! 容器按定义的契约表判断能力，不依赖运行时反射。

use crate::definition::ComponentDefinition;
use crate::instance::ManagedInstance;
use crate::resolver::ComponentContainer;
use infrastructure_common::{BoxError, DependencyResult};
use std::sync::Weak;

/// 后置处理器
///
/// 每个新创建的组件在切面织入之后、交给调用方之前，依次经过全部后置处理器。
pub trait PostProcessor: Send + Sync + 'static {
    /// 处理器名称，用于日志与错误信息
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// 顺序值，越小越先执行
    fn order(&self) -> i32 {
        0
    }

    /// 处理实例；可原样返回、修改后返回或安装包装实现
    fn process(
        &self,
        definition: &ComponentDefinition,
        instance: ManagedInstance,
    ) -> DependencyResult<ManagedInstance>;
}

/// 需要容器句柄的组件
pub trait ContainerAware: Send + Sync + 'static {
    /// 注入容器的弱引用句柄，组件不得借此延长容器生命周期
    fn set_container(&self, container: Weak<dyn ComponentContainer>);
}

/// 需要日志 span 的组件
pub trait LoggerAware: Send + Sync + 'static {
    /// 注入以组件名命名的 span
    fn set_logger(&self, span: tracing::Span);
}

/// 由容器管理启停的服务
///
/// 容器在 `start()` 末尾按 order 启动服务，在 `stop()` 时逆序停止。
pub trait Service: Send + Sync + 'static {
    /// 启动服务；失败会使容器启动失败
    fn start(&self) -> Result<(), BoxError>;

    /// 停止服务
    fn stop(&self) -> Result<(), BoxError>;
}
