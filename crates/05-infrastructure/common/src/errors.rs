//! 错误类型定义

use thiserror::Error;

/// 组件工厂、服务生命周期等处使用的通用错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("组件未找到: {type_name}{}", .name.as_ref().map(|n| format!(" (名称: {n})")).unwrap_or_default())]
    NotFound {
        type_name: String,
        name: Option<String>,
    },

    #[error("存在多个候选组件: {type_name} [{}], 请使用 primary 或指定名称", .candidates.join(", "))]
    AmbiguousCandidate {
        type_name: String,
        candidates: Vec<String>,
    },

    #[error("循环依赖检测到: {}", .path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    #[error("容器尚未启动")]
    ContainerNotStarted,

    #[error("容器已停止")]
    ContainerStopped,

    #[error("组件重复注册: {type_name} (名称: {name})")]
    DuplicateRegistration { type_name: String, name: String },

    #[error("容器已启动，不再接受注册: {what}")]
    RegistrationClosed { what: String },

    #[error("上下文作用域组件需要逻辑单元: {type_name}")]
    LogicalUnitRequired { type_name: String },

    #[error("作用域不匹配: {consumer} 期望 {expected}, 实际 {actual}")]
    ScopeMismatch {
        consumer: String,
        expected: String,
        actual: String,
    },

    #[error("解析深度超过上限 {max_depth}: {}", .path.join(" -> "))]
    ResolutionDepthExceeded { max_depth: usize, path: Vec<String> },

    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed {
        type_name: String,
        #[source]
        source: BoxError,
    },

    #[error("构造参数不匹配: {component}, 原因: {message}")]
    ParameterMismatch { component: String, message: String },

    #[error("组件类型转换失败: {component} 无法作为 {requested} 使用")]
    TypeMismatch { component: String, requested: String },

    #[error("后置处理失败: {processor} 处理 {component} 时出错: {message}")]
    PostProcessingFailed {
        processor: String,
        component: String,
        message: String,
    },

    #[error("服务生命周期失败: {component}, 原因: {source}")]
    ServiceLifecycleFailed {
        component: String,
        #[source]
        source: BoxError,
    },
}

impl DependencyError {
    /// 创建组件未找到错误
    pub fn not_found(type_name: impl Into<String>, name: Option<&str>) -> Self {
        Self::NotFound {
            type_name: type_name.into(),
            name: name.map(str::to_string),
        }
    }

    /// 创建组件创建失败错误
    pub fn creation_failed(type_name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ComponentCreationFailed {
            type_name: type_name.into(),
            source: source.into(),
        }
    }

    /// 循环依赖路径（仅 `CircularDependency` 有值）
    pub fn cycle_path(&self) -> Option<&[String]> {
        match self {
            Self::CircularDependency { path } => Some(path),
            _ => None,
        }
    }
}

/// 被织入方法调用时产生的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    #[error("方法不存在: {component}.{method}")]
    NoSuchMethod { component: String, method: String },

    #[error("参数无效: {method}, 原因: {message}")]
    InvalidArguments { method: String, message: String },

    #[error("{kind}: {message}")]
    Raised { kind: String, message: String },
}

impl InvocationError {
    /// 创建业务异常
    pub fn raised(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Raised {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// 创建参数无效错误
    pub fn invalid_arguments(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            method: method.into(),
            message: message.into(),
        }
    }

    /// 异常类别
    pub fn kind(&self) -> &str {
        match self {
            Self::NoSuchMethod { .. } => "NoSuchMethod",
            Self::InvalidArguments { .. } => "InvalidArguments",
            Self::Raised { kind, .. } => kind,
        }
    }
}

/// 结果类型别名
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InvocationResult<T> = Result<T, InvocationError>;
