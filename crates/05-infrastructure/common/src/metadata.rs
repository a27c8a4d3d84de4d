//! 元数据定义
//!
//! 提供组件和契约类型的元数据信息

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 类型信息
///
/// 同时用于具体组件类型与 trait object 契约（如 `dyn Repository`）
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    /// 类型ID
    pub id: TypeId,
    /// 完整类型路径
    pub path: &'static str,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: std::any::type_name::<T>(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径与泛型参数）
    pub fn short_name(&self) -> String {
        let (prefix, rest) = match self.path.strip_prefix("dyn ") {
            Some(rest) => ("dyn ", rest),
            None => ("", self.path),
        };
        let base = rest.split('<').next().unwrap_or(rest);
        let last = base.rsplit("::").next().unwrap_or(base);
        format!("{prefix}{last}")
    }

    /// 模块路径（类型路径去掉最后一段）
    pub fn module_path(&self) -> &'static str {
        let base = self.path.trim_start_matches("dyn ");
        let base = base.split('<').next().unwrap_or(base);
        match base.rfind("::") {
            Some(index) => &base[..index],
            None => "",
        }
    }

    /// 约定的组件名称：短类型名的 snake_case 形式
    pub fn canonical_name(&self) -> String {
        to_snake_case(self.short_name().trim_start_matches("dyn "))
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// `SamplePod` -> `sample_pod`, `HTTPClient` -> `http_client`
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if i > 0 && (prev_lower || (prev_upper && next_lower)) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
