//! # Identity：路由键与访问控制单元
//!
//! 身份由 `category` 与 `name` 两段组成，文本形式为 `category/name`；
//! 当 `category` 为空时仅输出 `name`。访问控制只看 `category`，路由表以整个身份为键。

use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

/// 稳定的 `(category, name)` 二元组，指向一个调度目标。
///
/// # 教案式说明
/// - **契约 (What)**：值语义，克隆只复制两个 `Arc<str>`；`Eq`/`Ord`/`Hash` 均按
///   `(category, name)` 逐字段比较，可直接用作 `HashMap`/`BTreeMap` 键；
/// - **文本形式 (How)**：[`Identity::parse`] 在第一个 `/` 处切分；不含 `/` 时整个字符串为 `name`。
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    category: Arc<str>,
    name: Arc<str>,
}

impl Identity {
    pub fn new(category: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }

    /// 仅有名称、类别为空的身份。
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self::new("", name)
    }

    /// 解析 `category/name` 或 `name` 形式的文本。
    ///
    /// - **错误**：名称段为空时返回 [`IdentityParseError`]。
    pub fn parse(text: &str) -> Result<Self, IdentityParseError> {
        let (category, name) = match text.split_once('/') {
            Some((category, name)) => (category, name),
            None => ("", text),
        };
        if name.is_empty() {
            return Err(IdentityParseError {
                text: text.to_owned(),
            });
        }
        Ok(Self::new(category, name))
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.category.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}/{}", self.category, self.name)
        }
    }
}

impl FromStr for Identity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// 身份文本缺少名称段。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("identity `{text}` has an empty name")]
pub struct IdentityParseError {
    text: String,
}
