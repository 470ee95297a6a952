//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 会话路由器与会话管理器的失败和调用路径的 [`DispatchError`](spark_core::DispatchError)
//!   属于不同的调用方：前者面向控制面操作（建会话、登记代理、销毁），后者面向被转发的业务调用；
//! - 配置加载失败单独归类，便于启动阶段直接报告文件路径。
//!
//! ## 设计要求（What）
//! - 所有错误派生 `thiserror::Error`，变体携带可读上下文（身份、用户、文件路径）。

use std::io;
use std::path::PathBuf;

use spark_core::{Destroyed, Identity};
use thiserror::Error;

/// 会话路由器的错误域。
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// 未配置会话管理器时请求创建会话。
    #[error("no session manager configured")]
    NoSessionManager,
    /// 路由器已销毁。
    #[error("{component} has been destroyed")]
    Destroyed { component: &'static str },
    /// 会话管理器或会话自身报告的失败。
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<Destroyed> for GatewayError {
    fn from(value: Destroyed) -> Self {
        GatewayError::Destroyed {
            component: value.component,
        }
    }
}

impl GatewayError {
    pub fn is_destroyed(&self) -> bool {
        matches!(self, GatewayError::Destroyed { .. })
    }
}

/// 会话管理契约的错误域。
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// 会话管理器拒绝为该用户创建会话。
    #[error("failed to create session for user `{user_id}`: {reason}")]
    CreateFailed { user_id: String, reason: String },
    /// 会话销毁失败。
    #[error("failed to destroy session `{identity}`: {reason}")]
    DestroyFailed { identity: Identity, reason: String },
}

/// 配置加载错误。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid gateway configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
