//! # error 模块说明
//!
//! 传输层错误只描述“通道能否建立/使用”，不涉及任何上层调用语义；
//! 调用方（代理调用链、连接池）原样向上传播，不在本层做重试。

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::EndpointType;

/// 连接器与通道的统一错误域。
///
/// # 教案式说明
/// - **契约 (What)**：每个变体都携带协议族与目标地址文本，便于在日志中直接定位端点；
///   底层 `io::Error` 通过 `#[source]` 保留完整错误链。
/// - **执行 (How)**：`target` 使用连接器的 `Display` 结果，与池化诊断输出保持一致。
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// 建连被对端拒绝或网络不可达。
    #[error("failed to establish {endpoint} connection to {target}: {source}")]
    ConnectFailed {
        endpoint: EndpointType,
        target: String,
        #[source]
        source: io::Error,
    },

    /// 在连接器配置的超时内未完成建连。
    #[error("{endpoint} connection to {target} timed out after {timeout:?}")]
    Timeout {
        endpoint: EndpointType,
        target: String,
        timeout: Duration,
    },

    /// 调用方在建连完成前取消。
    #[error("{endpoint} connection to {target} was cancelled")]
    Cancelled { endpoint: EndpointType, target: String },

    /// 已建立的通道在读写或关闭时失败。
    #[error("{endpoint} channel to {target} failed during `{operation}`: {source}")]
    Io {
        endpoint: EndpointType,
        target: String,
        operation: &'static str,
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// 出错端点的地址文本。
    pub fn target(&self) -> &str {
        match self {
            TransportError::ConnectFailed { target, .. }
            | TransportError::Timeout { target, .. }
            | TransportError::Cancelled { target, .. }
            | TransportError::Io { target, .. } => target,
        }
    }

    /// 出错端点的协议族。
    pub fn endpoint(&self) -> EndpointType {
        match self {
            TransportError::ConnectFailed { endpoint, .. }
            | TransportError::Timeout { endpoint, .. }
            | TransportError::Cancelled { endpoint, .. }
            | TransportError::Io { endpoint, .. } => *endpoint,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }
}
