//! `tracing` 订阅器安装入口。
//!
//! 组件只通过 `tracing` 宏输出记录，进程启动时调用一次 [`install_tracing`] 选择输出格式与过滤规则。

use std::sync::OnceLock;

use thiserror::Error;
use tracing::dispatcher;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

static INSTALLED: OnceLock<()> = OnceLock::new();

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("tracing subscriber already installed by spark-gateway")]
    AlreadyInstalled,
    #[error("another global tracing subscriber is already set")]
    SubscriberAlreadySet,
    #[error("invalid tracing filter: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// 安装 `fmt + EnvFilter` 全局订阅器。
///
/// # 教案式说明
/// - **契约（What）**：`filter` 采用 `EnvFilter` 指令语法，例如
///   `"spark::gateway=debug,spark::transport::tcp=debug"`；
///   重复调用返回 [`ObservabilityError::AlreadyInstalled`]，外部已设置订阅器时返回
///   [`ObservabilityError::SubscriberAlreadySet`]。
pub fn install_tracing(filter: &str) -> Result<(), ObservabilityError> {
    if INSTALLED.get().is_some() {
        return Err(ObservabilityError::AlreadyInstalled);
    }
    if dispatcher::has_been_set() {
        return Err(ObservabilityError::SubscriberAlreadySet);
    }

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::try_new(filter)?)
        .with(fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;

    INSTALLED
        .set(())
        .map_err(|_| ObservabilityError::AlreadyInstalled)
}
