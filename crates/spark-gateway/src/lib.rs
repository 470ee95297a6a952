#![deny(unsafe_code)]

//! # spark-gateway
//!
//! ## 定位与职责（Why）
//! - 介于不可信客户端与后端对象服务之间的会话感知转发网关；
//! - 入站调用经 [`BlobForwarder`] 做访问控制、查路由表、套用逐调用转发指令后原样转发，
//!   应答与故障同样原样回传；
//! - [`SessionRouter`] 为每个客户端维护会话列表，负责回调代理登记与会话生命周期。
//!
//! ## 架构嵌入（Where）
//! - `forwarder`：不透明调用转发器；
//! - `router`：会话路由器；
//! - `session`：会话管理契约与进程内实现 [`LocalSessionManager`]；
//! - `adapter`：进程内对象适配器，既是会话仆从的注册表，也是出站 [`Invoker`](spark_core::Invoker)；
//! - `config` / `observability`：TOML 配置与 `tracing` 订阅器安装。

pub mod adapter;
pub mod allow_list;
pub mod config;
pub mod error;
pub mod forwarder;
pub mod observability;
pub mod router;
pub mod session;
pub mod shutdown;

pub use adapter::ObjectAdapter;
pub use allow_list::AllowList;
pub use config::{ConnectorConfig, GatewayConfig, RouterConfig, TraceConfig};
pub use error::{ConfigError, GatewayError, SessionError};
pub use forwarder::BlobForwarder;
pub use observability::{ObservabilityError, install_tracing};
pub use router::{SessionRouter, TeardownSummary};
pub use session::{
    LocalSession, LocalSessionManager, Session, SessionHandle, SessionManager,
    SessionServantFactory,
};
pub use shutdown::ShutdownSignal;
