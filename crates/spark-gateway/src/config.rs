//! # 网关配置
//!
//! ## 契约（What）
//! - TOML 格式，三个表全部可省略：
//!
//! ```toml
//! [trace]
//! client = 2          # 转发器追踪级别
//! routing_table = 1   # 路由表登记追踪级别
//! network = 2         # 建连追踪级别
//!
//! [router]
//! allow_categories = "alice bob"
//! user_id = "alice"
//!
//! [connector]
//! timeout_ms = 60000
//! connection_id = ""
//! ```
//!
//! - 未知字段视为错误，避免拼写错误被静默忽略。

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use spark_transport::{EncodingVersion, ProtocolVersion, TransportSocketAddr};
use spark_transport_tcp::TcpConnector;

use crate::{AllowList, ConfigError};

/// 默认建连超时（毫秒）。
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 60_000;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    pub trace: TraceConfig,
    pub router: RouterConfig,
    pub connector: ConnectorConfig,
}

/// 各组件的整数追踪级别，`0` 表示关闭。
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct TraceConfig {
    pub client: u8,
    pub routing_table: u8,
    pub network: u8,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// 空白分隔的类别白名单，空串表示放行全部。
    pub allow_categories: String,
    pub user_id: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectorConfig {
    pub timeout_ms: u64,
    pub connection_id: String,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            connection_id: String::new(),
        }
    }
}

impl GatewayConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// 解析 `router.allow_categories`。
    pub fn allow_list(&self) -> AllowList {
        AllowList::parse(&self.router.allow_categories)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connector.timeout_ms)
    }

    /// 按 `[connector]` 与 `trace.network` 构造指向 `address` 的 TCP 连接器。
    pub fn tcp_connector(&self, address: TransportSocketAddr) -> TcpConnector {
        TcpConnector::new(
            address,
            self.connect_timeout(),
            ProtocolVersion::V1_0,
            EncodingVersion::V1_1,
            self.connector.connection_id.as_str(),
        )
        .with_trace_level(self.trace.network)
    }
}
