use std::cmp::Ordering;
use std::fmt;
use std::future::{self, Future};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use spark_transport::{
    Connector, ConnectorKey, EncodingVersion, EndpointType, ProtocolVersion, TransportError,
    TransportSocketAddr,
};
use tokio::net::TcpStream as TokioTcpStream;
use tracing::debug;

use crate::{
    TcpChannel, TcpSocketConfig,
    error::{cancelled_error, connect_failed, timeout_error},
    util::{Bounded, run_bounded},
};

/// 追踪目标，与网关其余组件的 `spark::*` 命名保持一致。
const TRACE_TARGET: &str = "spark::transport::tcp";

/// 建连尝试与失败详情的最低网络追踪级别。
const NETWORK_TRACE_DETAIL: u8 = 2;

/// 描述如何建立一条出站 TCP 连接的不可变值。
///
/// # 教案式注释
///
/// ## 契约 (What)
/// - 身份字段：目标地址、建连超时、协议版本、编码版本、连接 ID；两个连接器相等当且仅当
///   五个字段全部相等，排序同样只看这五个字段（经由 [`ConnectorKey`]）；
/// - `trace_level` 与套接字配置只影响观测与本地行为，不参与相等与排序；
/// - `connect` 只使用自身配置的超时，从不继承调用方的截止时间，失败不重试。
///
/// ## 逻辑 (How)
/// - 建连前在网络追踪级别 ≥ 2 时记录目标地址；
/// - Tokio `TcpStream::connect` 与超时、取消信号竞速，失败时同样按级别记录错误详情后原样返回。
#[derive(Clone, Debug)]
pub struct TcpConnector {
    address: TransportSocketAddr,
    timeout: Duration,
    protocol: ProtocolVersion,
    encoding: EncodingVersion,
    connection_id: Arc<str>,
    trace_level: u8,
    socket: TcpSocketConfig,
}

impl TcpConnector {
    pub fn new(
        address: TransportSocketAddr,
        timeout: Duration,
        protocol: ProtocolVersion,
        encoding: EncodingVersion,
        connection_id: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            address,
            timeout,
            protocol,
            encoding,
            connection_id: connection_id.into(),
            trace_level: 0,
            socket: TcpSocketConfig::new(),
        }
    }

    /// 设置网络追踪级别。
    pub fn with_trace_level(mut self, level: u8) -> Self {
        self.trace_level = level;
        self
    }

    /// 设置建连成功后应用的套接字选项。
    pub fn with_socket_config(mut self, socket: TcpSocketConfig) -> Self {
        self.socket = socket;
        self
    }

    pub fn address(&self) -> TransportSocketAddr {
        self.address
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn protocol(&self) -> ProtocolVersion {
        self.protocol
    }

    pub fn encoding(&self) -> EncodingVersion {
        self.encoding
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// 建连，同时在 `cancelled` 完成时放弃本次尝试。
    ///
    /// - **契约 (What)**：取消优先于建连结果生效；超时由连接器配置决定；
    ///   失败返回 [`TransportError::ConnectFailed`]、[`TransportError::Timeout`] 或
    ///   [`TransportError::Cancelled`]。
    pub async fn connect_until<C>(&self, cancelled: C) -> Result<TcpChannel, TransportError>
    where
        C: Future<Output = ()> + Send,
    {
        let target = self.to_string();
        if self.trace_level >= NETWORK_TRACE_DETAIL {
            debug!(target: TRACE_TARGET, %target, "trying to establish tcp connection");
        }

        let outcome = run_bounded(
            self.timeout,
            cancelled,
            TokioTcpStream::connect(self.address.to_socket_addr()),
        )
        .await;

        let result = match outcome {
            Bounded::Completed(Ok(stream)) => {
                TcpChannel::from_stream(stream, &target, self.socket.clone())
            }
            Bounded::Completed(Err(err)) => Err(connect_failed(&target, err)),
            Bounded::TimedOut => Err(timeout_error(&target, self.timeout)),
            Bounded::Cancelled => Err(cancelled_error(&target)),
        };

        if let Err(err) = &result
            && self.trace_level >= NETWORK_TRACE_DETAIL
        {
            debug!(target: TRACE_TARGET, %target, error = %err, "failed to establish tcp connection");
        }
        result
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Channel = TcpChannel;

    async fn connect(&self) -> spark_transport::Result<TcpChannel, TransportError> {
        self.connect_until(future::pending::<()>()).await
    }

    fn endpoint_type(&self) -> EndpointType {
        EndpointType::Tcp
    }

    fn key(&self) -> ConnectorKey {
        ConnectorKey::new(
            EndpointType::Tcp,
            self.address,
            self.timeout,
            self.protocol,
            self.encoding,
            Arc::clone(&self.connection_id),
        )
    }
}

impl fmt::Display for TcpConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.address, f)
    }
}

impl PartialEq for TcpConnector {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for TcpConnector {}

impl PartialOrd for TcpConnector {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TcpConnector {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl Hash for TcpConnector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}
