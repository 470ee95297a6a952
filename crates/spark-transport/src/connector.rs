//! # 出站连接器契约
//!
//! ## 角色定位（Why）
//! - 描述“如何抵达某个网络端点”：目标地址、建连超时、协议版本、编码版本与连接 ID；
//! - 上层（连接池、代理调用链）依据 [`ConnectorKey`] 对共享相同地址与选项的出站连接去重复用。
//!
//! ## 契约（What）
//! - [`Connector::connect`]：建立双向通道或返回 [`TransportError`]，从不自动重试；
//! - [`Connector::endpoint_type`]：协议族标签，区分共享端点抽象的不同实现；
//! - `Display`：规范地址文本，用于日志与池化诊断；
//! - [`Connector::key`]：派生的可排序元组键，仅作为池化/缓存键，不表达任何业务优先级。

use core::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::{TransportError, TransportSocketAddr};

/// 端点协议族标签。
///
/// 排序遵循数值编码，跨协议族比较连接器时先比较该标签。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum EndpointType {
    /// 明文 TCP。
    Tcp,
    /// TLS over TCP。
    Ssl,
    /// UDP 报文。
    Udp,
}

impl EndpointType {
    /// 线上编码值。
    pub const fn code(self) -> i16 {
        match self {
            EndpointType::Tcp => 1,
            EndpointType::Ssl => 2,
            EndpointType::Udp => 3,
        }
    }

    /// 短名称，与代理字符串中的协议前缀一致。
    pub const fn as_str(self) -> &'static str {
        match self {
            EndpointType::Tcp => "tcp",
            EndpointType::Ssl => "ssl",
            EndpointType::Udp => "udp",
        }
    }
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 协议版本 `major.minor`。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    /// 当前唯一发布的协议版本。
    pub const V1_0: Self = Self::new(1, 0);

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// 负载编码版本 `major.minor`。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EncodingVersion {
    pub major: u8,
    pub minor: u8,
}

impl EncodingVersion {
    pub const V1_0: Self = Self::new(1, 0);
    pub const V1_1: Self = Self::new(1, 1);

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for EncodingVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// 连接器的池化键。
///
/// # 教案式说明
/// - **契约 (What)**：字段声明顺序即比较顺序：协议族、超时、协议版本、编码版本、连接 ID、
///   目标地址；`Eq`/`Ord`/`Hash` 均由派生生成，因此两键相等当且仅当全部字段相等，
///   任一字段变化都会同时打破相等并改变相对次序。
/// - **用途 (Where)**：[`ConnectionPool`](crate::ConnectionPool) 的 `BTreeMap` 索引；
///   不应被用于表达“哪个端点更好”。
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectorKey {
    endpoint_type: EndpointType,
    timeout: Duration,
    protocol: ProtocolVersion,
    encoding: EncodingVersion,
    connection_id: Arc<str>,
    address: TransportSocketAddr,
}

impl ConnectorKey {
    pub fn new(
        endpoint_type: EndpointType,
        address: TransportSocketAddr,
        timeout: Duration,
        protocol: ProtocolVersion,
        encoding: EncodingVersion,
        connection_id: Arc<str>,
    ) -> Self {
        Self {
            endpoint_type,
            timeout,
            protocol,
            encoding,
            connection_id,
            address,
        }
    }

    pub fn endpoint_type(&self) -> EndpointType {
        self.endpoint_type
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
}

impl fmt::Display for ConnectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.endpoint_type, self.address)?;
        if !self.connection_id.is_empty() {
            write!(f, " [{}]", self.connection_id)?;
        }
        Ok(())
    }
}

/// 建立出站传输通道的连接器。
///
/// # 教案式说明
/// - **契约 (What)**：
///   - `connect` 为可取消的网络操作（丢弃 Future 即取消），必须使用连接器自身配置的超时，
///     不继承调用方的环境截止时间；失败时返回 [`TransportError`]，不做重试；
///   - 实现需保证 `key()` 覆盖所有影响连接身份的字段；
///   - `Display` 输出规范地址文本。
/// - **线程安全**：连接器是不可变值，可跨线程按值共享。
#[async_trait]
pub trait Connector: fmt::Display + Send + Sync + 'static {
    /// 建连成功后得到的双向通道类型。
    type Channel: Send + Sync + 'static;

    /// 建立到目标端点的通道。
    async fn connect(&self) -> crate::Result<Self::Channel, TransportError>;

    /// 协议族标签。
    fn endpoint_type(&self) -> EndpointType;

    /// 池化键。
    fn key(&self) -> ConnectorKey;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn base_key() -> ConnectorKey {
        ConnectorKey::new(
            EndpointType::Tcp,
            TransportSocketAddr::v4([127, 0, 0, 1], 10000),
            Duration::from_millis(500),
            ProtocolVersion::V1_0,
            EncodingVersion::V1_1,
            Arc::from(""),
        )
    }

    #[test]
    fn endpoint_type_orders_before_every_other_field() {
        let tcp = base_key();
        let ssl = ConnectorKey::new(
            EndpointType::Ssl,
            TransportSocketAddr::v4([0, 0, 0, 0], 1),
            Duration::ZERO,
            ProtocolVersion::new(0, 0),
            EncodingVersion::new(0, 0),
            Arc::from(""),
        );
        assert!(tcp < ssl);
    }

    #[test]
    fn display_includes_connection_id_only_when_set() {
        assert_eq!(base_key().to_string(), "tcp 127.0.0.1:10000");

        let tagged = ConnectorKey {
            connection_id: Arc::from("blue"),
            ..base_key()
        };
        assert_eq!(tagged.to_string(), "tcp 127.0.0.1:10000 [blue]");
    }

    proptest! {
        #[test]
        fn changing_any_single_field_breaks_equality_and_moves_order(
            field in 0usize..5,
            bump in 1u16..500,
        ) {
            let base = base_key();
            let changed = match field {
                0 => ConnectorKey { address: base.address.with_port(10000 + bump), ..base.clone() },
                1 => ConnectorKey { timeout: base.timeout + Duration::from_millis(u64::from(bump)), ..base.clone() },
                2 => ConnectorKey { protocol: ProtocolVersion::new(1, bump.min(255) as u8), ..base.clone() },
                3 => ConnectorKey { encoding: EncodingVersion::new(1, 1 + bump.min(254) as u8), ..base.clone() },
                _ => ConnectorKey { connection_id: Arc::from(format!("c{bump}")), ..base.clone() },
            };

            prop_assert_ne!(&changed, &base);
            prop_assert!(changed > base);
        }
    }
}
