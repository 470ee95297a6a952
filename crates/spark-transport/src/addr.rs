use core::fmt;
use core::str::FromStr;
use std::net::{AddrParseError, Ipv4Addr, Ipv6Addr, SocketAddr};

/// `TransportSocketAddr` 为连接器、代理与连接池提供统一的 Socket 地址表达。
///
/// # 教案级注释
///
/// ## 意图（Why）
/// - 连接器的池化键需要一个可全序比较、可哈希的地址值，`std::net::SocketAddr` 的排序
///   语义依赖其内部表示，这里以显式字段固定比较顺序（先协议族，再地址字节，最后端口）。
///
/// ## 合同（What）
/// - `V4` 与 `V6` 分别表示 IPv4/IPv6；
/// - `Display` 与标准库格式一致（`1.2.3.4:80` / `[::1]:80`），适合日志与诊断；
/// - 值不可变，按值共享。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum TransportSocketAddr {
    /// IPv4 地址。
    V4 { addr: [u8; 4], port: u16 },
    /// IPv6 地址。
    V6 { addr: [u16; 8], port: u16 },
}

impl TransportSocketAddr {
    /// 以 IPv4 八位组与端口构造地址。
    pub const fn v4(addr: [u8; 4], port: u16) -> Self {
        Self::V4 { addr, port }
    }

    /// 端口号。
    pub fn port(&self) -> u16 {
        match self {
            Self::V4 { port, .. } | Self::V6 { port, .. } => *port,
        }
    }

    /// 返回替换端口后的新地址，原值不变。
    pub fn with_port(self, port: u16) -> Self {
        match self {
            Self::V4 { addr, .. } => Self::V4 { addr, port },
            Self::V6 { addr, .. } => Self::V6 { addr, port },
        }
    }

    /// 转换为标准库地址。
    pub fn to_socket_addr(self) -> SocketAddr {
        SocketAddr::from(self)
    }
}

impl fmt::Display for TransportSocketAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_socket_addr(), f)
    }
}

impl FromStr for TransportSocketAddr {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<SocketAddr>().map(Self::from)
    }
}

impl From<SocketAddr> for TransportSocketAddr {
    fn from(addr: SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(v4) => Self::V4 {
                addr: v4.ip().octets(),
                port: v4.port(),
            },
            SocketAddr::V6(v6) => Self::V6 {
                addr: v6.ip().segments(),
                port: v6.port(),
            },
        }
    }
}

impl From<TransportSocketAddr> for SocketAddr {
    fn from(addr: TransportSocketAddr) -> Self {
        match addr {
            TransportSocketAddr::V4 { addr, port } => SocketAddr::from((Ipv4Addr::from(addr), port)),
            TransportSocketAddr::V6 { addr, port } => SocketAddr::from((Ipv6Addr::from(addr), port)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_std_formatting() {
        let v4: TransportSocketAddr = "10.0.0.7:4063".parse().expect("合法 IPv4 地址");
        assert_eq!(v4.to_string(), "10.0.0.7:4063");

        let v6: TransportSocketAddr = "[::1]:10000".parse().expect("合法 IPv6 地址");
        assert_eq!(v6.to_string(), "[::1]:10000");
    }

    #[test]
    fn ordering_is_family_then_bytes_then_port() {
        let low = TransportSocketAddr::v4([10, 0, 0, 1], 9000);
        let high_port = low.with_port(9001);
        let v6: TransportSocketAddr = "[::1]:1".parse().expect("合法 IPv6 地址");

        assert!(low < high_port);
        assert!(high_port < v6);
        assert_eq!(high_port.port(), 9001);
    }
}
