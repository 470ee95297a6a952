//! # DestinationProxy：转发目的地的不可变句柄
//!
//! ## 核心意图（Why）
//! - 路由表中的同一个目的代理会被大量并发调用共享，任何“按调用修改转发模式”的行为都
//!   必须产生新值而不是原地修改。
//!
//! ## 行为契约（What）
//! - [`ForwardDirective`] 由单个字符解析：`t` 双向、`o` 单向、`d` 报文、`s` 安全；
//! - [`DestinationProxy::apply_directives`] 对指令串做左折叠，冲突时后出现的指令生效
//!   （`"to"` 结果为单向，`"ot"` 结果为双向）；未知字符交给回调处理后跳过，从不中断折叠。

use core::fmt;
use std::sync::Arc;

use spark_transport::TransportSocketAddr;

use crate::Identity;

/// 请求的传输语义。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ForwardMode {
    /// 等待并回传应答。
    #[default]
    TwoWay,
    /// 只发送请求，不等待应答。
    OneWay,
    /// 以报文形式发送，不等待应答。
    Datagram,
}

impl ForwardMode {
    /// 该模式是否会把后端应答回传给调用方。
    pub fn expects_reply(self) -> bool {
        matches!(self, ForwardMode::TwoWay)
    }

    fn flag(self) -> &'static str {
        match self {
            ForwardMode::TwoWay => "-t",
            ForwardMode::OneWay => "-o",
            ForwardMode::Datagram => "-d",
        }
    }
}

/// 单字符转发指令。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ForwardDirective {
    TwoWay,
    OneWay,
    Datagram,
    Secure,
}

impl ForwardDirective {
    /// 解析指令字符，未知字符返回 `None`。
    pub fn from_char(option: char) -> Option<Self> {
        match option {
            't' => Some(ForwardDirective::TwoWay),
            'o' => Some(ForwardDirective::OneWay),
            'd' => Some(ForwardDirective::Datagram),
            's' => Some(ForwardDirective::Secure),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            ForwardDirective::TwoWay => 't',
            ForwardDirective::OneWay => 'o',
            ForwardDirective::Datagram => 'd',
            ForwardDirective::Secure => 's',
        }
    }
}

/// 指向后端对象的目的代理。
///
/// # 教案式说明
/// - **契约 (What)**：包含目标身份、facet、转发模式、安全标志以及已知端点/连接 ID；
///   所有变换方法都按值消费 `self` 并返回新值，原值在其他持有者处保持不变；
/// - **相等语义**：全部字段逐一比较，路由表读后写一致性测试依赖这一点。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DestinationProxy {
    identity: Identity,
    facet: Arc<str>,
    mode: ForwardMode,
    secure: bool,
    endpoint: Option<TransportSocketAddr>,
    connection_id: Option<Arc<str>>,
}

impl DestinationProxy {
    /// 默认 facet、双向、非安全、无已知端点的代理。
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            facet: Arc::from(""),
            mode: ForwardMode::TwoWay,
            secure: false,
            endpoint: None,
            connection_id: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: TransportSocketAddr) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn with_connection_id(mut self, connection_id: impl Into<Arc<str>>) -> Self {
        self.connection_id = Some(connection_id.into());
        self
    }

    /// 选择同一身份下的另一个 facet；不会引入新的路由键。
    pub fn with_facet(mut self, facet: impl Into<Arc<str>>) -> Self {
        self.facet = facet.into();
        self
    }

    pub fn with_mode(mut self, mode: ForwardMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// 应用单条指令。
    pub fn apply(self, directive: ForwardDirective) -> Self {
        match directive {
            ForwardDirective::TwoWay => self.with_mode(ForwardMode::TwoWay),
            ForwardDirective::OneWay => self.with_mode(ForwardMode::OneWay),
            ForwardDirective::Datagram => self.with_mode(ForwardMode::Datagram),
            ForwardDirective::Secure => self.with_secure(true),
        }
    }

    /// 按顺序左折叠指令串，未知字符交给 `on_unknown` 后跳过。
    pub fn apply_directives<F>(self, directives: &str, mut on_unknown: F) -> Self
    where
        F: FnMut(char),
    {
        directives
            .chars()
            .fold(self, |proxy, option| match ForwardDirective::from_char(option) {
                Some(directive) => proxy.apply(directive),
                None => {
                    on_unknown(option);
                    proxy
                }
            })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn facet(&self) -> &str {
        &self.facet
    }

    pub fn mode(&self) -> ForwardMode {
        self.mode
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn endpoint(&self) -> Option<TransportSocketAddr> {
        self.endpoint
    }

    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }
}

impl fmt::Display for DestinationProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity)?;
        if !self.facet.is_empty() {
            write!(f, " -f {}", self.facet)?;
        }
        write!(f, " {}", self.mode.flag())?;
        if self.secure {
            f.write_str(" -s")?;
        }
        if let Some(endpoint) = self.endpoint {
            let socket = endpoint.to_socket_addr();
            write!(f, ":tcp -h {} -p {}", socket.ip(), socket.port())?;
        }
        Ok(())
    }
}
