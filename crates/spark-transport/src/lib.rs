#![deny(unsafe_code)]
#![doc = "spark-transport: 出站传输契约统一抽象层。"]
#![doc = ""]
#![doc = "== 使命概述 =="]
#![doc = "- **What**：定义 [`Connector`] 连接器契约、[`ConnectorKey`] 池化键、[`TransportSocketAddr`] 地址结构，以及按键复用出站通道的 [`ConnectionPool`]。"]
#![doc = "- **How**：具体协议（如 `spark-transport-tcp`）只需实现 [`Connector`]，即可被上层网关按连接身份去重、复用。"]

/// `Result` 是传输层契约内部使用的统一返回别名。
///
/// 与 `core::result::Result` 完全等价，调用者需在签名中显式声明错误类型。
pub type Result<T, E> = core::result::Result<T, E>;

pub mod addr;
pub mod connector;
pub mod error;
pub mod pool;

pub use addr::TransportSocketAddr;
pub use connector::{Connector, ConnectorKey, EncodingVersion, EndpointType, ProtocolVersion};
pub use error::TransportError;
pub use pool::ConnectionPool;
