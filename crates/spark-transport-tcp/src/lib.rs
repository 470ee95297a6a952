#![doc = r#"
# spark-transport-tcp

## 设计动机（Why）
- **定位**：提供 Spark 网关在 Tokio 运行时上的出站 TCP 连接器，封装建连、超时、
  取消与套接字选项等底层细节。
- **架构角色**：实现 [`spark_transport::Connector`] 契约，供
  [`ConnectionPool`](spark_transport::ConnectionPool) 按连接身份复用通道。

## 核心契约（What）
- [`TcpConnector`]：不可变值，描述目标地址、建连超时、协议/编码版本与连接 ID；
  相等与排序完全由 [`ConnectorKey`](spark_transport::ConnectorKey) 决定；
- [`TcpChannel`]：已建立的双向字节流，支持读写与半关闭；
- 建连失败统一映射为 [`TransportError`](spark_transport::TransportError)，不做重试。

## 实现策略（How）
- 建连 Future 与连接器自身的超时、调用方的取消信号通过 `tokio::select!` 竞速；
- 网络追踪级别 ≥ 2 时记录建连尝试与失败详情。
"#]

mod channel;
mod connector;
mod error;
mod util;

pub use channel::{ShutdownDirection, TcpChannel, TcpSocketConfig};
pub use connector::TcpConnector;
