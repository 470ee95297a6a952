use spark_transport::{EndpointType, TransportError};
use std::io;
use std::time::Duration;

/// 描述一次底层操作对应的稳定名称。
#[derive(Clone, Copy, Debug)]
pub(crate) struct OperationKind {
    pub name: &'static str,
}

pub(crate) const READ: OperationKind = OperationKind { name: "tcp read" };
pub(crate) const WRITE: OperationKind = OperationKind { name: "tcp write" };
pub(crate) const SHUTDOWN: OperationKind = OperationKind { name: "tcp shutdown" };
pub(crate) const CONFIGURE: OperationKind = OperationKind { name: "tcp configure" };

/// 将已建立通道上的 IO 错误映射为传输错误。
pub(crate) fn map_io_error(kind: OperationKind, target: &str, error: io::Error) -> TransportError {
    TransportError::Io {
        endpoint: EndpointType::Tcp,
        target: target.to_owned(),
        operation: kind.name,
        source: error,
    }
}

/// 建连阶段被拒绝或不可达。
pub(crate) fn connect_failed(target: &str, error: io::Error) -> TransportError {
    TransportError::ConnectFailed {
        endpoint: EndpointType::Tcp,
        target: target.to_owned(),
        source: error,
    }
}

/// 构造取消错误。
pub(crate) fn cancelled_error(target: &str) -> TransportError {
    TransportError::Cancelled {
        endpoint: EndpointType::Tcp,
        target: target.to_owned(),
    }
}

/// 构造超时错误。
pub(crate) fn timeout_error(target: &str, timeout: Duration) -> TransportError {
    TransportError::Timeout {
        endpoint: EndpointType::Tcp,
        target: target.to_owned(),
        timeout,
    }
}
