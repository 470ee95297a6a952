use crate::error::{self, map_io_error};
use socket2::SockRef;
use spark_transport::{TransportError, TransportSocketAddr};
use std::{io, net::Shutdown as StdShutdown, sync::Arc, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream as TokioTcpStream,
    sync::Mutex as AsyncMutex,
};

/// TCP 套接字级配置项，在建连成功后立即落地。
///
/// # 教案级注释
///
/// ## 契约（What）
/// - `linger`：`Some(dur)` 时通过 `SO_LINGER` 让关闭阶段在 `dur` 后发送 RST；`None` 沿用内核默认；
/// - `nodelay`：是否关闭 Nagle 算法，RPC 请求/应答场景默认开启；
/// - **后置条件**：配置应用失败时建连整体失败，不会返回半配置的通道。
///
/// ## 注意事项（Trade-offs）
/// - `SO_LINGER` 在 Linux 上向下取整到秒，测试断言需据此选择阈值。
#[derive(Clone, Debug)]
pub struct TcpSocketConfig {
    linger: Option<Duration>,
    nodelay: bool,
}

impl TcpSocketConfig {
    /// 默认配置：`linger = None`，`nodelay = true`。
    pub const fn new() -> Self {
        Self {
            linger: None,
            nodelay: true,
        }
    }

    /// 设置 `SO_LINGER` 超时时长。
    pub fn with_linger(mut self, linger: Option<Duration>) -> Self {
        self.linger = linger;
        self
    }

    /// 设置 `TCP_NODELAY`。
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    pub fn linger(&self) -> Option<Duration> {
        self.linger
    }

    pub fn nodelay(&self) -> bool {
        self.nodelay
    }

    fn apply(&self, stream: &TokioTcpStream) -> io::Result<()> {
        stream.set_nodelay(self.nodelay)?;
        SockRef::from(stream).set_linger(self.linger)
    }
}

impl Default for TcpSocketConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct TcpChannelInner {
    stream: AsyncMutex<TokioTcpStream>,
    peer_addr: TransportSocketAddr,
    local_addr: TransportSocketAddr,
    target: String,
    config: TcpSocketConfig,
}

/// 已建立的出站 TCP 通道。
///
/// # 教案式注释
///
/// ## 逻辑 (How)
/// - 内部以 `tokio::sync::Mutex` 包裹 `TcpStream`，确保多线程调用 `&self` 方法时互斥；
/// - 克隆仅复制 `Arc`，连接池中的多个调用方共享同一条底层连接。
///
/// ## 契约 (What)
/// - `read`/`write`：执行一次 IO 操作，`write` 保证整个缓冲区写完；
/// - `shutdown`：按方向执行半关闭；
/// - `peer_addr`/`local_addr`：建连时记录的结构化地址。
///
/// ## 注意事项 (Trade-offs)
/// - 互斥锁序列化读写，无法像 `TcpStream::split` 那样真正全双工。
#[derive(Clone, Debug)]
pub struct TcpChannel {
    inner: Arc<TcpChannelInner>,
}

impl TcpChannel {
    pub(crate) fn from_stream(
        stream: TokioTcpStream,
        target: &str,
        config: TcpSocketConfig,
    ) -> Result<Self, TransportError> {
        config
            .apply(&stream)
            .map_err(|err| map_io_error(error::CONFIGURE, target, err))?;
        let local = stream
            .local_addr()
            .map_err(|err| map_io_error(error::CONFIGURE, target, err))?;
        let peer = stream
            .peer_addr()
            .map_err(|err| map_io_error(error::CONFIGURE, target, err))?;
        Ok(Self {
            inner: Arc::new(TcpChannelInner {
                stream: AsyncMutex::new(stream),
                peer_addr: TransportSocketAddr::from(peer),
                local_addr: TransportSocketAddr::from(local),
                target: target.to_owned(),
                config,
            }),
        })
    }

    /// 读取数据到缓冲区，返回 0 表示对端已关闭写方向。
    pub async fn read(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut guard = self.inner.stream.lock().await;
        guard
            .read(buf)
            .await
            .map_err(|err| map_io_error(error::READ, &self.inner.target, err))
    }

    /// 将整个缓冲区写入套接字。
    pub async fn write(&self, buf: &[u8]) -> Result<usize, TransportError> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut guard = self.inner.stream.lock().await;
        guard
            .write_all(buf)
            .await
            .map(|_| buf.len())
            .map_err(|err| map_io_error(error::WRITE, &self.inner.target, err))
    }

    /// 根据方向执行半关闭。
    pub async fn shutdown(&self, direction: ShutdownDirection) -> Result<(), TransportError> {
        let mut guard = self.inner.stream.lock().await;
        let result = match direction {
            ShutdownDirection::Write => AsyncWriteExt::shutdown(&mut *guard).await,
            ShutdownDirection::Read => sync_shutdown(&guard, StdShutdown::Read),
            ShutdownDirection::Both => match AsyncWriteExt::shutdown(&mut *guard).await {
                Ok(()) => sync_shutdown(&guard, StdShutdown::Read),
                Err(err) => Err(err),
            },
        };
        result.map_err(|err| map_io_error(error::SHUTDOWN, &self.inner.target, err))
    }

    /// 查询底层套接字当前的 `SO_LINGER` 设置。
    pub async fn linger(&self) -> Result<Option<Duration>, TransportError> {
        let guard = self.inner.stream.lock().await;
        SockRef::from(&*guard)
            .linger()
            .map_err(|err| map_io_error(error::CONFIGURE, &self.inner.target, err))
    }

    /// 构造时使用的套接字配置。
    pub fn config(&self) -> &TcpSocketConfig {
        &self.inner.config
    }

    /// 获取对端地址。
    pub fn peer_addr(&self) -> TransportSocketAddr {
        self.inner.peer_addr
    }

    /// 获取本地地址。
    pub fn local_addr(&self) -> TransportSocketAddr {
        self.inner.local_addr
    }
}

/// 表示半关闭的方向。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownDirection {
    /// 关闭写半部。
    Write,
    /// 关闭读半部。
    Read,
    /// 同时关闭读写半部。
    Both,
}

fn sync_shutdown(stream: &TokioTcpStream, direction: StdShutdown) -> io::Result<()> {
    SockRef::from(stream).shutdown(direction)
}
