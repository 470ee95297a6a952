//! # ConnectionPool：按连接身份复用出站通道
//!
//! ## 行为契约（What）
//! - `get_or_connect`：若池中已有与连接器 [`ConnectorKey`] 相等的通道则直接复用，
//!   否则调用 [`Connector::connect`] 建立新通道并登记；建连失败不会留下条目；
//! - `evict`：按键移除通道（例如上层检测到通道已关闭）；
//! - 同一个池内，建连过程持有异步互斥锁，因此并发请求同一键只会触发一次建连。
//!
//! ## 风险提示（Trade-offs）
//! - 建连期间其他键的请求同样会等待，池适合“少量长连接”的网关出站场景。

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{Connector, ConnectorKey, TransportError};

/// 以 [`ConnectorKey`] 为索引的出站通道池。
pub struct ConnectionPool<C: Connector> {
    channels: Mutex<BTreeMap<ConnectorKey, Arc<C::Channel>>>,
}

impl<C: Connector> ConnectionPool<C> {
    /// 创建空池。
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(BTreeMap::new()),
        }
    }

    /// 复用或建立到 `connector` 描述端点的通道。
    pub async fn get_or_connect(
        &self,
        connector: &C,
    ) -> crate::Result<Arc<C::Channel>, TransportError> {
        let key = connector.key();
        let mut channels = self.channels.lock().await;
        if let Some(existing) = channels.get(&key) {
            return Ok(Arc::clone(existing));
        }

        let channel = Arc::new(connector.connect().await?);
        channels.insert(key, Arc::clone(&channel));
        Ok(channel)
    }

    /// 移除并返回键对应的通道。
    pub async fn evict(&self, key: &ConnectorKey) -> Option<Arc<C::Channel>> {
        self.channels.lock().await.remove(key)
    }

    /// 当前池化的通道数量。
    pub async fn len(&self) -> usize {
        self.channels.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.channels.lock().await.is_empty()
    }

    /// 已登记的键，按池化次序排列。
    pub async fn keys(&self) -> Vec<ConnectorKey> {
        self.channels.lock().await.keys().cloned().collect()
    }
}

impl<C: Connector> Default for ConnectionPool<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> fmt::Debug for ConnectionPool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EncodingVersion, EndpointType, ProtocolVersion, TransportSocketAddr};
    use async_trait::async_trait;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingConnector {
        address: TransportSocketAddr,
        connection_id: Arc<str>,
        attempts: Arc<AtomicUsize>,
        refuse: bool,
    }

    impl CountingConnector {
        fn new(port: u16, connection_id: &str, attempts: &Arc<AtomicUsize>) -> Self {
            Self {
                address: TransportSocketAddr::v4([127, 0, 0, 1], port),
                connection_id: Arc::from(connection_id),
                attempts: Arc::clone(attempts),
                refuse: false,
            }
        }
    }

    impl fmt::Display for CountingConnector {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt::Display::fmt(&self.address, f)
        }
    }

    #[async_trait]
    impl Connector for CountingConnector {
        type Channel = usize;

        async fn connect(&self) -> crate::Result<usize, TransportError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.refuse {
                return Err(TransportError::ConnectFailed {
                    endpoint: EndpointType::Tcp,
                    target: self.to_string(),
                    source: io::Error::from(io::ErrorKind::ConnectionRefused),
                });
            }
            Ok(attempt)
        }

        fn endpoint_type(&self) -> EndpointType {
            EndpointType::Tcp
        }

        fn key(&self) -> ConnectorKey {
            ConnectorKey::new(
                EndpointType::Tcp,
                self.address,
                Duration::from_secs(1),
                ProtocolVersion::V1_0,
                EncodingVersion::V1_1,
                Arc::clone(&self.connection_id),
            )
        }
    }

    #[tokio::test]
    async fn equal_keys_share_one_channel() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let pool = ConnectionPool::new();

        let first = pool
            .get_or_connect(&CountingConnector::new(4063, "", &attempts))
            .await
            .expect("首次建连");
        let second = pool
            .get_or_connect(&CountingConnector::new(4063, "", &attempts))
            .await
            .expect("复用通道");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(pool.len().await, 1);
    }

    #[tokio::test]
    async fn connection_id_separates_channels() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let pool = ConnectionPool::new();

        pool.get_or_connect(&CountingConnector::new(4063, "", &attempts))
            .await
            .expect("默认连接");
        pool.get_or_connect(&CountingConnector::new(4063, "isolated", &attempts))
            .await
            .expect("独立连接");

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        let keys = pool.keys().await;
        assert_eq!(keys.len(), 2);
        assert!(keys[0] < keys[1]);
    }

    #[tokio::test]
    async fn failed_connect_leaves_no_entry_and_evict_forces_reconnect() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let pool = ConnectionPool::new();

        let mut refusing = CountingConnector::new(4064, "", &attempts);
        refusing.refuse = true;
        let err = pool.get_or_connect(&refusing).await.expect_err("对端拒绝");
        assert_eq!(err.target(), "127.0.0.1:4064");
        assert!(pool.is_empty().await);

        let healthy = CountingConnector::new(4064, "", &attempts);
        pool.get_or_connect(&healthy).await.expect("建连成功");
        assert!(pool.evict(&healthy.key()).await.is_some());
        pool.get_or_connect(&healthy).await.expect("重新建连");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
