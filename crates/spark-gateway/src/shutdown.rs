//! 通信器停机信号。

use std::sync::Arc;

use tokio::sync::watch;

/// 可克隆的一次性停机信号，会话路由器的 `shutdown()` 触发它，宿主进程等待它。
#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// 触发停机；仅第一次触发返回 `true`。
    pub fn trigger(&self) -> bool {
        self.sender.send_if_modified(|triggered| {
            if *triggered {
                false
            } else {
                *triggered = true;
                true
            }
        })
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// 等待停机信号，已触发时立即返回。
    pub async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        // 发送端由 `self` 持有，`wait_for` 不会因通道关闭而返回错误。
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn waiters_observe_trigger_from_clone() {
        let signal = ShutdownSignal::new();
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.wait().await })
        };

        assert!(signal.clone().trigger());
        assert!(!signal.trigger());
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("触发后等待者应被唤醒")
            .expect("等待任务不应 panic");
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn wait_returns_immediately_once_triggered() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .expect("已触发的信号立即返回");
    }
}
