//! # 会话管理契约
//!
//! ## 核心意图（Why）
//! - 会话路由器只需要两件事：为用户创建会话，在拆除时逐个销毁会话；
//!   会话的业务逻辑由外部实现，这里只约定最小接口。
//!
//! ## 行为契约（What）
//! - [`SessionManager::create`]：为 `user_id` 创建会话并登记在可路由的身份下；
//!   不同 `user_id` 的并发创建必须安全；
//! - [`SessionManager::remove`]：注销身份，返回是否确有注销发生，重复调用返回 `false`；
//! - [`Session::destroy`]：重复调用不报错。
//!
//! ## 进程内实现（How）
//! - [`LocalSessionManager`] 通过 [`SessionServantFactory`] 构造仆从，挂到 [`ObjectAdapter`] 上，
//!   身份为 `{category: user_id, name: "session-<序号>"}`；
//! - [`LocalSession::destroy`] 通过原子标志保证只注销一次。

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use spark_core::{Blobject, Identity};

use crate::{ObjectAdapter, SessionError};

/// 已创建会话的共享句柄。
pub type SessionHandle = Arc<dyn Session>;

/// 单个用户会话。
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// 会话登记的可路由身份。
    fn identity(&self) -> &Identity;

    fn user_id(&self) -> &str;

    /// 销毁会话并注销其身份。
    async fn destroy(&self) -> Result<(), SessionError>;
}

/// 会话管理器。
#[async_trait]
pub trait SessionManager: Send + Sync + 'static {
    async fn create(&self, user_id: &str) -> Result<SessionHandle, SessionError>;

    async fn remove(&self, identity: &Identity) -> bool;
}

/// 为新会话构造后端仆从。
pub trait SessionServantFactory: Send + Sync + 'static {
    fn create(&self, user_id: &str, identity: &Identity) -> Arc<dyn Blobject>;
}

impl<F> SessionServantFactory for F
where
    F: Fn(&str, &Identity) -> Arc<dyn Blobject> + Send + Sync + 'static,
{
    fn create(&self, user_id: &str, identity: &Identity) -> Arc<dyn Blobject> {
        self(user_id, identity)
    }
}

/// 基于 [`ObjectAdapter`] 的进程内会话管理器，克隆共享同一份状态。
#[derive(Clone)]
pub struct LocalSessionManager {
    inner: Arc<LocalInner>,
}

struct LocalInner {
    adapter: Arc<ObjectAdapter>,
    factory: Arc<dyn SessionServantFactory>,
    sequence: AtomicU64,
}

impl LocalSessionManager {
    pub fn new(adapter: Arc<ObjectAdapter>, factory: impl SessionServantFactory) -> Self {
        Self {
            inner: Arc::new(LocalInner {
                adapter,
                factory: Arc::new(factory),
                sequence: AtomicU64::new(0),
            }),
        }
    }

    pub fn adapter(&self) -> &Arc<ObjectAdapter> {
        &self.inner.adapter
    }

    /// 当前仍挂在适配器上的会话仆从数量。
    pub fn active_sessions(&self) -> usize {
        self.inner.adapter.len()
    }

    fn next_identity(&self, user_id: &str) -> Identity {
        let sequence = self.inner.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Identity::new(user_id, format!("session-{sequence}"))
    }
}

impl fmt::Debug for LocalSessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSessionManager")
            .field("adapter", &self.inner.adapter.name())
            .field("sequence", &self.inner.sequence.load(Ordering::Relaxed))
            .finish()
    }
}

#[async_trait]
impl SessionManager for LocalSessionManager {
    async fn create(&self, user_id: &str) -> Result<SessionHandle, SessionError> {
        let identity = self.next_identity(user_id);
        let servant = self.inner.factory.create(user_id, &identity);
        self.inner.adapter.add(identity.clone(), servant);
        Ok(Arc::new(LocalSession {
            identity,
            user_id: user_id.to_owned(),
            manager: self.clone(),
            destroyed: AtomicBool::new(false),
        }))
    }

    async fn remove(&self, identity: &Identity) -> bool {
        self.inner.adapter.remove(identity).is_some()
    }
}

/// [`LocalSessionManager`] 创建的会话。
pub struct LocalSession {
    identity: Identity,
    user_id: String,
    manager: LocalSessionManager,
    destroyed: AtomicBool,
}

impl LocalSession {
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for LocalSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSession")
            .field("identity", &self.identity)
            .field("user_id", &self.user_id)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

#[async_trait]
impl Session for LocalSession {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn destroy(&self) -> Result<(), SessionError> {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.manager.remove(&self.identity).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use spark_core::{Current, DispatchError};

    struct Greeter {
        user_id: String,
    }

    #[async_trait]
    impl Blobject for Greeter {
        async fn invoke(&self, _current: &Current, _params: Bytes) -> Result<Bytes, DispatchError> {
            Ok(Bytes::from(format!("Hello {}", self.user_id)))
        }
    }

    fn manager() -> LocalSessionManager {
        LocalSessionManager::new(
            Arc::new(ObjectAdapter::new("sessions")),
            |user_id: &str, _: &Identity| -> Arc<dyn Blobject> {
                Arc::new(Greeter {
                    user_id: user_id.to_owned(),
                })
            },
        )
    }

    #[tokio::test]
    async fn create_registers_scoped_identity() {
        let manager = manager();
        let first = manager.create("alice").await.expect("创建会话");
        let second = manager.create("alice").await.expect("创建会话");

        assert_eq!(first.identity(), &Identity::new("alice", "session-1"));
        assert_eq!(second.identity(), &Identity::new("alice", "session-2"));
        assert_eq!(first.user_id(), "alice");
        assert!(manager.adapter().find(first.identity()).is_some());
        assert_eq!(manager.active_sessions(), 2);
    }

    #[tokio::test]
    async fn destroy_and_remove_tolerate_repetition() {
        let manager = manager();
        let session = manager.create("bob").await.expect("创建会话");
        let identity = session.identity().clone();

        session.destroy().await.expect("首次销毁");
        session.destroy().await.expect("重复销毁为空操作");
        assert!(!manager.remove(&identity).await);
        assert_eq!(manager.active_sessions(), 0);
    }
}
