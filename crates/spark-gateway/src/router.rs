//! # SessionRouter：每客户端一个的会话路由器
//!
//! ## 核心意图（Why）
//! - 客户端通过路由器拿到回调代理、登记自己的回调对象、创建会话；
//!   路由器拥有该客户端全部会话，并在拆除时负责逐个销毁。
//!
//! ## 行为契约（What）
//! - 状态机：`Active` 下全部操作可用；[`SessionRouter::destroy`] 单向进入 `Destroyed`，
//!   之后所有操作返回 [`GatewayError::Destroyed`]；
//! - `create_session` 的管理器调用与列表追加处于同一临界区，同一路由器上的并发创建不会交错；
//! - `destroy` 对每个会话各调用一次 `destroy`，单个失败不影响其余会话，随后释放全部引用。
//!
//! ## 追踪级别
//! - `routing_table >= 1`：记录每次登记到路由表的代理。

use std::fmt;
use std::mem;
use std::sync::Arc;

use parking_lot::RwLock;
use spark_core::{DestinationProxy, Identity, Lifecycle, LifecycleState};
use spark_router::RoutingTable;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use crate::{
    GatewayConfig, GatewayError, ObjectAdapter, SessionError, SessionHandle, SessionManager,
    ShutdownSignal,
};

const TRACE_TARGET: &str = "spark::gateway::router";
const COMPONENT: &str = "session router";

/// 回调代理使用的固定身份名。
const CALLBACK_IDENTITY: &str = "dummy";

/// 路由器持有的外部引用，销毁时整体清空。
#[derive(Default)]
struct RouterRefs {
    client_adapter: Option<Arc<ObjectAdapter>>,
    server_adapter: Option<Arc<ObjectAdapter>>,
    routing_table: Option<Arc<dyn RoutingTable>>,
    session_manager: Option<Arc<dyn SessionManager>>,
}

/// 拆除结果：成功销毁的会话数与各失败会话的错误。
#[derive(Debug, Default)]
pub struct TeardownSummary {
    pub destroyed: usize,
    pub failures: Vec<(Identity, SessionError)>,
}

impl TeardownSummary {
    /// 尝试销毁的会话总数。
    pub fn attempted(&self) -> usize {
        self.destroyed + self.failures.len()
    }
}

/// 会话路由器。
///
/// # 教案式注释
///
/// ## 逻辑 (How)
/// - 外部引用放在 `parking_lot::RwLock` 中，只在克隆 `Arc` 时短暂持有；
/// - 会话列表由 `tokio::sync::Mutex` 保护，管理器的异步调用在锁内完成；
/// - 每个公开操作都经由 [`Lifecycle::enter`] 登记，`destroy` 在清空引用前等待它们全部结束。
///
/// ## 注意事项 (Trade-offs)
/// - 在路由器自身的操作内部调用 `destroy` 会因排空等待自己而挂起。
pub struct SessionRouter {
    lifecycle: Lifecycle,
    refs: RwLock<RouterRefs>,
    sessions: AsyncMutex<Vec<SessionHandle>>,
    user_id: Arc<str>,
    shutdown: ShutdownSignal,
    trace_level: u8,
}

impl SessionRouter {
    pub fn new(
        client_adapter: Arc<ObjectAdapter>,
        routing_table: Arc<dyn RoutingTable>,
        user_id: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            lifecycle: Lifecycle::new(COMPONENT),
            refs: RwLock::new(RouterRefs {
                client_adapter: Some(client_adapter),
                routing_table: Some(routing_table),
                ..RouterRefs::default()
            }),
            sessions: AsyncMutex::new(Vec::new()),
            user_id: user_id.into(),
            shutdown: ShutdownSignal::new(),
            trace_level: 0,
        }
    }

    /// 以配置中的 `router.user_id` 与 `trace.routing_table` 构造。
    pub fn from_config(
        config: &GatewayConfig,
        client_adapter: Arc<ObjectAdapter>,
        routing_table: Arc<dyn RoutingTable>,
    ) -> Self {
        Self::new(client_adapter, routing_table, config.router.user_id.as_str())
            .with_trace_level(config.trace.routing_table)
    }

    pub fn with_server_adapter(mut self, adapter: Arc<ObjectAdapter>) -> Self {
        self.refs.get_mut().server_adapter = Some(adapter);
        self
    }

    pub fn with_session_manager(mut self, manager: Arc<dyn SessionManager>) -> Self {
        self.refs.get_mut().session_manager = Some(manager);
        self
    }

    /// 使用外部提供的停机信号，替换默认的私有信号。
    pub fn with_shutdown_signal(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = signal;
        self
    }

    pub fn with_trace_level(mut self, level: u8) -> Self {
        self.trace_level = level;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// 以客户端适配器为根的回调代理。
    pub fn get_client_proxy(&self) -> Result<DestinationProxy, GatewayError> {
        let _in_flight = self.lifecycle.enter()?;
        let refs = self.refs.read();
        let adapter = refs.client_adapter.as_ref().ok_or(self.destroyed())?;
        Ok(adapter.create_proxy(Identity::named(CALLBACK_IDENTITY)))
    }

    /// 以服务端适配器为根的回调代理；未配置服务端适配器时返回 `Ok(None)`，表示没有回调通道。
    pub fn get_server_proxy(&self) -> Result<Option<DestinationProxy>, GatewayError> {
        let _in_flight = self.lifecycle.enter()?;
        let refs = self.refs.read();
        Ok(refs
            .server_adapter
            .as_ref()
            .map(|adapter| adapter.create_proxy(Identity::named(CALLBACK_IDENTITY))))
    }

    /// 以代理自身的身份登记或整体替换路由表项。
    pub fn add_proxy(&self, proxy: DestinationProxy) -> Result<(), GatewayError> {
        let _in_flight = self.lifecycle.enter()?;
        let routing_table = self.refs.read().routing_table.clone().ok_or(self.destroyed())?;
        if self.trace_level >= 1 {
            debug!(target: TRACE_TARGET, %proxy, "adding proxy to routing table");
        }
        routing_table.add(proxy);
        Ok(())
    }

    /// 通过会话管理器为本路由器的用户创建会话并纳入会话列表。
    pub async fn create_session(&self) -> Result<SessionHandle, GatewayError> {
        let _in_flight = self.lifecycle.enter()?;
        let mut sessions = self.sessions.lock().await;
        let manager = self
            .refs
            .read()
            .session_manager
            .clone()
            .ok_or(GatewayError::NoSessionManager)?;

        let session = manager.create(&self.user_id).await?;
        sessions.push(Arc::clone(&session));
        Ok(session)
    }

    /// 当前会话数量。
    pub async fn session_count(&self) -> Result<usize, GatewayError> {
        let _in_flight = self.lifecycle.enter()?;
        Ok(self.sessions.lock().await.len())
    }

    /// 请求宿主通信器停机，仅产生外部效果。
    pub fn shutdown(&self) -> Result<(), GatewayError> {
        let _in_flight = self.lifecycle.enter()?;
        if self.shutdown.trigger() {
            debug!(target: TRACE_TARGET, user_id = %self.user_id, "shutdown requested");
        }
        Ok(())
    }

    /// 单向拆除：拒绝新操作、等待在途操作、逐个销毁会话，最后释放引用。
    pub async fn destroy(&self) -> Result<TeardownSummary, GatewayError> {
        self.lifecycle.begin_destroy()?;
        self.lifecycle.drained().await;

        let sessions = mem::take(&mut *self.sessions.lock().await);

        let mut summary = TeardownSummary::default();
        for session in sessions {
            match session.destroy().await {
                Ok(()) => summary.destroyed += 1,
                Err(err) => {
                    warn!(
                        target: TRACE_TARGET,
                        session = %session.identity(),
                        error = %err,
                        "failed to destroy session"
                    );
                    summary.failures.push((session.identity().clone(), err));
                }
            }
        }

        drop(mem::take(&mut *self.refs.write()));
        Ok(summary)
    }

    fn destroyed(&self) -> GatewayError {
        GatewayError::Destroyed {
            component: self.lifecycle.component(),
        }
    }
}

impl fmt::Debug for SessionRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRouter")
            .field("user_id", &self.user_id)
            .field("state", &self.lifecycle.state())
            .field("in_flight", &self.lifecycle.in_flight())
            .finish()
    }
}
