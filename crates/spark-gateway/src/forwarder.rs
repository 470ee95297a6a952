//! # BlobForwarder：不透明调用转发器
//!
//! ## 核心意图（Why）
//! - 客户端发来的每个调用都带着目标身份，转发器不理解参数，只负责“该不该转、转给谁、怎么转”。
//!
//! ## 行为契约（What）
//! 1. 已销毁时返回 [`DispatchError::Destroyed`]；
//! 2. 白名单非空且身份类别不在其中时返回 `NotFound`，不查询路由表；
//! 3. 路由表未命中同样返回 `NotFound`，调用方无法区分两种拒绝；
//! 4. 非默认 facet 在同一目的代理上收窄，不引入新的表项；
//! 5. `_fwd` 上下文中的指令按顺序折叠，未知字符告警后跳过；
//! 6. 下游返回的任何错误原样上抛。
//!
//! ## 追踪级别
//! - `client >= 1`：拒绝与转发异常；`client >= 2`：每次转发的目标、操作名与有效模式；
//! - 未知转发指令始终以 `warn!` 记录。

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use spark_core::{
    Blobject, Current, Destroyed, DispatchError, Invoker, Lifecycle, LifecycleState, Request,
};
use spark_router::RoutingTable;
use tracing::{debug, warn};

use crate::{AllowList, GatewayConfig};

const TRACE_TARGET: &str = "spark::gateway::forwarder";
const COMPONENT: &str = "forwarder";

/// 网关的入站转发器，对外表现为一个接收任意操作的 [`Blobject`]。
///
/// # 教案式注释
///
/// ## 逻辑 (How)
/// - 每个调用先通过 [`Lifecycle::enter`] 登记为在途调用，守卫随调用结束释放；
/// - 路由表与下游调用器的引用一起放在 `RwLock<Option<_>>` 中，读锁只在克隆 `Arc` 的瞬间持有，
///   不跨越 `await`；
/// - [`BlobForwarder::destroy`] 先翻转生命周期，再等待在途调用排空，最后释放全部外部引用。
///
/// ## 注意事项 (Trade-offs)
/// - 在转发器自身的调用链内部等待 `destroy` 会因排空等待自己而挂起。
pub struct BlobForwarder {
    lifecycle: Lifecycle,
    allow_list: AllowList,
    refs: RwLock<Option<ForwarderRefs>>,
    trace_level: u8,
}

/// 转发器持有的外部引用，销毁时整体释放。
#[derive(Clone)]
struct ForwarderRefs {
    routing_table: Arc<dyn RoutingTable>,
    invoker: Arc<dyn Invoker>,
}

impl BlobForwarder {
    pub fn new(
        routing_table: Arc<dyn RoutingTable>,
        invoker: Arc<dyn Invoker>,
        allow_list: AllowList,
    ) -> Self {
        Self {
            lifecycle: Lifecycle::new(COMPONENT),
            allow_list,
            refs: RwLock::new(Some(ForwarderRefs {
                routing_table,
                invoker,
            })),
            trace_level: 0,
        }
    }

    /// 以配置中的白名单与 `trace.client` 级别构造。
    pub fn from_config(
        config: &GatewayConfig,
        routing_table: Arc<dyn RoutingTable>,
        invoker: Arc<dyn Invoker>,
    ) -> Self {
        Self::new(routing_table, invoker, config.allow_list()).with_trace_level(config.trace.client)
    }

    pub fn with_trace_level(mut self, level: u8) -> Self {
        self.trace_level = level;
        self
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// 停止受理新调用，等待在途调用结束后释放路由表与调用器引用；重复调用返回 [`Destroyed`]。
    pub async fn destroy(&self) -> Result<(), Destroyed> {
        self.lifecycle.begin_destroy()?;
        self.lifecycle.drained().await;
        self.refs.write().take();
        Ok(())
    }

    fn reject(&self, current: &Current, reason: &'static str) -> DispatchError {
        if self.trace_level >= 1 {
            debug!(
                target: TRACE_TARGET,
                identity = %current.identity(),
                reason,
                "rejecting request"
            );
        }
        DispatchError::not_found(current)
    }
}

#[async_trait]
impl Blobject for BlobForwarder {
    async fn invoke(&self, current: &Current, params: Bytes) -> Result<Bytes, DispatchError> {
        let _in_flight = self.lifecycle.enter()?;

        let identity = current.identity();
        if !self.allow_list.permits(identity.category()) {
            return Err(self.reject(current, "category not allowed"));
        }

        let ForwarderRefs {
            routing_table,
            invoker,
        } = self
            .refs
            .read()
            .clone()
            .ok_or(Destroyed { component: COMPONENT })?;
        let Some(mut proxy) = routing_table.get(identity) else {
            return Err(self.reject(current, "no route"));
        };

        if !current.facet().is_empty() {
            proxy = proxy.with_facet(current.facet());
        }
        if let Some(directives) = current.forward_directives() {
            proxy = proxy.apply_directives(directives, |option| {
                warn!(target: TRACE_TARGET, %option, "unknown forward option");
            });
        }

        if self.trace_level >= 2 {
            debug!(
                target: TRACE_TARGET,
                %proxy,
                operation = current.operation(),
                mode = ?proxy.mode(),
                idempotent = current.mode().is_idempotent(),
                "routing to"
            );
        }

        let request = Request::from_current(current, params);
        match invoker.invoke(&proxy, request).await {
            Ok(reply) => Ok(reply),
            Err(err) => {
                if self.trace_level >= 1 {
                    debug!(target: TRACE_TARGET, %proxy, error = %err, "routing exception");
                }
                Err(err)
            }
        }
    }
}
