//! # ObjectAdapter：进程内仆从注册表
//!
//! ## 角色定位（Why）
//! - 会话管理器把每个会话的仆从挂在适配器上，路由器据此生成回调代理；
//! - 适配器同时实现 [`Invoker`]，使转发器可以把调用直接派发给同进程内的仆从。
//!
//! ## 行为契约（What）
//! - 以 [`Identity`] 为键，基于 `DashMap` 并发增删查；
//! - 派发时双向调用返回仆从应答，单向与报文调用在仆从执行完毕后返回空字节；
//!   仆从报告的错误在所有模式下都原样返回；
//! - 未注册的身份返回 [`DispatchError::NotFound`]。

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use spark_core::{
    Blobject, Current, DestinationProxy, DispatchError, ForwardMode, Identity, Invoker,
    OperationMode, Request,
};
use spark_transport::TransportSocketAddr;

/// 命名的仆从注册表，可选地绑定一个对外公布的端点。
pub struct ObjectAdapter {
    name: Arc<str>,
    endpoint: Option<TransportSocketAddr>,
    servants: DashMap<Identity, Arc<dyn Blobject>>,
}

impl ObjectAdapter {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
            servants: DashMap::new(),
        }
    }

    /// 设置该适配器生成的代理所携带的端点。
    pub fn with_endpoint(mut self, endpoint: TransportSocketAddr) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> Option<TransportSocketAddr> {
        self.endpoint
    }

    /// 生成以本适配器为根的身份代理，不要求该身份已注册仆从。
    pub fn create_proxy(&self, identity: Identity) -> DestinationProxy {
        let proxy = DestinationProxy::new(identity);
        match self.endpoint {
            Some(endpoint) => proxy.with_endpoint(endpoint),
            None => proxy,
        }
    }

    /// 注册仆从，返回被替换的旧仆从。
    pub fn add(&self, identity: Identity, servant: Arc<dyn Blobject>) -> Option<Arc<dyn Blobject>> {
        self.servants.insert(identity, servant)
    }

    pub fn remove(&self, identity: &Identity) -> Option<Arc<dyn Blobject>> {
        self.servants.remove(identity).map(|(_, servant)| servant)
    }

    pub fn find(&self, identity: &Identity) -> Option<Arc<dyn Blobject>> {
        self.servants
            .get(identity)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.servants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servants.is_empty()
    }
}

impl fmt::Debug for ObjectAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectAdapter")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("servants", &self.servants.len())
            .finish()
    }
}

#[async_trait]
impl Invoker for ObjectAdapter {
    async fn invoke(
        &self,
        target: &DestinationProxy,
        request: Request,
    ) -> Result<Bytes, DispatchError> {
        let mode = if request.idempotent {
            OperationMode::Idempotent
        } else {
            OperationMode::Normal
        };
        let current = Current::new(target.identity().clone(), request.operation)
            .with_facet(target.facet())
            .with_mode(mode)
            .with_context(request.context)
            .with_datagram(target.mode() == ForwardMode::Datagram);

        let Some(servant) = self.find(target.identity()) else {
            return Err(DispatchError::not_found(&current));
        };
        let reply = servant.invoke(&current, request.params).await?;
        if target.mode().expects_reply() {
            Ok(reply)
        } else {
            Ok(Bytes::new())
        }
    }
}
