//! # 不透明调用契约
//!
//! ## 核心意图（Why）
//! - 网关从不解析参数与返回值，入站与出站两侧都只搬运字节；
//! - 入站侧以 [`Blobject`] 表达“接收任意操作的调度目标”，出站侧以 [`Invoker`] 表达
//!   “把请求送往某个目的代理”的能力，两者之间没有共享状态。
//!
//! ## 行为契约（What）
//! - [`Current`] 描述入站调用的元数据：目标身份、facet、操作名、操作模式、请求上下文、
//!   是否以报文形式到达；
//! - [`Request`] 是出站调用的完整负载，由 [`Request::from_current`] 从入站元数据派生，
//!   上下文原样携带（包括 [`FORWARD_CONTEXT_KEY`]）。

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{DestinationProxy, DispatchError, Identity};

/// 请求上下文：字符串键值对，随调用透传。
pub type Context = BTreeMap<String, String>;

/// 携带逐调用转发指令的上下文键。
pub const FORWARD_CONTEXT_KEY: &str = "_fwd";

/// 操作模式。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OperationMode {
    #[default]
    Normal,
    Nonmutating,
    Idempotent,
}

impl OperationMode {
    /// 非 `Normal` 的操作都可以安全重放。
    pub fn is_idempotent(self) -> bool {
        !matches!(self, OperationMode::Normal)
    }
}

/// 入站调用元数据。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Current {
    identity: Identity,
    facet: String,
    operation: String,
    mode: OperationMode,
    context: Context,
    datagram: bool,
}

impl Current {
    pub fn new(identity: Identity, operation: impl Into<String>) -> Self {
        Self {
            identity,
            facet: String::new(),
            operation: operation.into(),
            mode: OperationMode::Normal,
            context: Context::new(),
            datagram: false,
        }
    }

    pub fn with_facet(mut self, facet: impl Into<String>) -> Self {
        self.facet = facet.into();
        self
    }

    pub fn with_mode(mut self, mode: OperationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// 追加单个上下文条目。
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// 标记本次调用以报文形式到达。
    pub fn with_datagram(mut self, datagram: bool) -> Self {
        self.datagram = datagram;
        self
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn facet(&self) -> &str {
        &self.facet
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn mode(&self) -> OperationMode {
        self.mode
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn is_datagram(&self) -> bool {
        self.datagram
    }

    /// `_fwd` 上下文中的转发指令串，缺失时返回 `None`。
    pub fn forward_directives(&self) -> Option<&str> {
        self.context.get(FORWARD_CONTEXT_KEY).map(String::as_str)
    }
}

/// 出站调用负载。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub operation: String,
    pub idempotent: bool,
    pub params: Bytes,
    pub context: Context,
}

impl Request {
    /// 以入站元数据与参数字节构造出站请求，操作名、幂等性与上下文原样保留。
    pub fn from_current(current: &Current, params: Bytes) -> Self {
        Self {
            operation: current.operation.clone(),
            idempotent: current.mode.is_idempotent(),
            params,
            context: current.context.clone(),
        }
    }
}

/// 接收任意操作的入站调度目标。
///
/// # 教案式说明
/// - **契约 (What)**：对每次调用返回不透明应答字节或 [`DispatchError`]；
///   实现必须可在多个任务间并发调用；
/// - **取消**：丢弃返回的 Future 即取消本次调用。
#[async_trait]
pub trait Blobject: Send + Sync + 'static {
    async fn invoke(&self, current: &Current, params: Bytes) -> Result<Bytes, DispatchError>;
}

/// 出站调用能力：把请求送往目的代理，并按代理的转发模式返回应答。
///
/// - 双向模式返回后端应答；单向与报文模式在请求发出后返回空字节。
#[async_trait]
pub trait Invoker: Send + Sync + 'static {
    async fn invoke(
        &self,
        target: &DestinationProxy,
        request: Request,
    ) -> Result<Bytes, DispatchError>;
}
