//! # 调用路径错误域
//!
//! ## 设计背景（Why）
//! - 网关只关心三类失败：目标不存在、组件已销毁、调用链下游失败；下游失败又分为传输层
//!   故障与后端业务故障两种。
//!
//! ## 契约说明（What）
//! - [`DispatchError::NotFound`]：访问控制拒绝或路由表未命中，携带调用方原始身份、facet、操作名；
//! - [`DispatchError::Destroyed`]：组件已进入 `Destroyed` 状态；
//! - [`DispatchError::Transport`] / [`DispatchError::Backend`]：由 `From` 转换得到，转发路径原样透传，
//!   不包装、不改写。

use std::sync::Arc;

use bytes::Bytes;
use spark_transport::TransportError;
use thiserror::Error;

use crate::{Current, Identity};

/// 单次调度失败的分类。
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// 目标对象不存在，或调用方无权访问其类别。
    #[error("object not found: identity `{identity}` facet `{facet}` operation `{operation}`")]
    NotFound {
        identity: Identity,
        facet: String,
        operation: String,
    },
    /// 组件已销毁，不再受理调用。
    #[error("{component} has been destroyed")]
    Destroyed { component: &'static str },
    /// 出站传输失败。
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// 后端执行失败。
    #[error(transparent)]
    Backend(#[from] BackendFault),
}

impl DispatchError {
    /// 以入站调用的原始坐标构造 `NotFound`。
    pub fn not_found(current: &Current) -> Self {
        DispatchError::NotFound {
            identity: current.identity().clone(),
            facet: current.facet().to_owned(),
            operation: current.operation().to_owned(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DispatchError::NotFound { .. })
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self, DispatchError::Destroyed { .. })
    }
}

/// 后端返回的业务故障，转发路径只搬运、不解释。
///
/// - `reason`：人类可读原因；
/// - `payload`：后端附带的不透明字节，网关不解析其内容。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("backend fault: {reason}")]
pub struct BackendFault {
    reason: Arc<str>,
    payload: Bytes,
}

impl BackendFault {
    pub fn new(reason: impl Into<Arc<str>>) -> Self {
        Self {
            reason: reason.into(),
            payload: Bytes::new(),
        }
    }

    pub fn with_payload(mut self, payload: Bytes) -> Self {
        self.payload = payload;
        self
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }
}

/// 组件已销毁，由 [`Lifecycle::enter`](crate::Lifecycle::enter) 等入口返回。
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("{component} has been destroyed")]
pub struct Destroyed {
    pub component: &'static str,
}

impl From<Destroyed> for DispatchError {
    fn from(value: Destroyed) -> Self {
        DispatchError::Destroyed {
            component: value.component,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_original_coordinates() {
        let current = Current::new(Identity::new("session", "x"), "greet").with_facet("admin");
        let err = DispatchError::not_found(&current);
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "object not found: identity `session/x` facet `admin` operation `greet`"
        );
    }

    #[test]
    fn backend_fault_converts_without_rewriting() {
        let fault = BackendFault::new("division by zero").with_payload(Bytes::from_static(b"\x01"));
        let err = DispatchError::from(fault.clone());
        match err {
            DispatchError::Backend(inner) => assert_eq!(inner, fault),
            other => panic!("意外的错误分类: {other:?}"),
        }
    }

    #[test]
    fn destroyed_maps_component_name() {
        let err = DispatchError::from(Destroyed { component: "forwarder" });
        assert!(err.is_destroyed());
        assert_eq!(err.to_string(), "forwarder has been destroyed");
    }
}
