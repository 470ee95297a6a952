#![deny(unsafe_code)]
#![doc = "spark-core: 协议无关的 RPC 网关核心契约。"]
#![doc = ""]
#![doc = "== 契约总览 =="]
#![doc = "- [`Identity`]：`(category, name)` 路由键与访问控制单元；"]
#![doc = "- [`DestinationProxy`]：指向后端对象的不可变句柄，转发模式通过纯函数变换产生新值；"]
#![doc = "- [`Blobject`] / [`Invoker`]：入站与出站的类型擦除调用能力，负载始终是不透明字节；"]
#![doc = "- [`DispatchError`]：调用路径的错误分类，后端故障原样透传；"]
#![doc = "- [`Lifecycle`]：`Active → Destroyed` 单向生命周期闸门，销毁前排空在途调用。"]

pub use async_trait::async_trait;
pub use bytes::Bytes;

pub mod error;
pub mod identity;
pub mod invocation;
pub mod lifecycle;
pub mod proxy;

pub use error::{BackendFault, Destroyed, DispatchError};
pub use identity::{Identity, IdentityParseError};
pub use invocation::{Blobject, Context, Current, FORWARD_CONTEXT_KEY, Invoker, OperationMode, Request};
pub use lifecycle::{InFlight, Lifecycle, LifecycleState};
pub use proxy::{DestinationProxy, ForwardDirective, ForwardMode};
