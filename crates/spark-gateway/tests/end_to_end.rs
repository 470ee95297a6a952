//! 进程内完整链路：会话路由器创建会话并登记代理，转发器把客户端调用送到会话仆从。

use std::sync::Arc;

use bytes::Bytes;
use spark_core::{
    BackendFault, Blobject, Current, DispatchError, Identity, Invoker, async_trait,
};
use spark_gateway::{
    BlobForwarder, GatewayConfig, LocalSessionManager, ObjectAdapter, Session, SessionManager,
    SessionRouter,
};
use spark_router::{DefaultRoutingTable, RoutingTable};

/// 会话仆从：对 `hello` 回应问候，其他操作返回后端故障。
struct HelloSession {
    user_id: String,
}

#[async_trait]
impl Blobject for HelloSession {
    async fn invoke(&self, current: &Current, params: Bytes) -> Result<Bytes, DispatchError> {
        match current.operation() {
            "hello" => Ok(Bytes::from(format!("Hello {}", self.user_id))),
            "echo" => Ok(params),
            other => {
                let fault = BackendFault::new(format!("operation `{other}` not supported"))
                    .with_payload(Bytes::from_static(b"\x01"));
                Err(fault.into())
            }
        }
    }
}

struct Gateway {
    adapter: Arc<ObjectAdapter>,
    manager: LocalSessionManager,
    router: SessionRouter,
    forwarder: BlobForwarder,
}

fn gateway(config: &GatewayConfig) -> Gateway {
    let adapter = Arc::new(ObjectAdapter::new("sessions"));
    let manager = LocalSessionManager::new(
        Arc::clone(&adapter),
        |user_id: &str, _: &Identity| -> Arc<dyn Blobject> {
            Arc::new(HelloSession {
                user_id: user_id.to_owned(),
            })
        },
    );
    let table: Arc<dyn RoutingTable> = Arc::new(DefaultRoutingTable::new());

    let router = SessionRouter::from_config(
        config,
        Arc::new(ObjectAdapter::new("client")),
        Arc::clone(&table),
    )
    .with_session_manager(Arc::new(manager.clone()) as Arc<dyn SessionManager>);
    let forwarder = BlobForwarder::from_config(
        config,
        table,
        Arc::clone(&adapter) as Arc<dyn Invoker>,
    );

    Gateway {
        adapter,
        manager,
        router,
        forwarder,
    }
}

fn config() -> GatewayConfig {
    GatewayConfig::from_toml_str(
        r#"
        [router]
        allow_categories = "alice"
        user_id = "alice"
        "#,
    )
    .expect("合法配置")
}

#[tokio::test]
async fn session_calls_flow_through_the_forwarder() {
    let gw = gateway(&config());
    let session = gw.router.create_session().await.expect("已配置会话管理器");
    gw.router
        .add_proxy(gw.adapter.create_proxy(session.identity().clone()))
        .expect("路由器处于 Active");

    let hello = Current::new(session.identity().clone(), "hello");
    let reply = gw.forwarder.invoke(&hello, Bytes::new()).await.expect("已路由");
    assert_eq!(reply, Bytes::from_static(b"Hello alice"));

    let echo = Current::new(session.identity().clone(), "echo");
    let reply = gw
        .forwarder
        .invoke(&echo, Bytes::from_static(b"\x00\x01\x02"))
        .await
        .expect("已路由");
    assert_eq!(reply, Bytes::from_static(b"\x00\x01\x02"));

    let one_way = Current::new(session.identity().clone(), "hello").with_context_entry("_fwd", "o");
    let reply = gw.forwarder.invoke(&one_way, Bytes::new()).await.expect("已路由");
    assert!(reply.is_empty(), "单向调用不回传应答");

    let fault = gw
        .forwarder
        .invoke(&Current::new(session.identity().clone(), "explode"), Bytes::new())
        .await
        .expect_err("后端故障");
    match fault {
        DispatchError::Backend(fault) => {
            assert_eq!(fault.reason(), "operation `explode` not supported");
            assert_eq!(fault.payload(), &Bytes::from_static(b"\x01"));
        }
        other => panic!("故障被改写: {other:?}"),
    }
}

#[tokio::test]
async fn foreign_category_is_rejected_even_when_routed() {
    let gw = gateway(&config());
    let intruder = gw.manager.create("mallory").await.expect("直接通过管理器创建");
    gw.router
        .add_proxy(gw.adapter.create_proxy(intruder.identity().clone()))
        .expect("路由器处于 Active");

    let err = gw
        .forwarder
        .invoke(&Current::new(intruder.identity().clone(), "hello"), Bytes::new())
        .await
        .expect_err("类别不在白名单");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn destroyed_session_is_no_longer_reachable() {
    let gw = gateway(&config());
    let session = gw.router.create_session().await.expect("已配置会话管理器");
    gw.router
        .add_proxy(gw.adapter.create_proxy(session.identity().clone()))
        .expect("路由器处于 Active");

    session.destroy().await.expect("会话自行销毁");
    assert_eq!(gw.manager.active_sessions(), 0);

    let err = gw
        .forwarder
        .invoke(&Current::new(session.identity().clone(), "hello"), Bytes::new())
        .await
        .expect_err("仆从已注销");
    assert!(err.is_not_found());

    let summary = gw.router.destroy().await.expect("首次销毁");
    assert_eq!(summary.destroyed, 1, "会话销毁幂等，路由器拆除时不报错");
    assert!(summary.failures.is_empty());
}

#[tokio::test]
async fn teardown_unregisters_all_sessions() {
    let gw = gateway(&config());
    for _ in 0..3 {
        gw.router.create_session().await.expect("已配置会话管理器");
    }
    assert_eq!(gw.manager.active_sessions(), 3);

    let summary = gw.router.destroy().await.expect("首次销毁");
    assert_eq!(summary.destroyed, 3);
    assert_eq!(gw.manager.active_sessions(), 0);

    gw.forwarder.destroy().await.expect("首次销毁");
    assert!(
        gw.forwarder
            .invoke(&Current::new(Identity::new("alice", "session-1"), "hello"), Bytes::new())
            .await
            .expect_err("转发器已销毁")
            .is_destroyed()
    );
}
