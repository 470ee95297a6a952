use std::sync::Arc;

use spark_core::{DestinationProxy, ForwardMode, Identity};
use spark_router::{DefaultRoutingTable, RoutingTable};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn read_after_write_holds_under_concurrent_adds() {
    let table = Arc::new(DefaultRoutingTable::new());
    let mut writers = Vec::new();

    for worker in 0..8 {
        let table = Arc::clone(&table);
        writers.push(tokio::spawn(async move {
            for round in 0..50 {
                let proxy = DestinationProxy::new(Identity::new(
                    format!("worker-{worker}"),
                    format!("object-{round}"),
                ))
                .with_mode(if round % 2 == 0 {
                    ForwardMode::OneWay
                } else {
                    ForwardMode::TwoWay
                });
                table.add(proxy.clone());
                assert_eq!(table.get(proxy.identity()), Some(proxy));
                tokio::task::yield_now().await;
            }
        }));
    }

    for writer in writers {
        writer.await.expect("写入任务不应 panic");
    }
    assert_eq!(table.len(), 8 * 50);
    assert_eq!(table.revision(), 8 * 50);
}

#[test]
fn remove_of_unknown_identity_does_not_bump_revision() {
    let table = DefaultRoutingTable::new();
    table.add(DestinationProxy::new(Identity::new("c", "kept")));
    assert_eq!(table.remove(&Identity::new("c", "missing")), None);
    assert_eq!(table.revision(), 1);
    assert!(table.get(&Identity::new("c", "kept")).is_some());
}
