#![deny(unsafe_code)]
#![doc = "spark-router: 身份 → 目的代理的路由表。"]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use spark_core::{DestinationProxy, Identity};

/// 路由表契约：身份到目的代理的映射。
///
/// # 教案式说明
/// - **契约 (What)**：
///   - `get`：返回身份当前映射的代理快照，缺失返回 `None`；
///   - `add`：以代理自身的身份为键整条替换，返回被替换的旧代理；
///   - `remove`：删除映射并返回旧值；
/// - **一致性**：任何读者要么看到完整的旧条目，要么看到完整的新条目，不存在部分写入；
///   同一任务内 `add` 之后立即 `get` 必然看到刚写入的值；
/// - **线程安全**：实现必须允许多读多写并发。
pub trait RoutingTable: Send + Sync + 'static {
    fn get(&self, identity: &Identity) -> Option<DestinationProxy>;

    fn add(&self, proxy: DestinationProxy) -> Option<DestinationProxy>;

    fn remove(&self, identity: &Identity) -> Option<DestinationProxy>;
}

/// 基于 `ArcSwap` 写时复制的默认路由表。
///
/// # 设计动机（Why）
/// - 转发器每次调用都要查表，而增删只发生在会话建立/销毁时，读远多于写；
/// - 读路径只做一次 `load`，不获取任何锁。
///
/// # 行为概览（How）
/// 1. 整张表以 `Arc<HashMap>` 形式由 [`ArcSwap`] 持有；
/// 2. 写操作通过 `rcu` 克隆当前表、修改后整表替换，与并发写者冲突时自动重试闭包；
/// 3. 每次成功写入递增修订号，便于诊断。
///
/// # 风险提示（Trade-offs）
/// - 单次写入的代价与表大小成正比，适合会话级别的低频更新。
pub struct DefaultRoutingTable {
    entries: ArcSwap<HashMap<Identity, DestinationProxy>>,
    revision: AtomicU64,
}

impl DefaultRoutingTable {
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(HashMap::new()),
            revision: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }

    /// 已成功提交的写操作次数。
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// 当前表中全部身份的快照，顺序不保证。
    pub fn identities(&self) -> Vec<Identity> {
        self.entries.load().keys().cloned().collect()
    }
}

impl Default for DefaultRoutingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutingTable for DefaultRoutingTable {
    fn get(&self, identity: &Identity) -> Option<DestinationProxy> {
        self.entries.load().get(identity).cloned()
    }

    fn add(&self, proxy: DestinationProxy) -> Option<DestinationProxy> {
        let identity = proxy.identity().clone();
        let previous = self.entries.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(identity.clone(), proxy.clone());
            next
        });
        self.revision.fetch_add(1, Ordering::AcqRel);
        previous.get(&identity).cloned()
    }

    fn remove(&self, identity: &Identity) -> Option<DestinationProxy> {
        let previous = self.entries.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.remove(identity);
            next
        });
        let removed = previous.get(identity).cloned();
        if removed.is_some() {
            self.revision.fetch_add(1, Ordering::AcqRel);
        }
        removed
    }
}

impl<T> RoutingTable for Arc<T>
where
    T: RoutingTable + ?Sized,
{
    fn get(&self, identity: &Identity) -> Option<DestinationProxy> {
        (**self).get(identity)
    }

    fn add(&self, proxy: DestinationProxy) -> Option<DestinationProxy> {
        (**self).add(proxy)
    }

    fn remove(&self, identity: &Identity) -> Option<DestinationProxy> {
        (**self).remove(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_core::ForwardMode;

    fn proxy(category: &str, name: &str) -> DestinationProxy {
        DestinationProxy::new(Identity::new(category, name))
    }

    #[test]
    fn add_replaces_wholesale_and_returns_previous() {
        let table = DefaultRoutingTable::new();
        assert!(table.add(proxy("s", "a")).is_none());

        let replacement = proxy("s", "a").with_mode(ForwardMode::OneWay).with_facet("admin");
        let previous = table.add(replacement.clone()).expect("存在旧条目");
        assert_eq!(previous, proxy("s", "a"));
        assert_eq!(table.get(&Identity::new("s", "a")), Some(replacement));
        assert_eq!(table.len(), 1);
        assert_eq!(table.revision(), 2);
    }

    #[test]
    fn remove_returns_entry_once() {
        let table = DefaultRoutingTable::new();
        table.add(proxy("s", "a"));
        let identity = Identity::new("s", "a");
        assert_eq!(table.remove(&identity), Some(proxy("s", "a")));
        assert_eq!(table.remove(&identity), None);
        assert!(table.is_empty());
        assert_eq!(table.revision(), 2);
    }

    #[test]
    fn shared_handle_forwards_to_inner_table() {
        let table = Arc::new(DefaultRoutingTable::new());
        let dynamic: Arc<dyn RoutingTable> = Arc::clone(&table) as Arc<dyn RoutingTable>;
        dynamic.add(proxy("c", "n"));
        assert_eq!(table.identities(), vec![Identity::new("c", "n")]);
    }
}
