//! # 生命周期闸门
//!
//! ## 设计背景（Why）
//! - 转发器与会话路由器都遵循 `Active → Destroyed` 单向状态机，销毁必须先拒绝新调用、
//!   再等待在途调用自然结束，之后才能释放共享引用。
//!
//! ## 逻辑解析（How）
//! - `destroyed` 与 `in_flight` 两个原子量均使用 `SeqCst`：入场先递增计数再检查标志，
//!   销毁先置位标志再检查计数，两侧至少有一方能观察到对方的写入；
//! - 计数归零且已置位时通过 `tokio::sync::Notify::notify_waiters` 唤醒等待排空的任务。
//!
//! ## 契约说明（What）
//! - [`Lifecycle::enter`] 在销毁后返回 [`Destroyed`]，否则返回 RAII 守卫 [`InFlight`]；
//! - [`Lifecycle::begin_destroy`] 仅第一次调用成功；
//! - [`Lifecycle::drained`] 在全部守卫释放后完成。在持有守卫的任务中等待排空会永久挂起。

use std::pin::pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Notify;

use crate::Destroyed;

/// 生命周期的两个状态。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Active,
    Destroyed,
}

/// `Active → Destroyed` 单向闸门，附带在途调用计数。
#[derive(Debug)]
pub struct Lifecycle {
    component: &'static str,
    destroyed: AtomicBool,
    in_flight: AtomicUsize,
    idle: Notify,
}

impl Lifecycle {
    /// `component` 会出现在 [`Destroyed`] 错误文本中。
    pub fn new(component: &'static str) -> Self {
        Self {
            component,
            destroyed: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
            idle: Notify::new(),
        }
    }

    pub fn component(&self) -> &'static str {
        self.component
    }

    pub fn state(&self) -> LifecycleState {
        if self.destroyed.load(Ordering::SeqCst) {
            LifecycleState::Destroyed
        } else {
            LifecycleState::Active
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.state() == LifecycleState::Destroyed
    }

    /// 当前在途调用数量。
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 登记一次在途调用。
    pub fn enter(&self) -> Result<InFlight<'_>, Destroyed> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlight { lifecycle: self };
        if self.destroyed.load(Ordering::SeqCst) {
            drop(guard);
            return Err(self.destroyed_error());
        }
        Ok(guard)
    }

    /// 切换到 `Destroyed`；重复调用返回 [`Destroyed`]。
    pub fn begin_destroy(&self) -> Result<(), Destroyed> {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return Err(self.destroyed_error());
        }
        Ok(())
    }

    /// 等待所有在途调用结束。
    pub async fn drained(&self) {
        loop {
            let mut notified = pin!(self.idle.notified());
            notified.as_mut().enable();
            if self.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    fn destroyed_error(&self) -> Destroyed {
        Destroyed {
            component: self.component,
        }
    }

    fn leave(&self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if previous == 1 && self.destroyed.load(Ordering::SeqCst) {
            self.idle.notify_waiters();
        }
    }
}

/// 在途调用守卫，释放时递减计数。
#[derive(Debug)]
#[must_use = "守卫释放即视为调用结束"]
pub struct InFlight<'a> {
    lifecycle: &'a Lifecycle,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.lifecycle.leave();
    }
}
