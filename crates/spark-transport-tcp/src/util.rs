use std::future::Future;
use std::io;
use std::time::Duration;

/// 一次受限 IO 操作的结局。
#[derive(Debug)]
pub(crate) enum Bounded<T> {
    Completed(io::Result<T>),
    TimedOut,
    Cancelled,
}

/// 让 IO Future 与配置的超时、调用方取消信号竞速。
///
/// 轮询顺序固定为“取消 → IO → 超时”：取消优先生效，零超时也至少给 IO 一次推进机会。
pub(crate) async fn run_bounded<F, C, T>(timeout: Duration, cancelled: C, future: F) -> Bounded<T>
where
    F: Future<Output = io::Result<T>>,
    C: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = cancelled => Bounded::Cancelled,
        result = future => Bounded::Completed(result),
        _ = tokio::time::sleep(timeout) => Bounded::TimedOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future;

    #[tokio::test]
    async fn pending_io_times_out() {
        let outcome = run_bounded(
            Duration::from_millis(10),
            future::pending::<()>(),
            future::pending::<io::Result<()>>(),
        )
        .await;
        assert!(matches!(outcome, Bounded::TimedOut));
    }

    #[tokio::test]
    async fn cancellation_wins_over_ready_io() {
        let outcome = run_bounded(
            Duration::from_secs(5),
            future::ready(()),
            future::ready(Ok::<_, io::Error>(7)),
        )
        .await;
        assert!(matches!(outcome, Bounded::Cancelled));
    }

    #[tokio::test]
    async fn completed_io_is_returned() {
        let outcome = run_bounded(
            Duration::ZERO,
            future::pending::<()>(),
            future::ready(Ok::<_, io::Error>(7)),
        )
        .await;
        assert!(matches!(outcome, Bounded::Completed(Ok(7))));
    }
}
