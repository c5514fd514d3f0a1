//! Context propagation across await points.
//!
//! A task's layers must follow the task, not the worker thread: the thread
//! that resumes a future after suspension may differ from the one that
//! started polling it. The wrapper below parks the task's layers between
//! polls and re-installs them on whichever thread polls next.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use pin_project::pin_project;

use crate::context::store::{self, Layer, LogContext};

/// Future wrapper that keeps a set of context layers visible to the inner
/// future for the duration of every poll.
#[pin_project]
pub struct ContextFuture<F> {
    #[pin]
    inner: F,
    /// Layers owned by this task while it is suspended.
    parked: Option<Vec<Layer>>,
}

/// Re-parks the layers a poll installed on every exit path. Without this a
/// panic in the inner future would unwind past the detach and strand the
/// task's layers on the worker thread, where unrelated tasks would see
/// them.
struct ParkOnExit<'a> {
    base: usize,
    parked: &'a mut Option<Vec<Layer>>,
}

impl Drop for ParkOnExit<'_> {
    fn drop(&mut self) {
        *self.parked = Some(store::detach_layers(self.base));
    }
}

impl<F> Future for ContextFuture<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        let layers = this.parked.take().unwrap_or_default();
        let base = store::install_layers(layers);
        // Layers pushed by guards still open inside the task travel with
        // it; anything above `base` belongs to this task, not the thread.
        let _park = ParkOnExit {
            base,
            parked: this.parked,
        };

        this.inner.poll(cx)
    }
}

/// Extension trait attaching a [`LogContext`] to a future.
///
/// ```
/// use ctxlog::{FutureExt, LogContext};
///
/// async fn handle() {
///     log::info!("visible with trace_id bound");
/// }
///
/// # async fn demo() {
/// handle()
///     .in_log_context(LogContext::new().with_value("trace_id", "abc123"))
///     .await;
/// # }
/// ```
pub trait FutureExt: Future + Sized {
    fn in_log_context(self, context: LogContext) -> ContextFuture<Self>;
}

impl<F> FutureExt for F
where
    F: Future,
{
    fn in_log_context(self, context: LogContext) -> ContextFuture<Self> {
        ContextFuture {
            inner: self,
            parked: Some(vec![context.into_layer()]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::store::{current_context, current_value};
    use crate::value::ContextValue;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn bindings_survive_suspension() {
        let seen = async {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            current_value("task_key")
        }
        .in_log_context(LogContext::new().with_value("task_key", "v"))
        .await;

        assert_eq!(seen, Some(ContextValue::from("v")));
        assert_eq!(current_value("task_key"), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tasks_stay_isolated() {
        async fn probe(expected: i64) -> bool {
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            current_value("unit") == Some(ContextValue::Int(expected))
        }

        let a = tokio::spawn(probe(1).in_log_context(LogContext::new().with_value("unit", 1i64)));
        let b = tokio::spawn(probe(2).in_log_context(LogContext::new().with_value("unit", 2i64)));

        assert!(a.await.unwrap());
        assert!(b.await.unwrap());
    }

    #[test]
    fn panicking_poll_restores_the_thread_stack() {
        use std::task::{Context, Waker};

        let result = std::panic::catch_unwind(|| {
            let mut cx = Context::from_waker(Waker::noop());
            let mut fut = std::pin::pin!(async { panic!("boom") }
                .in_log_context(LogContext::new().with_value("leaky", 1)));
            let _ = fut.as_mut().poll(&mut cx);
        });

        assert!(result.is_err());
        assert_eq!(current_value("leaky"), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn inner_guards_held_across_awaits_follow_the_task() {
        let ctx = async {
            let _inner = LogContext::new().with_value("inner", "yes").enter();
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            current_context()
        }
        .in_log_context(LogContext::new().with_value("outer", "yes"))
        .await;

        assert_eq!(ctx.get("outer"), Some(&ContextValue::from("yes")));
        assert_eq!(ctx.get("inner"), Some(&ContextValue::from("yes")));
    }
}
