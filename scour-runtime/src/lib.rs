//! Explicitly owned Tokio runtime with a shared cancellation token.
//!
//! The binary builds one [`ScourRuntime`], runs the scan with
//! [`ScourRuntime::block_on`], and shuts it down with a grace period. There is
//! no ambient global runtime.
use anyhow::Result;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct ScourHandle {
    inner: Handle,
    cancel: CancellationToken,
}

pub struct ScourRuntime {
    runtime: Runtime,
    cancel: CancellationToken,
}

impl ScourRuntime {
    /// Build a multi-threaded Tokio runtime.
    ///
    /// ```
    /// use scour_runtime::ScourRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = ScourRuntime::build("doctest-runtime", Some(1))
    ///     .expect("runtime builds");
    /// let value = runtime.block_on(async { 2 + 2 });
    /// assert_eq!(value, 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build(thread_name: &str, worker_threads: Option<usize>) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(thread_name);

        if let Some(workers) = worker_threads {
            builder.worker_threads(workers.max(1));
        }

        let runtime = builder.build()?;
        Ok(Self {
            runtime,
            cancel: CancellationToken::new(),
        })
    }

    /// Obtain a cloned handle for spawning tasks and sharing cancellation.
    pub fn handle(&self) -> ScourHandle {
        ScourHandle {
            inner: self.runtime.handle().clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Run a future to completion on the runtime.
    pub fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Cancel outstanding work and shut the runtime down gracefully.
    pub fn shutdown(self, graceful: Duration) {
        self.cancel.cancel();
        self.runtime.shutdown_timeout(graceful);
    }
}

impl ScourHandle {
    /// Spawn a future onto the shared runtime.
    pub fn spawn<F, T>(&self, fut: F) -> JoinHandle<T>
    where
        F: std::future::Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.inner.spawn(fut)
    }

    /// Clone the shared cancellation token.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the shared token on the first Ctrl-C.
    pub fn cancel_on_ctrl_c(&self) -> JoinHandle<()> {
        let cancel = self.cancel.clone();
        self.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                res = tokio::signal::ctrl_c() => {
                    if res.is_ok() {
                        tracing::warn!("interrupt received; no new fetches will be started");
                        cancel.cancel();
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_runs_on_runtime() {
        let runtime = ScourRuntime::build("spawn-test", Some(1)).unwrap();
        let handle = runtime.handle();
        let task = handle.spawn(async { 21 * 2 });
        let result = runtime.block_on(async move { task.await.unwrap() });
        assert_eq!(result, 42);
        runtime.shutdown(Duration::from_millis(10));
    }

    #[test]
    fn handles_share_one_token() {
        let runtime = ScourRuntime::build("cancel-test", Some(1)).unwrap();
        let a = runtime.handle().cancellation();
        let b = runtime.handle().cancellation();
        a.cancel();
        assert!(b.is_cancelled());
        runtime.shutdown(Duration::from_millis(5));
    }

    #[test]
    fn ctrl_c_watcher_exits_when_cancelled() {
        let runtime = ScourRuntime::build("ctrl-c-test", Some(1)).unwrap();
        let handle = runtime.handle();
        let watcher = handle.cancel_on_ctrl_c();
        handle.cancellation().cancel();
        runtime.block_on(async move { watcher.await.unwrap() });
        runtime.shutdown(Duration::from_millis(5));
    }
}
