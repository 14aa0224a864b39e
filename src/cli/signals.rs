//! Shutdown signal handling

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::debug;

/// Ctrl+C (and SIGTERM on Unix) as an awaitable stop request
pub struct ShutdownSignal {
    shutdown: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownSignal {
    /// Create a new shutdown signal handler
    pub fn new() -> Self {
        Self {
            shutdown: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Request shutdown, as if the signal had arrived
    pub fn trigger(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Wait until shutdown is requested. Returns at once if it already was.
    pub async fn wait(&self) {
        while !self.is_shutdown() {
            self.notify.notified().await;
        }
    }

    /// Setup signal handlers
    pub fn setup(&self) -> Result<(), std::io::Error> {
        let received = listen()?;
        let shutdown = Arc::clone(&self.shutdown);
        let notify = Arc::clone(&self.notify);
        tokio::spawn(async move {
            received.await;
            shutdown.store(true, Ordering::SeqCst);
            notify.notify_one();
        });
        Ok(())
    }
}

#[cfg(unix)]
fn listen() -> Result<impl Future<Output = ()>, std::io::Error> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => debug!("received interrupt"),
            _ = sigterm.recv() => debug!("received SIGTERM"),
        }
    })
}

#[cfg(not(unix))]
fn listen() -> Result<impl Future<Output = ()>, std::io::Error> {
    Ok(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("received interrupt");
        }
    })
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn shutdown_signal_default_is_false() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_shutdown());
    }

    #[tokio::test]
    async fn wait_returns_after_trigger() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .expect("wait should return once triggered");
        assert!(signal.is_shutdown());
    }

    #[tokio::test]
    async fn wait_blocks_until_triggered() {
        let signal = ShutdownSignal::new();
        let pending = tokio::time::timeout(Duration::from_millis(50), signal.wait()).await;
        assert!(pending.is_err());
    }
}
