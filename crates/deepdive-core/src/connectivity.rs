//! Backend reachability probing.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::Backend;

pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    #[default]
    Checking,
    Online,
    Offline,
}

impl Connectivity {
    pub fn label(&self) -> &'static str {
        match self {
            Connectivity::Checking => "Checking...",
            Connectivity::Online => "Online",
            Connectivity::Offline => "Offline",
        }
    }
}

/// Probe the backend once, reporting `Checking` before the request goes out
/// and the result after it settles.
pub async fn check_connection<B, F>(backend: &B, report: &F) -> Connectivity
where
    B: Backend + ?Sized,
    F: Fn(Connectivity) + ?Sized,
{
    report(Connectivity::Checking);

    let state = match backend.probe().await {
        Ok(()) => Connectivity::Online,
        Err(e) => {
            debug!("probe failed: {}", e);
            Connectivity::Offline
        }
    };

    report(state);
    state
}

/// Repeating probe task: one check right away, then one per interval.
pub struct Prober {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Prober {
    pub fn start<F>(backend: Arc<dyn Backend>, interval: Duration, report: F) -> Self
    where
        F: Fn(Connectivity) + Send + Sync + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut last = None;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let state = tokio::select! {
                    _ = token.cancelled() => break,
                    state = check_connection(backend.as_ref(), &report) => state,
                };

                if last != Some(state) {
                    info!("backend is {}", state.label());
                    last = Some(state);
                }
            }

            debug!("prober stopped");
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the task and wait for it to wind down
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Prober {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
