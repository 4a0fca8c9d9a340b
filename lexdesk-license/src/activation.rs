//! Activation watcher.
//!
//! While the activation window is open the host polls for a license at a
//! fixed interval. The poll ends when the machine becomes licensed or when
//! the watcher is cancelled; dropping the watcher cancels it too, so no
//! background loop outlives the window.

use crate::access::AccessDecision;
use crate::service::LicenseService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// How a watcher finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// A license for this machine was found.
    Activated(AccessDecision),
    /// The watcher was cancelled before a license was found.
    Cancelled,
}

/// Handle to a running activation poll.
#[derive(Debug)]
pub struct ActivationWatcher {
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<WatchOutcome>>,
}

impl ActivationWatcher {
    /// Spawns a poll of `service.check_access()` every `interval`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(service: Arc<LicenseService>, interval: Duration) -> Self {
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    // Fires on an explicit cancel and when the sender is dropped.
                    _ = &mut cancel_rx => {
                        debug!("Activation watcher cancelled");
                        return WatchOutcome::Cancelled;
                    }
                    _ = ticker.tick() => {
                        match service.check_access().await {
                            Ok(AccessDecision::Licensed) => {
                                info!("Activation detected");
                                return WatchOutcome::Activated(AccessDecision::Licensed);
                            }
                            Ok(_) => {}
                            Err(e) => warn!("Activation check failed: {}", e),
                        }
                    }
                }
            }
        });

        Self {
            cancel: Some(cancel_tx),
            task: Some(task),
        }
    }

    /// Waits for the watcher to finish.
    pub async fn wait(mut self) -> WatchOutcome {
        let Some(task) = self.task.take() else {
            return WatchOutcome::Cancelled;
        };
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Activation watcher task failed: {}", e);
                WatchOutcome::Cancelled
            }
        }
    }

    /// Stops the watcher and waits for the loop to exit.
    ///
    /// Returns `Activated` if a license was found before the cancel landed.
    pub async fn cancel(mut self) -> WatchOutcome {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
        self.wait().await
    }

    /// Returns true once the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for ActivationWatcher {
    fn drop(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }
}
