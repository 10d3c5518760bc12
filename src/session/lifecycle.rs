//! Host application foreground/background signal.
//!
//! The host owns a [`LifecycleHub`] and publishes [`AppLifecycle`] transitions on it.
//! Each session holds a [`LifecycleSubscription`] from creation until dispose; dropping
//! the subscription unregisters it.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

/// Default number of undelivered events kept per subscriber.
pub const DEFAULT_LIFECYCLE_CAPACITY: usize = 16;

/// Host application lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppLifecycle {
    /// Visible and receiving input again
    Resumed,
    /// Visible but not focused, e.g. during a system dialog
    Inactive,
    /// In the background
    Paused,
    /// Host view torn down
    Detached,
}

impl AppLifecycle {
    /// Whether the camera should be released on this transition.
    pub fn suspends(self) -> bool {
        matches!(self, AppLifecycle::Inactive | AppLifecycle::Paused)
    }
}

/// Publisher side of the lifecycle signal.
#[derive(Debug, Clone)]
pub struct LifecycleHub {
    tx: broadcast::Sender<AppLifecycle>,
}

impl Default for LifecycleHub {
    fn default() -> Self {
        Self::new(DEFAULT_LIFECYCLE_CAPACITY)
    }
}

impl LifecycleHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish a transition. Returns how many subscribers will see it.
    pub fn notify(&self, event: AppLifecycle) -> usize {
        log::debug!("App lifecycle: {:?}", event);
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> LifecycleSubscription {
        LifecycleSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Receiving side held by a session.
#[derive(Debug)]
pub struct LifecycleSubscription {
    rx: broadcast::Receiver<AppLifecycle>,
}

impl LifecycleSubscription {
    /// Next pending transition, without waiting.
    ///
    /// If the subscriber fell behind, the overwritten events are skipped and the oldest
    /// retained one is returned.
    pub fn try_next(&mut self) -> Option<AppLifecycle> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    log::warn!("Lifecycle subscriber lagged, skipped {} events", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the next transition. Returns `None` once the hub is gone.
    pub async fn next(&mut self) -> Option<AppLifecycle> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("Lifecycle subscriber lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
