//! Device-change listener registry
//!
//! Platforms push [`DeviceChangeEvent`]s on a broadcast channel. A
//! background forwarder hands each event to every registered callback and
//! to every stream subscriber. Delivery is fire-and-forget: the platform
//! never waits for listeners.

use crate::platform::{DeviceChangeEvent, DEVICE_CHANGE_CHANNEL_CAPACITY};
use parking_lot::RwLock;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Callback invoked on device-set changes
pub type DeviceChangeCallback = Arc<dyn Fn(&DeviceChangeEvent) + Send + Sync>;

/// Registration handle returned by [`DeviceChangeListeners::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

/// Registry of device-change callbacks
pub struct DeviceChangeListeners {
    next_id: AtomicU64,
    callbacks: RwLock<Vec<(ListenerHandle, DeviceChangeCallback)>>,
    fanout: broadcast::Sender<DeviceChangeEvent>,
}

impl fmt::Debug for DeviceChangeListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceChangeListeners")
            .field("callbacks", &self.len())
            .field("subscribers", &self.fanout.receiver_count())
            .finish()
    }
}

impl Default for DeviceChangeListeners {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceChangeListeners {
    /// Empty registry
    pub fn new() -> Self {
        let (fanout, _) = broadcast::channel(DEVICE_CHANGE_CHANNEL_CAPACITY);
        Self {
            next_id: AtomicU64::new(1),
            callbacks: RwLock::new(Vec::new()),
            fanout,
        }
    }

    /// Register a callback
    pub fn register<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&DeviceChangeEvent) + Send + Sync + 'static,
    {
        let handle = ListenerHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.callbacks.write().push((handle, Arc::new(callback)));
        debug!("📡 Registered device-change listener {:?}", handle);
        handle
    }

    /// Remove a callback; returns `false` if the handle was not registered
    pub fn unregister(&self, handle: ListenerHandle) -> bool {
        let mut callbacks = self.callbacks.write();
        let before = callbacks.len();
        callbacks.retain(|(h, _)| *h != handle);
        let removed = callbacks.len() != before;
        if removed {
            debug!("📡 Removed device-change listener {:?}", handle);
        }
        removed
    }

    /// Number of registered callbacks
    pub fn len(&self) -> usize {
        self.callbacks.read().len()
    }

    /// Check if no callback is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive events as a stream instead of a callback
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceChangeEvent> {
        self.fanout.subscribe()
    }

    /// Deliver one event, returning the number of callbacks invoked
    ///
    /// Callbacks run on a snapshot of the registry, so they may register or
    /// unregister listeners themselves. A panicking callback is logged and
    /// skipped; the remaining callbacks still run.
    pub fn dispatch(&self, event: &DeviceChangeEvent) -> usize {
        let snapshot: Vec<(ListenerHandle, DeviceChangeCallback)> = self
            .callbacks
            .read()
            .iter()
            .map(|(handle, callback)| (*handle, Arc::clone(callback)))
            .collect();
        debug!(
            "📡 Dispatching device change #{} to {} listener(s)",
            event.sequence,
            snapshot.len()
        );
        for (handle, callback) in &snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                warn!(
                    "⚠️ Device-change listener {:?} panicked on change #{}",
                    handle, event.sequence
                );
            }
        }
        let _ = self.fanout.send(event.clone());
        snapshot.len()
    }

    /// Forward platform notifications to this registry until the platform
    /// channel closes
    pub fn spawn_forwarder(
        self: &Arc<Self>,
        mut platform_events: broadcast::Receiver<DeviceChangeEvent>,
    ) -> JoinHandle<()> {
        let listeners = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match platform_events.recv().await {
                    Ok(event) => {
                        listeners.dispatch(&event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("⚠️ Skipped {} device-change notification(s)", skipped);
                    }
                    Err(RecvError::Closed) => {
                        debug!("📡 Platform device-change channel closed");
                        break;
                    }
                }
            }
        })
    }
}
