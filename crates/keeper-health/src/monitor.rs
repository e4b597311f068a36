//! Health monitor — one background probe task per registration.
//!
//! Each task sleeps for the registration's interval, probes once, runs the
//! outcome through a [`StatusMachine`] and, when the status changes, hands
//! the new status to the status callback (the registry's update path).
//!
//! Cancellation is cooperative. The shutdown signal is observed during the
//! sleep and right after a probe returns; a probe already in flight is never
//! interrupted. [`HealthMonitor::stop_monitor`] waits for the task to exit,
//! so once it returns no further status update can be issued for that task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use keeper_state::Status;

use crate::prober::{BoxFuture, ProbeTarget, Prober};
use crate::status::StatusMachine;

/// A status change computed by a probe task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub service_id: String,
    /// Generation of the registration the task was started for.
    pub generation: u64,
    pub status: Status,
}

/// What the callback did with a [`StatusUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Persisted and published.
    Applied,
    /// Not persisted; the task retries on its next cycle.
    Rejected,
    /// The registration is halted or gone; the task must exit.
    Halted,
}

/// Callback invoked when a registration's probed status changes.
pub type StatusCallback = Arc<dyn Fn(StatusUpdate) -> BoxFuture<'static, UpdateOutcome> + Send + Sync>;

/// Parameters for one probe task.
#[derive(Debug, Clone)]
pub struct MonitorSpec {
    pub generation: u64,
    pub interval: Duration,
    pub target: ProbeTarget,
}

/// Per-registration monitor state.
struct MonitorSlot {
    generation: u64,
    /// Handle to the background check task.
    handle: JoinHandle<()>,
    /// Shutdown signal for this monitor.
    shutdown_tx: watch::Sender<bool>,
}

impl MonitorSlot {
    /// Signal the task and wait until it has exited.
    async fn shutdown(self, service_id: &str) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            error!(%service_id, error = %e, "health task ended abnormally");
        }
    }
}

/// Manages probe tasks for all live registrations.
pub struct HealthMonitor {
    prober: Arc<dyn Prober>,
    /// Active monitors: service_id → slot.
    monitors: Arc<RwLock<HashMap<String, MonitorSlot>>>,
    on_status_change: StatusCallback,
}

impl HealthMonitor {
    /// Create a new health monitor.
    pub fn new(prober: Arc<dyn Prober>, on_status_change: StatusCallback) -> Self {
        Self {
            prober,
            monitors: Arc::new(RwLock::new(HashMap::new())),
            on_status_change,
        }
    }

    /// Start probing a registration.
    ///
    /// A monitor already running for the same service id is stopped, and
    /// its exit awaited, before the new one is spawned.
    pub async fn start_monitor(&self, spec: MonitorSpec) {
        let service_id = spec.target.service_id.clone();

        let previous = self.monitors.write().await.remove(&service_id);
        if let Some(old) = previous {
            warn!(%service_id, generation = old.generation, "replacing running health monitor");
            old.shutdown(&service_id).await;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let prober = self.prober.clone();
        let callback = self.on_status_change.clone();
        let generation = spec.generation;
        let interval = spec.interval;

        let handle = tokio::spawn(async move {
            run_health_loop(spec, prober, callback, shutdown_rx).await;
        });

        self.monitors.write().await.insert(
            service_id.clone(),
            MonitorSlot {
                generation,
                handle,
                shutdown_tx,
            },
        );

        info!(%service_id, generation, ?interval, "health monitor started");
    }

    /// Stop probing a registration and wait for the task to acknowledge.
    ///
    /// Returns `false` if no monitor was running for the id.
    pub async fn stop_monitor(&self, service_id: &str) -> bool {
        let slot = self.monitors.write().await.remove(service_id);
        match slot {
            Some(slot) => {
                slot.shutdown(service_id).await;
                info!(%service_id, "health monitor stopped");
                true
            }
            None => false,
        }
    }

    /// Stop all monitors (for graceful shutdown).
    pub async fn stop_all(&self) {
        let slots: Vec<(String, MonitorSlot)> = self.monitors.write().await.drain().collect();
        for (id, slot) in slots {
            slot.shutdown(&id).await;
            debug!(service_id = %id, "health monitor stopped");
        }
        info!("all health monitors stopped");
    }

    /// List service ids with active monitors.
    pub async fn active_monitors(&self) -> Vec<String> {
        let monitors = self.monitors.read().await;
        monitors.keys().cloned().collect()
    }

    /// Check if a service id has an active monitor.
    pub async fn is_monitoring(&self, service_id: &str) -> bool {
        let monitors = self.monitors.read().await;
        monitors.contains_key(service_id)
    }

    /// Generation of the running monitor for a service id.
    pub async fn monitor_generation(&self, service_id: &str) -> Option<u64> {
        let monitors = self.monitors.read().await;
        monitors.get(service_id).map(|slot| slot.generation)
    }
}

/// The probe loop for a single registration.
async fn run_health_loop(
    spec: MonitorSpec,
    prober: Arc<dyn Prober>,
    callback: StatusCallback,
    mut shutdown: watch::Receiver<bool>,
) {
    let service_id = spec.target.service_id.clone();
    let mut machine = StatusMachine::new();
    // Status last accepted by the registry.
    let mut published = Status::Unknown;

    debug!(%service_id, generation = spec.generation, "health loop starting");

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                debug!(%service_id, "health loop shutting down");
                break;
            }
            _ = tokio::time::sleep(spec.interval) => {}
        }

        let result = prober.probe(&spec.target).await;

        if *shutdown.borrow() {
            debug!(%service_id, ?result, "probe result dropped after shutdown");
            break;
        }

        let next = machine.record(result);
        if next == published {
            continue;
        }

        let update = StatusUpdate {
            service_id: service_id.clone(),
            generation: spec.generation,
            status: next,
        };
        match callback(update).await {
            UpdateOutcome::Applied => published = next,
            UpdateOutcome::Rejected => {
                debug!(%service_id, status = %next, "status update rejected, retrying next cycle");
            }
            UpdateOutcome::Halted => {
                machine.halt();
                debug!(%service_id, "registration halted, health loop exiting");
                break;
            }
        }
    }
}
