//! Registry — the authoritative table of registered service instances.
//!
//! The `Registry`:
//! - Validates descriptors before touching any state
//! - Writes every change to the store before committing it in memory
//! - Owns one health task per live registration (start on register,
//!   cancel-and-await on update or deregister)
//! - Applies probed status changes through a single update path
//!
//! Mutating operations are serialised by a table-wide operation lock that
//! covers the store write, the table change and task start/cancel. Health
//! tasks never take that lock; they only take the table lock briefly, so a
//! mutation can wait for a task to exit without deadlocking against it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use keeper_core::KeeperConfig;
use keeper_health::{
    BoxFuture, HealthMonitor, MonitorSpec, ProbeTarget, Prober, StatusCallback, StatusUpdate,
    UpdateOutcome,
};
use keeper_state::*;

use crate::error::{RegistryError, RegistryResult};
use crate::validate::{require_service_id, validate_descriptor};

/// Tunables taken from configuration.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// Shortest accepted health check interval.
    pub min_interval: Duration,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
        }
    }
}

impl RegistrySettings {
    pub fn from_config(config: &KeeperConfig) -> anyhow::Result<Self> {
        Ok(Self {
            min_interval: config.health.min_interval()?,
        })
    }
}

/// One table row: the registration plus the generation of its health task.
#[derive(Debug, Clone)]
struct Entry {
    registration: Registration,
    generation: u64,
}

type Table = Arc<RwLock<HashMap<ServiceId, Entry>>>;

/// The registry manages registrations and their health tasks.
pub struct Registry {
    table: Table,
    store: Arc<dyn RegistrationStore>,
    monitor: HealthMonitor,
    /// Serialises Register / UpdateRegister / Deregister / restore.
    ops: Mutex<()>,
    next_generation: AtomicU64,
    settings: RegistrySettings,
}

impl Registry {
    /// Create an empty registry. Call [`Registry::restore`] to load
    /// previously persisted registrations.
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        prober: Arc<dyn Prober>,
        settings: RegistrySettings,
    ) -> Self {
        let table: Table = Arc::new(RwLock::new(HashMap::new()));
        let callback = status_callback(table.clone(), store.clone());
        Self {
            table,
            store,
            monitor: HealthMonitor::new(prober, callback),
            ops: Mutex::new(()),
            next_generation: AtomicU64::new(1),
            settings,
        }
    }

    // ── Public operations ──────────────────────────────────────────

    /// Register a new service instance with status `Unknown` and start
    /// probing it.
    pub async fn register(&self, descriptor: ServiceDescriptor) -> RegistryResult<Registration> {
        let interval = validate_descriptor(&descriptor, self.settings.min_interval)?;
        let _ops = self.ops.lock().await;

        if self.table.read().await.contains_key(&descriptor.service_id) {
            return Err(RegistryError::DuplicateName(descriptor.service_id));
        }

        let registration = Registration::new(descriptor, epoch_millis());
        let target = probe_target(&registration)?;
        self.store.add_registration(&registration)?;

        let generation = self.commit(registration.clone()).await;
        self.monitor
            .start_monitor(MonitorSpec {
                generation,
                interval,
                target,
            })
            .await;

        info!(service_id = %registration.service_id, address = %registration.address(), "service registered");
        Ok(registration)
    }

    /// Replace an existing registration's location and health check.
    ///
    /// The running health task is cancelled (and its exit awaited) before
    /// the store is written. If the store write fails the old registration
    /// stays in the table and probing of it resumes.
    pub async fn update_register(&self, descriptor: ServiceDescriptor) -> RegistryResult<()> {
        let interval = validate_descriptor(&descriptor, self.settings.min_interval)?;
        let _ops = self.ops.lock().await;

        let current = self
            .table
            .read()
            .await
            .get(&descriptor.service_id)
            .cloned()
            .ok_or_else(|| RegistryError::EntityNotFound(descriptor.service_id.clone()))?;
        // A halted entry is mid-deregistration; only Deregister may touch it.
        if current.registration.status == Status::Halt {
            return Err(RegistryError::EntityNotFound(descriptor.service_id));
        }

        let replacement = current.registration.replaced_by(descriptor, epoch_millis());
        let target = probe_target(&replacement)?;
        let service_id = replacement.service_id.clone();

        self.monitor.stop_monitor(&service_id).await;

        if let Err(e) = self.store.update_registration(&replacement) {
            error!(%service_id, error = %e, "failed to persist registration update");
            self.resume_monitor(&current).await;
            return Err(e.into());
        }

        let generation = self.commit(replacement).await;
        self.monitor
            .start_monitor(MonitorSpec {
                generation,
                interval,
                target,
            })
            .await;

        info!(%service_id, "registration updated");
        Ok(())
    }

    /// Remove a registration and stop probing it.
    ///
    /// The entry is marked `Halt` first so no probe result already in
    /// flight can be applied. If the store delete fails the entry stays in
    /// the table (still `Halt`) so the instance is not lost track of.
    pub async fn deregister(&self, service_id: &str) -> RegistryResult<()> {
        require_service_id(service_id)?;
        let _ops = self.ops.lock().await;

        {
            let mut table = self.table.write().await;
            let entry = table
                .get_mut(service_id)
                .ok_or_else(|| RegistryError::EntityNotFound(service_id.to_string()))?;
            entry.registration = entry.registration.with_status(Status::Halt, epoch_millis());
        }

        self.monitor.stop_monitor(service_id).await;

        if let Err(e) = self.store.delete_registration(service_id) {
            warn!(%service_id, error = %e, "store delete failed, keeping halted registration");
            return Err(e.into());
        }

        self.table.write().await.remove(service_id);
        info!(%service_id, "service deregistered");
        Ok(())
    }

    /// Look up one registration.
    pub async fn get(&self, service_id: &str) -> RegistryResult<Registration> {
        require_service_id(service_id)?;
        self.table
            .read()
            .await
            .get(service_id)
            .map(|entry| entry.registration.clone())
            .ok_or_else(|| RegistryError::EntityNotFound(service_id.to_string()))
    }

    /// Point-in-time copy of every registration, ordered by service id.
    pub async fn list(&self) -> Vec<Registration> {
        let mut all: Vec<Registration> = {
            let table = self.table.read().await;
            table.values().map(|entry| entry.registration.clone()).collect()
        };
        all.sort_by(|a, b| a.service_id.cmp(&b.service_id));
        all
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Load persisted registrations and start probing them.
    ///
    /// Status is reset to `Unknown` (and that reset persisted): a previous
    /// process's probe results are not trusted. Records that no longer
    /// validate are deleted from the store so their ids can be registered
    /// again. A record whose reset cannot be persisted is still restored;
    /// its first probed status change rewrites it.
    pub async fn restore(&self) -> RegistryResult<usize> {
        let _ops = self.ops.lock().await;
        let persisted = self.store.list_registrations()?;
        let mut restored = 0;

        for stored in persisted {
            let service_id = stored.service_id.clone();
            if self.table.read().await.contains_key(&service_id) {
                debug!(%service_id, "already registered, skipping restore");
                continue;
            }

            let registration = stored.with_status(Status::Unknown, epoch_millis());
            let checked = validate_descriptor(&stored.descriptor(), self.settings.min_interval)
                .and_then(|interval| Ok((interval, probe_target(&registration)?)));
            let (interval, target) = match checked {
                Ok(checked) => checked,
                Err(e) => {
                    self.discard_persisted(&service_id, &e);
                    continue;
                }
            };
            if let Err(e) = self.store.update_registration(&registration) {
                warn!(%service_id, error = %e, "failed to persist status reset, restoring anyway");
            }

            let generation = self.commit(registration).await;
            self.monitor
                .start_monitor(MonitorSpec {
                    generation,
                    interval,
                    target,
                })
                .await;
            restored += 1;
        }

        info!(restored, "registrations restored");
        Ok(restored)
    }

    /// Stop every health task and wait for each to exit. The table and the
    /// store are left as they are.
    pub async fn shutdown(&self) {
        let _ops = self.ops.lock().await;
        self.monitor.stop_all().await;
    }

    /// Whether a health task is running for the service id.
    pub async fn is_probing(&self, service_id: &str) -> bool {
        self.monitor.is_monitoring(service_id).await
    }

    /// Number of running health tasks.
    pub async fn active_probes(&self) -> usize {
        self.monitor.active_monitors().await.len()
    }

    // ── Internals ──────────────────────────────────────────────────

    /// Insert or replace a table row under a fresh generation.
    async fn commit(&self, registration: Registration) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        self.table.write().await.insert(
            registration.service_id.clone(),
            Entry {
                registration,
                generation,
            },
        );
        generation
    }

    /// Drop a persisted record that can no longer be served.
    fn discard_persisted(&self, service_id: &str, reason: &RegistryError) {
        warn!(%service_id, error = %reason, "discarding invalid persisted registration");
        if let Err(e) = self.store.delete_registration(service_id) {
            error!(%service_id, error = %e, "failed to delete invalid persisted registration");
        }
    }

    /// Restart probing of an unchanged entry after a failed update.
    async fn resume_monitor(&self, entry: &Entry) {
        let registration = &entry.registration;
        if registration.status == Status::Halt {
            return;
        }
        let interval =
            match validate_descriptor(&registration.descriptor(), self.settings.min_interval) {
                Ok(interval) => interval,
                Err(e) => {
                    error!(service_id = %registration.service_id, error = %e, "cannot resume health monitor");
                    return;
                }
            };
        match probe_target(registration) {
            Ok(target) => {
                self.monitor
                    .start_monitor(MonitorSpec {
                        generation: entry.generation,
                        interval,
                        target,
                    })
                    .await;
            }
            Err(e) => {
                error!(service_id = %registration.service_id, error = %e, "cannot resume health monitor");
            }
        }
    }
}

fn probe_target(registration: &Registration) -> RegistryResult<ProbeTarget> {
    ProbeTarget::from_registration(registration).map_err(RegistryError::InvalidInput)
}

/// Build the callback health tasks use to publish status changes.
fn status_callback(table: Table, store: Arc<dyn RegistrationStore>) -> StatusCallback {
    Arc::new(move |update: StatusUpdate| -> BoxFuture<'static, UpdateOutcome> {
        let table = table.clone();
        let store = store.clone();
        Box::pin(async move { apply_status(&table, store.as_ref(), update).await })
    })
}

/// The only path by which a probed status reaches the table and the store.
///
/// The store is written without holding the table lock, so readers are not
/// held up by the commit. This relies on the health task being the sole
/// writer of its key while it runs: every mutation cancels and joins the
/// task before it touches the store. The entry is checked again before the
/// new status is published.
async fn apply_status(
    table: &RwLock<HashMap<ServiceId, Entry>>,
    store: &dyn RegistrationStore,
    update: StatusUpdate,
) -> UpdateOutcome {
    let next = {
        let table = table.read().await;
        let Some(entry) = table.get(&update.service_id) else {
            return UpdateOutcome::Halted;
        };
        if !accepts(entry, &update) {
            debug!(service_id = %update.service_id, generation = update.generation, "stale status update dropped");
            return UpdateOutcome::Halted;
        }
        if entry.registration.status == update.status {
            return UpdateOutcome::Applied;
        }
        entry.registration.with_status(update.status, epoch_millis())
    };

    if let Err(e) = store.update_registration(&next) {
        error!(service_id = %update.service_id, error = %e, "failed to persist status change");
        return UpdateOutcome::Rejected;
    }

    let mut table = table.write().await;
    match table.get_mut(&update.service_id) {
        Some(entry) if accepts(entry, &update) => {
            let previous = entry.registration.status;
            entry.registration = next;
            info!(service_id = %update.service_id, %previous, status = %update.status, "status changed");
            UpdateOutcome::Applied
        }
        _ => {
            debug!(service_id = %update.service_id, generation = update.generation, "entry changed during status write");
            UpdateOutcome::Halted
        }
    }
}

/// Whether a status update still belongs to the entry's live health task.
fn accepts(entry: &Entry, update: &StatusUpdate) -> bool {
    entry.generation == update.generation && entry.registration.status != Status::Halt
}
