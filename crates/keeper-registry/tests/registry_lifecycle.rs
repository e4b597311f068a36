//! Registry lifecycle tests.
//!
//! Exercise the public operations end to end against an in-memory redb
//! store, scripted probers, and a store wrapper that injects failures.
//! Time is paused so probe intervals elapse instantly.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

use keeper_health::{BoxFuture, ProbeResult, ProbeTarget, Prober};
use keeper_registry::{ErrorKind, Registry, RegistryError, RegistrySettings};
use keeper_state::*;

// ── Test doubles ───────────────────────────────────────────────────

/// Returns whatever result is currently scripted.
struct ScriptedProber {
    result: Mutex<ProbeResult>,
    calls: AtomicUsize,
}

impl ScriptedProber {
    fn new(result: ProbeResult) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(result),
            calls: AtomicUsize::new(0),
        })
    }

    fn set(&self, result: ProbeResult) {
        *self.result.lock().unwrap() = result;
    }
}

impl Prober for ScriptedProber {
    fn probe<'a>(&'a self, _target: &'a ProbeTarget) -> BoxFuture<'a, ProbeResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = *self.result.lock().unwrap();
        Box::pin(async move { result })
    }
}

/// Parks inside the probe until released, then reports healthy.
struct GatedProber {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl Prober for GatedProber {
    fn probe<'a>(&'a self, _target: &'a ProbeTarget) -> BoxFuture<'a, ProbeResult> {
        Box::pin(async move {
            self.entered.notify_one();
            self.release.notified().await;
            ProbeResult::Healthy
        })
    }
}

/// Wraps a real store; can fail each write kind and counts updates.
struct FaultyStore {
    inner: StateStore,
    fail_add: AtomicBool,
    fail_update: AtomicBool,
    fail_delete: AtomicBool,
    updates: AtomicUsize,
}

impl FaultyStore {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: StateStore::open_in_memory().unwrap(),
            fail_add: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            updates: AtomicUsize::new(0),
        })
    }
}

impl RegistrationStore for FaultyStore {
    fn add_registration(&self, registration: &Registration) -> StateResult<()> {
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(StateError::Write("injected add failure".to_string()));
        }
        self.inner.add_registration(registration)
    }

    fn update_registration(&self, registration: &Registration) -> StateResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(StateError::Write("injected update failure".to_string()));
        }
        self.inner.update_registration(registration)
    }

    fn delete_registration(&self, service_id: &str) -> StateResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StateError::Write("injected delete failure".to_string()));
        }
        self.inner.delete_registration(service_id)
    }

    fn get_registration(&self, service_id: &str) -> StateResult<Option<Registration>> {
        self.inner.get_registration(service_id)
    }

    fn list_registrations(&self) -> StateResult<Vec<Registration>> {
        self.inner.list_registrations()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

const INTERVAL: Duration = Duration::from_secs(10);

fn descriptor(service_id: &str) -> ServiceDescriptor {
    ServiceDescriptor {
        service_id: service_id.to_string(),
        host: "localhost".to_string(),
        port: 50000,
        health_check: HealthCheck {
            interval: "10s".to_string(),
            path: "/ping".to_string(),
            probe_type: "http".to_string(),
        },
    }
}

fn registry_with(store: Arc<FaultyStore>, prober: Arc<dyn Prober>) -> Registry {
    Registry::new(store, prober, RegistrySettings::default())
}

fn kind<T: std::fmt::Debug>(result: Result<T, RegistryError>) -> ErrorKind {
    result.unwrap_err().kind()
}

async fn just_after_first_probe() {
    tokio::time::sleep(INTERVAL + Duration::from_millis(1)).await;
}

// ── Scenarios ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn register_update_deregister_scenario() {
    let store = FaultyStore::new();
    let registry = registry_with(store.clone(), ScriptedProber::new(ProbeResult::Healthy));

    let registered = registry.register(descriptor("svc-a")).await.unwrap();
    assert_eq!(registered.status, Status::Unknown);

    assert_eq!(
        kind(registry.register(descriptor("svc-a")).await),
        ErrorKind::DuplicateName
    );

    let mut bad = descriptor("svc-a");
    bad.health_check.interval = "10t".to_string();
    bad.port = 60000;
    assert_eq!(kind(registry.update_register(bad).await), ErrorKind::InvalidInput);
    assert_eq!(registry.get("svc-a").await.unwrap(), registered);

    registry.deregister("svc-a").await.unwrap();
    assert_eq!(kind(registry.get("svc-a").await), ErrorKind::EntityNotFound);
    assert_eq!(kind(registry.deregister("svc-a").await), ErrorKind::EntityNotFound);
    assert!(store.get_registration("svc-a").unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn register_then_get_is_unknown_and_persisted() {
    let store = FaultyStore::new();
    let registry = registry_with(store.clone(), ScriptedProber::new(ProbeResult::Healthy));

    registry.register(descriptor("svc-a")).await.unwrap();

    let got = registry.get("svc-a").await.unwrap();
    assert_eq!(got.status, Status::Unknown);
    assert_eq!(store.get_registration("svc-a").unwrap(), Some(got));
    assert!(registry.is_probing("svc-a").await);
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn duplicate_register_leaves_original_untouched() {
    let store = FaultyStore::new();
    let prober = ScriptedProber::new(ProbeResult::Healthy);
    let registry = registry_with(store.clone(), prober.clone());

    registry.register(descriptor("svc-a")).await.unwrap();

    let mut other = descriptor("svc-a");
    other.port = 60000;
    assert_eq!(kind(registry.register(other).await), ErrorKind::DuplicateName);

    assert_eq!(registry.get("svc-a").await.unwrap().port, 50000);
    assert_eq!(registry.active_probes().await, 1);

    // Still exactly one task: one probe per interval.
    tokio::time::sleep(INTERVAL * 3 + Duration::from_millis(1)).await;
    assert_eq!(prober.calls.load(Ordering::SeqCst), 3);
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn unknown_ids_are_not_found() {
    let registry = registry_with(FaultyStore::new(), ScriptedProber::new(ProbeResult::Healthy));

    assert_eq!(
        kind(registry.update_register(descriptor("nope")).await),
        ErrorKind::EntityNotFound
    );
    assert_eq!(kind(registry.deregister("nope").await), ErrorKind::EntityNotFound);
    assert_eq!(kind(registry.get("nope").await), ErrorKind::EntityNotFound);
}

#[tokio::test(start_paused = true)]
async fn empty_ids_are_invalid() {
    let registry = registry_with(FaultyStore::new(), ScriptedProber::new(ProbeResult::Healthy));

    assert_eq!(kind(registry.register(descriptor("")).await), ErrorKind::InvalidInput);
    assert_eq!(kind(registry.deregister("").await), ErrorKind::InvalidInput);
    assert_eq!(kind(registry.get("").await), ErrorKind::InvalidInput);
}

#[tokio::test(start_paused = true)]
async fn unsupported_probe_type_is_invalid() {
    let registry = registry_with(FaultyStore::new(), ScriptedProber::new(ProbeResult::Healthy));

    let mut d = descriptor("svc-a");
    d.health_check.probe_type = String::new();
    assert_eq!(kind(registry.register(d).await), ErrorKind::InvalidInput);
    assert!(registry.list().await.is_empty());
}

// ── Probing ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn healthy_instance_goes_up_within_one_interval() {
    let store = FaultyStore::new();
    let registry = registry_with(store.clone(), ScriptedProber::new(ProbeResult::Healthy));

    registry.register(descriptor("svc-a")).await.unwrap();
    just_after_first_probe().await;

    assert_eq!(registry.get("svc-a").await.unwrap().status, Status::Up);
    assert_eq!(
        store.get_registration("svc-a").unwrap().unwrap().status,
        Status::Up
    );
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failing_instance_goes_down_and_stays_down() {
    let store = FaultyStore::new();
    let prober = ScriptedProber::new(ProbeResult::Failed);
    let registry = registry_with(store.clone(), prober.clone());

    registry.register(descriptor("svc-a")).await.unwrap();
    just_after_first_probe().await;
    assert_eq!(registry.get("svc-a").await.unwrap().status, Status::Down);

    // Fixed cadence, no backoff, no redundant writes.
    tokio::time::sleep(INTERVAL * 4).await;
    assert_eq!(prober.calls.load(Ordering::SeqCst), 5);
    assert_eq!(store.updates.load(Ordering::SeqCst), 1);
    assert_eq!(registry.get("svc-a").await.unwrap().status, Status::Down);
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn status_follows_probe_outcomes() {
    let prober = ScriptedProber::new(ProbeResult::Healthy);
    let registry = registry_with(FaultyStore::new(), prober.clone());

    registry.register(descriptor("svc-a")).await.unwrap();
    just_after_first_probe().await;
    assert_eq!(registry.get("svc-a").await.unwrap().status, Status::Up);

    prober.set(ProbeResult::Unhealthy);
    tokio::time::sleep(INTERVAL).await;
    assert_eq!(registry.get("svc-a").await.unwrap().status, Status::Down);

    prober.set(ProbeResult::Healthy);
    tokio::time::sleep(INTERVAL).await;
    assert_eq!(registry.get("svc-a").await.unwrap().status, Status::Up);
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failed_status_write_is_retried_next_cycle() {
    let store = FaultyStore::new();
    let registry = registry_with(store.clone(), ScriptedProber::new(ProbeResult::Healthy));

    registry.register(descriptor("svc-a")).await.unwrap();
    store.fail_update.store(true, Ordering::SeqCst);
    just_after_first_probe().await;
    assert_eq!(registry.get("svc-a").await.unwrap().status, Status::Unknown);

    store.fail_update.store(false, Ordering::SeqCst);
    tokio::time::sleep(INTERVAL).await;
    assert_eq!(registry.get("svc-a").await.unwrap().status, Status::Up);
    assert_eq!(
        store.get_registration("svc-a").unwrap().unwrap().status,
        Status::Up
    );
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn update_resets_status_and_replaces_task() {
    let store = FaultyStore::new();
    let registry = registry_with(store.clone(), ScriptedProber::new(ProbeResult::Healthy));

    registry.register(descriptor("svc-a")).await.unwrap();
    just_after_first_probe().await;
    assert_eq!(registry.get("svc-a").await.unwrap().status, Status::Up);

    let mut moved = descriptor("svc-a");
    moved.host = "10.0.0.7".to_string();
    moved.health_check.probe_type = "tcp".to_string();
    registry.update_register(moved).await.unwrap();

    let updated = registry.get("svc-a").await.unwrap();
    assert_eq!(updated.status, Status::Unknown);
    assert_eq!(updated.host, "10.0.0.7");
    assert_eq!(store.get_registration("svc-a").unwrap(), Some(updated));
    assert_eq!(registry.active_probes().await, 1);

    just_after_first_probe().await;
    assert_eq!(registry.get("svc-a").await.unwrap().status, Status::Up);
    registry.shutdown().await;
}

// ── Deregistration races ───────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn deregister_discards_in_flight_probe() {
    let store = FaultyStore::new();
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let prober = Arc::new(GatedProber {
        entered: entered.clone(),
        release: release.clone(),
    });
    let registry = Arc::new(registry_with(store.clone(), prober));

    registry.register(descriptor("svc-a")).await.unwrap();
    entered.notified().await;

    let deregistering = registry.clone();
    let dereg = tokio::spawn(async move { deregistering.deregister("svc-a").await });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    // Marked halted, still waiting on the probe.
    assert!(!dereg.is_finished());
    assert_eq!(registry.get("svc-a").await.unwrap().status, Status::Halt);

    release.notify_one();
    dereg.await.unwrap().unwrap();

    assert_eq!(kind(registry.get("svc-a").await), ErrorKind::EntityNotFound);
    assert!(store.get_registration("svc-a").unwrap().is_none());
    assert_eq!(store.updates.load(Ordering::SeqCst), 0);
    assert!(!registry.is_probing("svc-a").await);

    // Nothing comes back later either.
    tokio::time::sleep(INTERVAL * 5).await;
    assert!(registry.list().await.is_empty());
    assert_eq!(store.updates.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn update_discards_in_flight_probe() {
    let store = FaultyStore::new();
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let prober = Arc::new(GatedProber {
        entered: entered.clone(),
        release: release.clone(),
    });
    let registry = Arc::new(registry_with(store.clone(), prober));

    registry.register(descriptor("svc-a")).await.unwrap();
    entered.notified().await;

    let mut moved = descriptor("svc-a");
    moved.host = "10.0.0.7".to_string();
    let updating = registry.clone();
    let update = tokio::spawn(async move { updating.update_register(moved).await });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    // Waiting for the old task; the old registration is still served.
    assert!(!update.is_finished());
    assert_eq!(registry.get("svc-a").await.unwrap().host, "localhost");

    release.notify_one();
    update.await.unwrap().unwrap();

    let updated = registry.get("svc-a").await.unwrap();
    assert_eq!(updated.host, "10.0.0.7");
    assert_eq!(updated.status, Status::Unknown);
    let persisted = store.get_registration("svc-a").unwrap().unwrap();
    assert_eq!(persisted.status, Status::Unknown);
    assert_eq!(persisted.host, "10.0.0.7");
    // Only the update itself was written.
    assert_eq!(store.updates.load(Ordering::SeqCst), 1);
    assert_eq!(registry.active_probes().await, 1);
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn no_probe_applied_after_deregister() {
    let store = FaultyStore::new();
    let prober = ScriptedProber::new(ProbeResult::Healthy);
    let registry = registry_with(store.clone(), prober.clone());

    registry.register(descriptor("svc-a")).await.unwrap();
    registry.deregister("svc-a").await.unwrap();

    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.updates.load(Ordering::SeqCst), 0);
    assert_eq!(registry.active_probes().await, 0);
}

// ── Persistence failures ───────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn register_store_failure_changes_nothing() {
    let store = FaultyStore::new();
    store.fail_add.store(true, Ordering::SeqCst);
    let registry = registry_with(store.clone(), ScriptedProber::new(ProbeResult::Healthy));

    assert_eq!(
        kind(registry.register(descriptor("svc-a")).await),
        ErrorKind::PersistenceError
    );
    assert_eq!(kind(registry.get("svc-a").await), ErrorKind::EntityNotFound);
    assert_eq!(registry.active_probes().await, 0);
}

#[tokio::test(start_paused = true)]
async fn update_store_failure_keeps_old_registration_probed() {
    let store = FaultyStore::new();
    let prober = ScriptedProber::new(ProbeResult::Healthy);
    let registry = registry_with(store.clone(), prober.clone());

    let original = registry.register(descriptor("svc-a")).await.unwrap();
    store.fail_update.store(true, Ordering::SeqCst);

    let mut moved = descriptor("svc-a");
    moved.port = 60000;
    assert_eq!(
        kind(registry.update_register(moved).await),
        ErrorKind::PersistenceError
    );
    assert_eq!(registry.get("svc-a").await.unwrap(), original);
    assert!(registry.is_probing("svc-a").await);
    assert_eq!(registry.active_probes().await, 1);

    store.fail_update.store(false, Ordering::SeqCst);
    just_after_first_probe().await;
    assert_eq!(prober.calls.load(Ordering::SeqCst), 1);
    assert_eq!(registry.get("svc-a").await.unwrap().status, Status::Up);
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn deregister_store_failure_keeps_halted_entry() {
    let store = FaultyStore::new();
    let registry = registry_with(store.clone(), ScriptedProber::new(ProbeResult::Healthy));

    registry.register(descriptor("svc-a")).await.unwrap();
    store.fail_delete.store(true, Ordering::SeqCst);

    assert_eq!(
        kind(registry.deregister("svc-a").await),
        ErrorKind::PersistenceError
    );
    assert_eq!(registry.get("svc-a").await.unwrap().status, Status::Halt);
    assert!(!registry.is_probing("svc-a").await);
    assert!(store.get_registration("svc-a").unwrap().is_some());

    store.fail_delete.store(false, Ordering::SeqCst);
    registry.deregister("svc-a").await.unwrap();
    assert_eq!(kind(registry.get("svc-a").await), ErrorKind::EntityNotFound);
}

#[tokio::test(start_paused = true)]
async fn halted_entry_rejects_update() {
    let store = FaultyStore::new();
    let prober = ScriptedProber::new(ProbeResult::Healthy);
    let registry = registry_with(store.clone(), prober.clone());

    registry.register(descriptor("svc-a")).await.unwrap();
    store.fail_delete.store(true, Ordering::SeqCst);
    assert_eq!(
        kind(registry.deregister("svc-a").await),
        ErrorKind::PersistenceError
    );

    let mut moved = descriptor("svc-a");
    moved.port = 60000;
    assert_eq!(
        kind(registry.update_register(moved).await),
        ErrorKind::EntityNotFound
    );

    tokio::time::sleep(INTERVAL * 3).await;
    let halted = registry.get("svc-a").await.unwrap();
    assert_eq!(halted.status, Status::Halt);
    assert_eq!(halted.port, 50000);
    assert!(!registry.is_probing("svc-a").await);
    assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.updates.load(Ordering::SeqCst), 0);
}

// ── Listing and concurrency ────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn list_reflects_registers_minus_deregisters() {
    let registry = registry_with(FaultyStore::new(), ScriptedProber::new(ProbeResult::Healthy));
    assert!(registry.list().await.is_empty());

    for i in 0..6 {
        let mut d = descriptor(&format!("svc-{i}"));
        d.port = 50000 + i;
        registry.register(d).await.unwrap();
    }
    for i in [1, 4] {
        registry.deregister(&format!("svc-{i}")).await.unwrap();
    }

    let listed = registry.list().await;
    let ids: Vec<&str> = listed.iter().map(|r| r.service_id.as_str()).collect();
    assert_eq!(ids, vec!["svc-0", "svc-2", "svc-3", "svc-5"]);
    for reg in &listed {
        let i: u16 = reg.service_id["svc-".len()..].parse().unwrap();
        assert_eq!(reg.port, 50000 + i);
        assert_eq!(reg.health_check, descriptor("x").health_check);
    }
    assert_eq!(registry.active_probes().await, 4);
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn concurrent_registers_of_same_id_admit_one() {
    let registry = Arc::new(registry_with(
        FaultyStore::new(),
        ScriptedProber::new(ProbeResult::Healthy),
    ));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            registry.register(descriptor("svc-a")).await
        }));
    }

    let mut ok = 0;
    let mut duplicate = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(e) => {
                assert_eq!(e.kind(), ErrorKind::DuplicateName);
                duplicate += 1;
            }
        }
    }
    assert_eq!((ok, duplicate), (1, 7));
    assert_eq!(registry.active_probes().await, 1);
    registry.shutdown().await;
}

// ── Restore and shutdown ───────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn restore_resets_status_and_resumes_probing() {
    let store = FaultyStore::new();
    let persisted = Registration::new(descriptor("svc-a"), 1000).with_status(Status::Up, 2000);
    store.add_registration(&persisted).unwrap();

    let mut broken = Registration::new(descriptor("svc-b"), 1000);
    broken.health_check.interval = "10t".to_string();
    store.add_registration(&broken).unwrap();

    let prober = ScriptedProber::new(ProbeResult::Failed);
    let registry = registry_with(store.clone(), prober);

    assert_eq!(registry.restore().await.unwrap(), 1);

    let restored = registry.get("svc-a").await.unwrap();
    assert_eq!(restored.status, Status::Unknown);
    assert_eq!(restored.created, 1000);
    assert_eq!(
        store.get_registration("svc-a").unwrap().unwrap().status,
        Status::Unknown
    );
    assert_eq!(kind(registry.get("svc-b").await), ErrorKind::EntityNotFound);
    assert!(store.get_registration("svc-b").unwrap().is_none());

    just_after_first_probe().await;
    assert_eq!(registry.get("svc-a").await.unwrap().status, Status::Down);

    // A second restore does not duplicate tasks.
    assert_eq!(registry.restore().await.unwrap(), 0);
    assert_eq!(registry.active_probes().await, 1);
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn restore_discards_records_that_no_longer_validate() {
    let store = FaultyStore::new();
    let mut too_frequent = Registration::new(descriptor("svc-z"), 1000);
    too_frequent.health_check.interval = "2s".to_string();
    store.add_registration(&too_frequent).unwrap();

    let registry = Registry::new(
        store.clone(),
        ScriptedProber::new(ProbeResult::Healthy),
        RegistrySettings {
            min_interval: Duration::from_secs(5),
        },
    );
    assert_eq!(registry.restore().await.unwrap(), 0);
    assert!(store.get_registration("svc-z").unwrap().is_none());

    // The id is free again.
    let registered = registry.register(descriptor("svc-z")).await.unwrap();
    assert_eq!(registered.health_check.interval, "10s");
    assert_eq!(
        store.get_registration("svc-z").unwrap(),
        Some(registered)
    );
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn restore_keeps_record_when_status_reset_fails() {
    let store = FaultyStore::new();
    let persisted = Registration::new(descriptor("svc-a"), 1000).with_status(Status::Up, 2000);
    store.add_registration(&persisted).unwrap();
    store.fail_update.store(true, Ordering::SeqCst);

    let registry = registry_with(store.clone(), ScriptedProber::new(ProbeResult::Failed));
    assert_eq!(registry.restore().await.unwrap(), 1);
    assert_eq!(registry.get("svc-a").await.unwrap().status, Status::Unknown);
    assert!(registry.is_probing("svc-a").await);

    store.fail_update.store(false, Ordering::SeqCst);
    just_after_first_probe().await;
    assert_eq!(
        store.get_registration("svc-a").unwrap().unwrap().status,
        Status::Down
    );
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_probing_but_keeps_state() {
    let store = FaultyStore::new();
    let prober = ScriptedProber::new(ProbeResult::Healthy);
    let registry = registry_with(store.clone(), prober.clone());

    registry.register(descriptor("svc-a")).await.unwrap();
    registry.register(descriptor("svc-b")).await.unwrap();
    registry.shutdown().await;

    tokio::time::sleep(INTERVAL * 3).await;
    assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
    assert_eq!(registry.active_probes().await, 0);
    assert_eq!(registry.list().await.len(), 2);
    assert_eq!(store.list_registrations().unwrap().len(), 2);
}
