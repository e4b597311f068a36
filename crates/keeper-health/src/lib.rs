//! keeper-health — health probing for registered service instances.
//!
//! # Architecture
//!
//! ```text
//! HealthMonitor
//!   ├── Per-registration background task
//!   │   ├── Prober::probe() → ProbeResult   (http or tcp, bounded timeout)
//!   │   ├── StatusMachine (Unknown / Up / Down / Halt)
//!   │   └── StatusCallback → registry update path
//!   └── watch shutdown + JoinHandle per task
//! ```
//!
//! Probes run on a fixed cadence: the registration's declared interval.
//! There is no backoff; an unreachable instance keeps reporting `Down`.

pub mod monitor;
pub mod prober;
pub mod status;

pub use monitor::{HealthMonitor, MonitorSpec, StatusCallback, StatusUpdate, UpdateOutcome};
pub use prober::{BoxFuture, NetworkProber, ProbeResult, ProbeStrategy, ProbeTarget, Prober};
pub use status::StatusMachine;
