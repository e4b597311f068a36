//! keeper-registry — the registration table and its health tasks.
//!
//! # Architecture
//!
//! ```text
//! Registry
//!   ├── Table (service_id → registration + task generation)
//!   ├── RegistrationStore (written before the table on every change)
//!   └── HealthMonitor (one probe task per live registration)
//!         └── status callback → apply_status → store, then table
//! ```
//!
//! The public contract is `register`, `update_register`, `deregister`,
//! `get` and `list`. Callers never supply a status; it is derived from
//! probe outcomes only.

pub mod error;
pub mod registry;
pub mod validate;

pub use error::{ErrorKind, RegistryError, RegistryResult};
pub use registry::{Registry, RegistrySettings};
