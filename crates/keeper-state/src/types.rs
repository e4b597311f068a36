//! Domain types for the Keeper registration store.
//!
//! A [`Registration`] is what gets persisted; a [`ServiceDescriptor`] is what
//! callers hand in. The descriptor carries no status: status is derived by
//! the health scheduler and never accepted from outside.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unique identifier of a registered service instance.
pub type ServiceId = String;

// ── Health check ───────────────────────────────────────────────────

/// How an instance is probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeType {
    Http,
    Tcp,
}

impl ProbeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeType::Http => "http",
            ProbeType::Tcp => "tcp",
        }
    }
}

impl fmt::Display for ProbeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProbeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(ProbeType::Http),
            "tcp" => Ok(ProbeType::Tcp),
            other => Err(format!("unsupported health check type {other:?}")),
        }
    }
}

/// Health check descriptor attached to a registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    /// Probe period as a duration string, e.g. "10s".
    pub interval: String,
    /// Request path for HTTP probes; ignored by TCP probes.
    pub path: String,
    /// Probe type as supplied ("http" / "tcp"). Kept as text so that an
    /// unsupported type reaches validation instead of failing to decode.
    #[serde(rename = "type")]
    pub probe_type: String,
}

impl HealthCheck {
    /// Parsed probe type, if recognised.
    pub fn kind(&self) -> Result<ProbeType, String> {
        self.probe_type.parse()
    }
}

// ── Status ─────────────────────────────────────────────────────────

/// The registry's current belief about an instance's health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Registered, no probe has completed yet.
    #[default]
    Unknown,
    /// Last probe succeeded.
    Up,
    /// Last probe failed or could not be executed.
    Down,
    /// Probing permanently stopped; deregistration is in flight.
    Halt,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Unknown => "UNKNOWN",
            Status::Up => "UP",
            Status::Down => "DOWN",
            Status::Halt => "HALT",
        };
        f.write_str(s)
    }
}

// ── Registration ───────────────────────────────────────────────────

/// Caller-supplied description of a service instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    pub service_id: ServiceId,
    pub host: String,
    pub port: u16,
    pub health_check: HealthCheck,
}

/// A registered service instance as held by the registry and the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub service_id: ServiceId,
    pub host: String,
    pub port: u16,
    pub health_check: HealthCheck,
    pub status: Status,
    /// Unix timestamp (milliseconds) of the first registration.
    pub created: u64,
    /// Unix timestamp (milliseconds) of the last change.
    pub modified: u64,
}

impl Registration {
    /// Build a fresh registration in state `Unknown`.
    pub fn new(descriptor: ServiceDescriptor, now: u64) -> Self {
        Self {
            service_id: descriptor.service_id,
            host: descriptor.host,
            port: descriptor.port,
            health_check: descriptor.health_check,
            status: Status::Unknown,
            created: now,
            modified: now,
        }
    }

    /// Replace location and health check, keeping the creation time.
    /// Status resets to `Unknown`.
    pub fn replaced_by(&self, descriptor: ServiceDescriptor, now: u64) -> Self {
        Self {
            created: self.created,
            ..Self::new(descriptor, now)
        }
    }

    /// Copy of this registration carrying a new status.
    pub fn with_status(&self, status: Status, now: u64) -> Self {
        Self {
            status,
            modified: now,
            ..self.clone()
        }
    }

    /// `host:port` address used by probes.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// The caller-owned part of this registration.
    pub fn descriptor(&self) -> ServiceDescriptor {
        ServiceDescriptor {
            service_id: self.service_id.clone(),
            host: self.host.clone(),
            port: self.port,
            health_check: self.health_check.clone(),
        }
    }
}

/// Current unix time in milliseconds.
pub fn epoch_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
