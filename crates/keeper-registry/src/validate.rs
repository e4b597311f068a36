//! Descriptor validation. Runs before any state is touched.

use std::time::Duration;

use keeper_core::parse_duration;
use keeper_state::ServiceDescriptor;

use crate::error::{RegistryError, RegistryResult};

/// Reject an empty service id.
pub fn require_service_id(service_id: &str) -> RegistryResult<()> {
    if service_id.trim().is_empty() {
        return Err(RegistryError::InvalidInput("serviceId must not be empty".to_string()));
    }
    Ok(())
}

/// Validate a descriptor and return its probe interval.
pub fn validate_descriptor(
    descriptor: &ServiceDescriptor,
    min_interval: Duration,
) -> RegistryResult<Duration> {
    require_service_id(&descriptor.service_id)?;

    if descriptor.host.trim().is_empty() {
        return Err(RegistryError::InvalidInput("host must not be empty".to_string()));
    }
    if descriptor.port == 0 {
        return Err(RegistryError::InvalidInput("port must not be zero".to_string()));
    }

    let check = &descriptor.health_check;
    check.kind().map_err(RegistryError::InvalidInput)?;

    let interval = parse_duration(&check.interval).map_err(|e| {
        RegistryError::InvalidInput(format!("healthCheck.interval: {e}"))
    })?;
    if interval.is_zero() {
        return Err(RegistryError::InvalidInput(
            "healthCheck.interval must be positive".to_string(),
        ));
    }
    if interval < min_interval {
        return Err(RegistryError::InvalidInput(format!(
            "healthCheck.interval {} is shorter than the minimum {min_interval:?}",
            check.interval
        )));
    }

    Ok(interval)
}
