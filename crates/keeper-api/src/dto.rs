//! Request and response bodies.

use serde::{Deserialize, Serialize};

use keeper_state::{HealthCheck, Registration, ServiceDescriptor};

pub const API_VERSION: &str = "v3";

/// Registration as sent by clients. Missing fields decode as empty so
/// that validation, not the decoder, reports them. Unknown fields such as
/// a client-sent `status` are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationDto {
    pub service_id: String,
    pub host: String,
    pub port: u16,
    pub health_check: HealthCheckDto,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HealthCheckDto {
    pub interval: String,
    pub path: String,
    #[serde(rename = "type")]
    pub probe_type: String,
}

impl From<RegistrationDto> for ServiceDescriptor {
    fn from(dto: RegistrationDto) -> Self {
        ServiceDescriptor {
            service_id: dto.service_id,
            host: dto.host,
            port: dto.port,
            health_check: HealthCheck {
                interval: dto.health_check.interval,
                path: dto.health_check.path,
                probe_type: dto.health_check.probe_type,
            },
        }
    }
}

/// Body of POST and PUT `/registry`. `apiVersion` is accepted and ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    pub registration: RegistrationDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseResponse {
    pub api_version: &'static str,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BaseResponse {
    pub fn new(status_code: u16, message: Option<String>) -> Self {
        Self {
            api_version: API_VERSION,
            status_code,
            message,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    #[serde(flatten)]
    pub base: BaseResponse,
    pub registration: Registration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiRegistrationsResponse {
    #[serde(flatten)]
    pub base: BaseResponse,
    pub total_count: u32,
    pub registrations: Vec<Registration>,
}

/// Query string of GET `/registry/all`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub offset: Option<usize>,
    /// `-1` (or absent) means "up to the configured maximum".
    pub limit: Option<i64>,
}
