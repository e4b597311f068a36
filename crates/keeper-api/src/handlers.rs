//! REST API handlers.
//!
//! Each handler decodes the request, calls one registry operation and maps
//! the outcome to a status code: invalid input → 400, unknown id → 404,
//! duplicate id → 409, store failure → 500.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, error};

use keeper_registry::{ErrorKind, RegistryError};
use keeper_state::ServiceDescriptor;

use crate::dto::*;
use crate::ApiState;

fn error_response(msg: &str, status: StatusCode) -> Response {
    (
        status,
        Json(BaseResponse::new(status.as_u16(), Some(msg.to_string()))),
    )
        .into_response()
}

fn registry_error(e: RegistryError) -> Response {
    let status = match e.kind() {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::DuplicateName => StatusCode::CONFLICT,
        ErrorKind::EntityNotFound => StatusCode::NOT_FOUND,
        ErrorKind::PersistenceError => {
            error!(error = %e, "registry persistence failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(&e.to_string(), status)
}

fn decode(body: Result<Json<RegistrationRequest>, JsonRejection>) -> Result<ServiceDescriptor, Response> {
    match body {
        Ok(Json(req)) => Ok(req.registration.into()),
        Err(rejection) => {
            debug!(error = %rejection, "malformed registration request");
            Err(error_response(&rejection.body_text(), StatusCode::BAD_REQUEST))
        }
    }
}

// ── Registry ───────────────────────────────────────────────────

/// POST /api/v3/registry
pub async fn register(
    State(state): State<ApiState>,
    body: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Response {
    let descriptor = match decode(body) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match state.registry.register(descriptor).await {
        Ok(registration) => (
            StatusCode::CREATED,
            Json(RegistrationResponse {
                base: BaseResponse::new(StatusCode::CREATED.as_u16(), None),
                registration,
            }),
        )
            .into_response(),
        Err(e) => registry_error(e),
    }
}

/// PUT /api/v3/registry
pub async fn update_register(
    State(state): State<ApiState>,
    body: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Response {
    let descriptor = match decode(body) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match state.registry.update_register(descriptor).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => registry_error(e),
    }
}

/// GET /api/v3/registry/serviceId/{serviceId}
pub async fn registration_by_service_id(
    State(state): State<ApiState>,
    Path(service_id): Path<String>,
) -> Response {
    match state.registry.get(&service_id).await {
        Ok(registration) => Json(RegistrationResponse {
            base: BaseResponse::new(StatusCode::OK.as_u16(), None),
            registration,
        })
        .into_response(),
        Err(e) => registry_error(e),
    }
}

/// DELETE /api/v3/registry/serviceId/{serviceId}
pub async fn deregister(
    State(state): State<ApiState>,
    Path(service_id): Path<String>,
) -> Response {
    match state.registry.deregister(&service_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => registry_error(e),
    }
}

/// GET /api/v3/registry/all?offset=&limit=
pub async fn registrations(
    State(state): State<ApiState>,
    Query(page): Query<PageQuery>,
) -> Response {
    let max = state.max_result_count;
    let limit = match page.limit {
        None | Some(-1) => max,
        Some(n) if n > 0 && (n as usize) <= max => n as usize,
        Some(n) => {
            return error_response(
                &format!("limit {n} must be -1 or between 1 and {max}"),
                StatusCode::BAD_REQUEST,
            );
        }
    };
    let offset = page.offset.unwrap_or(0);

    let all = state.registry.list().await;
    let total_count = all.len() as u32;
    let registrations = all.into_iter().skip(offset).take(limit).collect();

    Json(MultiRegistrationsResponse {
        base: BaseResponse::new(StatusCode::OK.as_u16(), None),
        total_count,
        registrations,
    })
    .into_response()
}

// ── Ping ───────────────────────────────────────────────────────

/// GET /api/v3/ping
pub async fn ping() -> impl IntoResponse {
    Json(BaseResponse::new(StatusCode::OK.as_u16(), None))
}
