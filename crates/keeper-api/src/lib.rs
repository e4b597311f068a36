//! keeper-api — REST API for the Keeper registry.
//!
//! A thin transport over [`Registry`]: decode, call one operation, map the
//! error kind to a status code.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/api/v3/registry` | Register a service instance |
//! | PUT | `/api/v3/registry` | Replace a registration |
//! | GET | `/api/v3/registry/all` | List registrations (`offset`, `limit`) |
//! | GET | `/api/v3/registry/serviceId/{serviceId}` | Get one registration |
//! | DELETE | `/api/v3/registry/serviceId/{serviceId}` | Deregister |
//! | GET | `/api/v3/ping` | Liveness of the registry itself |

pub mod dto;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use keeper_registry::Registry;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<Registry>,
    /// Cap on registrations returned by one list call.
    pub max_result_count: usize,
}

/// Build the complete API router.
pub fn build_router(registry: Arc<Registry>, max_result_count: usize) -> Router {
    let api_state = ApiState {
        registry,
        max_result_count,
    };

    let api_routes = Router::new()
        .route("/registry", post(handlers::register).put(handlers::update_register))
        .route("/registry/all", get(handlers::registrations))
        .route(
            "/registry/serviceId/{serviceId}",
            get(handlers::registration_by_service_id).delete(handlers::deregister),
        )
        .route("/ping", get(handlers::ping))
        .with_state(api_state);

    Router::new().nest("/api/v3", api_routes)
}
