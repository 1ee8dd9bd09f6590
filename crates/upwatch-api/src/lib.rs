//! upwatch-api — REST API for upwatch.
//!
//! Provides axum route handlers over the service registry and the status
//! engine. Pure reads go straight to the store; `check-all` goes through
//! the probe runner.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Liveness summary |
//! | GET | `/health` | Liveness summary |
//! | GET | `/services` | List registered services |
//! | POST | `/services` | Register a service |
//! | GET | `/services/:id` | Get one service |
//! | PUT | `/services/:id` | Update name/url |
//! | DELETE | `/services/:id` | Unregister a service |
//! | POST | `/status/check-all` | Probe every registered service once |
//! | GET | `/status` | Paginated status history, newest first |
//! | GET | `/status/latest` | Latest record per registered service |
//! | GET | `/status/count` | Count of matching status records |

pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use upwatch_probe::CheckRunner;
use upwatch_state::StateStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
    pub runner: Arc<CheckRunner>,
}

/// Build the complete API router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(handlers::liveness))
        .route("/health", get(handlers::liveness))
        .route(
            "/services",
            get(handlers::list_services).post(handlers::create_service),
        )
        .route(
            "/services/{id}",
            get(handlers::get_service)
                .put(handlers::update_service)
                .delete(handlers::delete_service),
        )
        .route("/status/check-all", post(handlers::check_all))
        .route("/status", get(handlers::get_status_logs))
        .route("/status/latest", get(handlers::get_latest_statuses))
        .route("/status/count", get(handlers::get_status_count))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
