//! REST API handlers.
//!
//! Registry handlers read/write via `StateStore`; status handlers read the
//! store directly and trigger probe runs through `CheckRunner`. Error
//! bodies are `{"detail": "..."}` JSON with the mapped status code.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use upwatch_probe::CheckError;
use upwatch_state::{ServiceSpec, StatusRecord};

use crate::ApiState;

fn error_response(detail: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(serde_json::json!({ "detail": detail })),
    )
}

// ── Liveness ───────────────────────────────────────────────────

/// GET / and GET /health
pub async fn liveness() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "upwatch",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ── Service registry ───────────────────────────────────────────

/// Create request body.
#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub url: String,
}

/// Update request body; absent fields are left unchanged.
#[derive(Deserialize)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub url: Option<String>,
}

/// GET /services
pub async fn list_services(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_services() {
        Ok(services) => Json(services).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// POST /services
pub async fn create_service(
    State(state): State<ApiState>,
    Json(req): Json<CreateServiceRequest>,
) -> impl IntoResponse {
    let now = Utc::now();
    let spec = ServiceSpec {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        url: req.url,
        created_at: now,
        updated_at: now,
    };
    match state.store.put_service(&spec) {
        Ok(()) => (StatusCode::CREATED, Json(spec)).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// GET /services/:id
pub async fn get_service(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if Uuid::parse_str(&id).is_err() {
        return error_response("Invalid service ID", StatusCode::BAD_REQUEST).into_response();
    }
    match state.store.get_service(&id) {
        Ok(Some(spec)) => Json(spec).into_response(),
        Ok(None) => error_response("Service not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// PUT /services/:id
pub async fn update_service(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateServiceRequest>,
) -> impl IntoResponse {
    if Uuid::parse_str(&id).is_err() {
        return error_response("Invalid service ID", StatusCode::BAD_REQUEST).into_response();
    }
    let mut spec = match state.store.get_service(&id) {
        Ok(Some(spec)) => spec,
        Ok(None) => {
            return error_response("Service not found", StatusCode::NOT_FOUND).into_response();
        }
        Err(e) => {
            return error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
                .into_response();
        }
    };

    if let Some(name) = req.name {
        spec.name = name;
    }
    if let Some(url) = req.url {
        spec.url = url;
    }
    spec.updated_at = Utc::now();

    match state.store.put_service(&spec) {
        Ok(()) => Json(spec).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// DELETE /services/:id
pub async fn delete_service(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if Uuid::parse_str(&id).is_err() {
        return error_response("Invalid service ID", StatusCode::BAD_REQUEST).into_response();
    }
    match state.store.delete_service(&id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response("Service not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

// ── Status engine ──────────────────────────────────────────────

/// Check-all response body.
#[derive(serde::Serialize)]
pub struct CheckAllResponse {
    pub message: String,
    pub checked_services: usize,
    pub results: Vec<StatusRecord>,
}

/// POST /status/check-all
pub async fn check_all(State(state): State<ApiState>) -> impl IntoResponse {
    match state.runner.check_all().await {
        Ok(report) => Json(CheckAllResponse {
            message: format!("Successfully checked {} services", report.checked_count),
            checked_services: report.checked_count,
            results: report.results,
        })
        .into_response(),
        Err(CheckError::NoServices) => {
            error_response("No services found", StatusCode::NOT_FOUND).into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// Pagination and filter parameters for GET /status.
#[derive(Deserialize)]
pub struct StatusQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub service_id: Option<String>,
}

/// GET /status?limit&offset&service_id
pub async fn get_status_logs(
    State(state): State<ApiState>,
    Query(query): Query<StatusQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(50);
    if !(1..=1000).contains(&limit) {
        return error_response("limit must be between 1 and 1000", StatusCode::BAD_REQUEST)
            .into_response();
    }
    let offset = query.offset.unwrap_or(0);

    match state
        .store
        .list_statuses(query.service_id.as_deref(), limit, offset)
    {
        Ok(records) => Json(records).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// GET /status/latest
pub async fn get_latest_statuses(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.latest_statuses() {
        Ok(records) => Json(records).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// Filter parameter for GET /status/count.
#[derive(Deserialize)]
pub struct CountQuery {
    pub service_id: Option<String>,
}

/// GET /status/count?service_id
pub async fn get_status_count(
    State(state): State<ApiState>,
    Query(query): Query<CountQuery>,
) -> impl IntoResponse {
    match state.store.count_statuses(query.service_id.as_deref()) {
        Ok(count) => Json(serde_json::json!({ "count": count })).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}
