//! Admin HTTP surface: health check and read-only CRUD views.
//!
//! `GET /health` — optional `X-Health-Token` when configured.
//! `GET /users`, `/users/{id}/lists`, `/users/{id}/events`, `/audit?limit=`
//! — require `X-API-Key` when `api_secret_key` is set; open in dev.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use mordomo_core::config::GatewayConfig;
use mordomo_store::Store;

#[derive(Clone)]
pub struct AdminState {
    pub store: Arc<Store>,
    pub config: GatewayConfig,
}

pub fn build_router(state: AdminState) -> axum::Router {
    let cors = cors_layer(&state.config.cors_origins);
    axum::Router::new()
        .route("/health", get(health))
        .route("/users", get(list_users))
        .route("/users/{id}/lists", get(user_lists))
        .route("/users/{id}/events", get(user_events))
        .route("/audit", get(audit))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &str) -> CorsLayer {
    if origins.trim() == "*" {
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .split(',')
        .filter_map(|o| o.trim().parse().ok())
        .collect();
    CorsLayer::new().allow_origin(parsed).allow_methods(Any).allow_headers(Any)
}

fn check_health_token(state: &AdminState, headers: &HeaderMap) -> bool {
    match &state.config.health_check_token {
        Some(token) => headers
            .get("x-health-token")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == token)
            .unwrap_or(false),
        None => true,
    }
}

fn check_api_key(state: &AdminState, headers: &HeaderMap) -> bool {
    match &state.config.api_secret_key {
        Some(key) => headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == key)
            .unwrap_or(false),
        None => true,
    }
}

async fn health(State(state): State<AdminState>, headers: HeaderMap) -> impl IntoResponse {
    if !check_health_token(&state, &headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"status": "unauthorized"})));
    }
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn list_users(State(state): State<AdminState>, headers: HeaderMap) -> impl IntoResponse {
    if !check_api_key(&state, &headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"})));
    }
    match state.store.list_users(100) {
        Ok(users) => {
            let out: Vec<_> = users
                .iter()
                .map(|u| {
                    json!({
                        "id": u.id,
                        "phone": u.phone_display,
                        "name": u.preferred_name,
                        "lang": u.lang,
                        "tz": u.tz_iana,
                        "created_at": u.created_at,
                    })
                })
                .collect();
            (StatusCode::OK, Json(json!({"users": out})))
        }
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "db"}))),
    }
}

async fn user_lists(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    if !check_api_key(&state, &headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"})));
    }
    match state.store.list_lists(id) {
        Ok(lists) => {
            let out: Vec<_> = lists
                .iter()
                .map(|(l, count)| json!({"id": l.id, "name": l.name, "open_items": count}))
                .collect();
            (StatusCode::OK, Json(json!({"lists": out})))
        }
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "db"}))),
    }
}

async fn user_events(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    if !check_api_key(&state, &headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"})));
    }
    match state.store.upcoming_events(id, Utc::now(), 100) {
        Ok(events) => {
            let out: Vec<_> = events
                .iter()
                .map(|e| json!({"id": e.id, "tipo": e.tipo, "nome": e.nome(), "data_at": e.data_at}))
                .collect();
            (StatusCode::OK, Json(json!({"events": out})))
        }
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "db"}))),
    }
}

#[derive(Deserialize)]
struct AuditQuery {
    limit: Option<usize>,
}

async fn audit(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Query(q): Query<AuditQuery>,
) -> impl IntoResponse {
    if !check_api_key(&state, &headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"})));
    }
    let limit = q.limit.unwrap_or(100).min(500);
    match state.store.recent_audit(limit) {
        Ok(entries) => {
            let out: Vec<_> = entries
                .iter()
                .map(|a| {
                    json!({
                        "user_id": a.user_id,
                        "action": a.action,
                        "resource": a.resource,
                        "created_at": a.created_at,
                    })
                })
                .collect();
            (StatusCode::OK, Json(json!({"audit": out})))
        }
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "db"}))),
    }
}
