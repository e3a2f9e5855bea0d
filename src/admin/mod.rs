//! Operator HTTP surface over the roster service.
//!
//! Every route sits behind the bearer-key middleware in `auth.rs`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::fetch::RosterService;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub service: Arc<RosterService>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(service: Arc<RosterService>, api_key: &str) -> Self {
        Self {
            service,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/members/{partition}", get(get_members))
        .route("/admin/metrics", get(get_metrics))
        .route("/admin/metrics/reset", post(reset_metrics))
        .route("/admin/breakers", get(get_breakers))
        .route("/admin/warming", get(list_warming))
        .route(
            "/admin/warming/{partition}",
            post(start_warming).delete(stop_warming),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
