//! Health check endpoints
//!
//! Provides simple health check for monitoring probes.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use crate::http::AppState;

/// Health check router
pub fn create_health_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/session", get(session_status))
}

/// Basic health check (always returns OK if server is running)
pub async fn health_check() -> impl IntoResponse {
    "OK"
}

/// Leader and subscription state as currently believed by this subscriber
pub async fn session_status(State(state): State<AppState>) -> impl IntoResponse {
    let session = &state.session;
    let leader = session.resolver().current();

    Json(json!({
        "subscriberId": session.identity().id(),
        "callbackUrl": session.identity().callback_url(),
        "leader": leader.as_ref().map(|l| l.address.clone()),
        "leaderEpoch": leader.as_ref().map(|l| l.epoch),
        "subscriptions": session.subscriptions().subscribed_topics(),
        "bufferedMessages": state.messages.len(),
    }))
}
