//! Subscriber endpoints
//!
//! `/subscriber/receive` is the callback the broker pushes messages to; the
//! rest lets a local client drive the session and read what arrived.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use herald_core::{MessageSink, Packet};
use serde::Deserialize;

use super::{AppError, AppResult, AppState};

/// Subscriber router (nested under `/subscriber`)
pub fn create_subscriber_router() -> Router<AppState> {
    Router::new()
        .route("/receive", post(receive_message))
        .route("/receiveMessages", get(receive_messages))
        .route("/getTopics", get(get_topics))
        .route("/getSubscriberId", get(get_subscriber_id))
        .route("/subscriptions", get(get_subscriptions))
        .route("/subscribe", post(subscribe))
        .route("/unsubscribe", post(unsubscribe))
}

#[derive(Debug, Deserialize)]
pub struct TopicRequest {
    #[serde(default)]
    pub topic: Option<String>,
}

impl TopicRequest {
    fn topic(&self) -> AppResult<&str> {
        self.topic
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::bad_request("Invalid request: topic is required."))
    }
}

/// Broker push callback
async fn receive_message(State(state): State<AppState>, Json(packet): Json<Packet>) -> StatusCode {
    state.messages.accept(packet);
    StatusCode::OK
}

/// Drain messages received since the last call
async fn receive_messages(State(state): State<AppState>) -> Json<Vec<Packet>> {
    Json(state.messages.drain())
}

async fn get_topics(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.session.subscriptions().available_topics().await)
}

async fn get_subscriber_id(State(state): State<AppState>) -> Json<u32> {
    Json(state.session.identity().id())
}

async fn get_subscriptions(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.session.subscriptions().subscribed_topics())
}

async fn subscribe(
    State(state): State<AppState>,
    Json(req): Json<TopicRequest>,
) -> AppResult<String> {
    let topic = req.topic()?;
    state.session.subscriptions().subscribe(topic).await?;
    Ok(format!("Subscribed successfully to: {}", topic.trim()))
}

async fn unsubscribe(
    State(state): State<AppState>,
    Json(req): Json<TopicRequest>,
) -> AppResult<String> {
    let topic = req.topic()?;
    state.session.subscriptions().unsubscribe(topic).await?;
    Ok(format!("Unsubscribed successfully from: {}", topic.trim()))
}
