// HTTP surface of the subscriber

pub mod error;
pub mod health;
pub mod subscriber;

use axum::Router;
use herald_core::{MessageQueue, SubscriberSession};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SubscriberSession>,
    pub messages: Arc<MessageQueue>,
}

/// Create the HTTP router with all routes
pub fn create_router(session: Arc<SubscriberSession>, messages: Arc<MessageQueue>) -> Router {
    let state = AppState { session, messages };

    Router::new()
        .merge(health::create_health_router())
        .nest("/subscriber", subscriber::create_subscriber_router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use herald_core::client::{build_http_client, HttpBrokerClient, HttpCoordinatorClient};
    use herald_core::config::HttpConfig;
    use herald_core::{SessionLimits, SubscriberIdentity};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn broker_env() -> (MockServer, MockServer) {
        let coordinator = MockServer::start().await;
        let broker = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coordinator/leader"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "connectionUrl": broker.uri() })),
            )
            .mount(&coordinator)
            .await;
        Mock::given(method("POST"))
            .and(path("/broker/register-subscriber"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&broker)
            .await;
        (coordinator, broker)
    }

    fn router(coordinator: &MockServer) -> (Router, Arc<SubscriberSession>) {
        let client = build_http_client(&HttpConfig::default()).unwrap();
        let session = Arc::new(SubscriberSession::new(
            SubscriberIdentity::new(42, "node-A"),
            Arc::new(HttpCoordinatorClient::new(coordinator.uri(), client.clone())),
            Arc::new(HttpBrokerClient::new(client)),
            SessionLimits::default(),
        ));
        let messages = Arc::new(MessageQueue::new(16));
        (create_router(session.clone(), messages), session)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_receive_then_drain_messages() {
        let (coordinator, _broker) = broker_env().await;
        let (app, _) = router(&coordinator);

        let packet = serde_json::json!({
            "topic": "weather",
            "message": "rain",
            "pid": 7,
            "timestamp": 1_700_000_000_000_i64
        });
        let response = app
            .clone()
            .oneshot(json_request("POST", "/subscriber/receive", packet))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(Request::get("/subscriber/receiveMessages").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let messages = body_json(response).await;
        assert_eq!(messages[0]["topic"], "weather");
        assert_eq!(messages[0]["message"], "rain");

        // Drained
        let response = app
            .oneshot(Request::get("/subscriber/receiveMessages").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_subscribe_endpoint() {
        let (coordinator, broker) = broker_env().await;
        Mock::given(method("PUT"))
            .and(path("/broker/subscribe"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&broker)
            .await;
        let (app, session) = router(&coordinator);

        let response = app
            .oneshot(json_request(
                "POST",
                "/subscriber/subscribe",
                serde_json::json!({"topic": "weather"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(session.subscriptions().is_subscribed("weather"));
    }

    #[tokio::test]
    async fn test_subscribe_requires_topic() {
        let (coordinator, _broker) = broker_env().await;
        let (app, _) = router(&coordinator);

        let response = app
            .oneshot(json_request("POST", "/subscriber/subscribe", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid request: topic is required.");
    }

    #[tokio::test]
    async fn test_subscribe_failure_maps_to_bad_gateway() {
        let (coordinator, broker) = broker_env().await;
        Mock::given(method("PUT"))
            .and(path("/broker/subscribe"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&broker)
            .await;
        let (app, session) = router(&coordinator);

        let response = app
            .oneshot(json_request(
                "POST",
                "/subscriber/subscribe",
                serde_json::json!({"topic": "weather"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(!session.subscriptions().is_subscribed("weather"));
    }

    #[tokio::test]
    async fn test_get_subscriber_id() {
        let (coordinator, _broker) = broker_env().await;
        let (app, _) = router(&coordinator);

        let response = app
            .oneshot(Request::get("/subscriber/getSubscriberId").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await, serde_json::json!(42));
    }

    #[tokio::test]
    async fn test_session_status() {
        let (coordinator, broker) = broker_env().await;
        let (app, session) = router(&coordinator);
        session.initialize().await.unwrap();

        let response = app
            .oneshot(Request::get("/health/session").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = body_json(response).await;
        assert_eq!(status["subscriberId"], 42);
        assert_eq!(status["leader"], broker.uri());
    }
}
