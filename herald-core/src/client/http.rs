//! reqwest implementations of the coordinator and broker clients

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::error::{check_response, json_with_limit, TransportError};
use super::{BrokerClient, CoordinatorClient};
use crate::config::HttpConfig;
use crate::identity::SubscriberIdentity;
use crate::models::{BrokerInfo, SubscriberRequest};

/// Build the HTTP client shared by the coordinator and broker clients.
///
/// Redirects are disabled so a request always reaches the address the
/// coordinator named.
pub fn build_http_client(config: &HttpConfig) -> Result<Client, TransportError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .timeout(Duration::from_secs(config.request_timeout_seconds))
        .pool_max_idle_per_host(10)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(Into::into)
}

fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Coordinator client
pub struct HttpCoordinatorClient {
    base_url: String,
    client: Client,
}

impl HttpCoordinatorClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

#[async_trait]
impl CoordinatorClient for HttpCoordinatorClient {
    async fn leader_address(&self) -> Result<String, TransportError> {
        let url = join(&self.base_url, "/coordinator/leader");
        let response = self.client.get(&url).send().await?;
        let response = check_response(response)?;

        let info: Option<BrokerInfo> = json_with_limit(response).await?;
        info.and_then(|i| i.connection_url)
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(TransportError::EmptyBody(url))
    }
}

/// Broker client
///
/// Stateless apart from the connection pool; the target leader is passed on
/// every call.
pub struct HttpBrokerClient {
    client: Client,
}

impl HttpBrokerClient {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    async fn put_subscription(
        &self,
        url: String,
        identity: &SubscriberIdentity,
        topic: &str,
    ) -> Result<(), TransportError> {
        let body = SubscriberRequest {
            id: identity.id(),
            topic: Some(topic),
            url: identity.callback_url(),
        };
        debug!(url = %url, topic = %topic, "Sending subscription request");

        let response = self.client.put(&url).json(&body).send().await?;
        check_response(response)?;
        Ok(())
    }
}

#[async_trait]
impl BrokerClient for HttpBrokerClient {
    async fn register(
        &self,
        leader: &str,
        identity: &SubscriberIdentity,
    ) -> Result<(), TransportError> {
        let url = join(leader, "/broker/register-subscriber");
        let body = SubscriberRequest {
            id: identity.id(),
            topic: None,
            url: identity.callback_url(),
        };

        let response = self.client.post(&url).json(&body).send().await?;
        check_response(response)?;
        Ok(())
    }

    async fn subscribe(
        &self,
        leader: &str,
        identity: &SubscriberIdentity,
        topic: &str,
    ) -> Result<(), TransportError> {
        self.put_subscription(join(leader, "/broker/subscribe"), identity, topic)
            .await
    }

    async fn unsubscribe(
        &self,
        leader: &str,
        identity: &SubscriberIdentity,
        topic: &str,
    ) -> Result<(), TransportError> {
        self.put_subscription(join(leader, "/broker/unsubscribe"), identity, topic)
            .await
    }

    async fn list_topics(
        &self,
        leader: &str,
        identity: &SubscriberIdentity,
    ) -> Result<Option<Vec<String>>, TransportError> {
        let url = join(leader, "/broker/gettopics");
        let response = self
            .client
            .get(&url)
            .query(&[("subscriberId", identity.id())])
            .send()
            .await?;

        let response = check_response(response)?;
        json_with_limit(response).await
    }
}
