//! Outbound clients for the coordinator and the leader broker
//!
//! The session managers only see these traits; the reqwest-backed
//! implementations live in [`http`].

pub mod error;
pub mod http;

use async_trait::async_trait;

use crate::identity::SubscriberIdentity;

pub use error::TransportError;
pub use http::{build_http_client, HttpBrokerClient, HttpCoordinatorClient};

/// Leader lookup against the coordinator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CoordinatorClient: Send + Sync {
    /// Connection address of the current leader broker
    async fn leader_address(&self) -> Result<String, TransportError>;
}

/// Requests sent to a (believed) leader broker
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrokerClient: Send + Sync {
    async fn register(
        &self,
        leader: &str,
        identity: &SubscriberIdentity,
    ) -> Result<(), TransportError>;

    async fn subscribe(
        &self,
        leader: &str,
        identity: &SubscriberIdentity,
        topic: &str,
    ) -> Result<(), TransportError>;

    async fn unsubscribe(
        &self,
        leader: &str,
        identity: &SubscriberIdentity,
        topic: &str,
    ) -> Result<(), TransportError>;

    /// Topics available platform-wide; `None` when the broker sent no body
    async fn list_topics(
        &self,
        leader: &str,
        identity: &SubscriberIdentity,
    ) -> Result<Option<Vec<String>>, TransportError>;
}
