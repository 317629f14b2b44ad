//! Leader-aware subscriber session
//!
//! [`LeaderResolver`] finds the leader, [`RegistrationManager`] makes sure the
//! leader knows this subscriber, and [`SubscriptionManager`] keeps the local
//! subscription set in step with it. [`SubscriberSession`] wires the three
//! together over one identity and one pair of clients.

pub mod leader;
pub mod registration;
pub mod subscription;

use std::sync::Arc;
use tracing::info;

use crate::client::{
    build_http_client, BrokerClient, CoordinatorClient, HttpBrokerClient, HttpCoordinatorClient,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::identity::SubscriberIdentity;

pub use leader::LeaderResolver;
pub use registration::{Registration, RegistrationManager};
pub use subscription::SubscriptionManager;

/// Attempt bounds for session operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// Attempts per subscribe/unsubscribe, first try included
    pub subscription_attempts: u32,
    /// Attempts per topic listing
    pub topic_list_attempts: u32,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            subscription_attempts: 2,
            topic_list_attempts: 3,
        }
    }
}

/// One subscriber identity bound to the leader-aware managers
pub struct SubscriberSession {
    identity: Arc<SubscriberIdentity>,
    resolver: Arc<LeaderResolver>,
    registration: Arc<RegistrationManager>,
    subscriptions: SubscriptionManager,
}

impl SubscriberSession {
    pub fn new(
        identity: SubscriberIdentity,
        coordinator: Arc<dyn CoordinatorClient>,
        broker: Arc<dyn BrokerClient>,
        limits: SessionLimits,
    ) -> Self {
        let identity = Arc::new(identity);
        let resolver = Arc::new(LeaderResolver::new(coordinator));
        let registration = Arc::new(RegistrationManager::new(
            identity.clone(),
            resolver.clone(),
            broker.clone(),
        ));
        let subscriptions = SubscriptionManager::new(
            identity.clone(),
            resolver.clone(),
            registration.clone(),
            broker,
            limits,
        );

        Self {
            identity,
            resolver,
            registration,
            subscriptions,
        }
    }

    /// Build a session over HTTP clients with a freshly generated identity
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = build_http_client(&config.http)
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {e}")))?;

        let coordinator = Arc::new(HttpCoordinatorClient::new(
            config.coordinator.url.clone(),
            client.clone(),
        ));
        let broker = Arc::new(HttpBrokerClient::new(client));
        let limits = SessionLimits {
            subscription_attempts: config.subscriber.subscription_attempts,
            topic_list_attempts: config.subscriber.topic_list_attempts,
        };

        Ok(Self::new(
            SubscriberIdentity::generate(config.callback_url()),
            coordinator,
            broker,
            limits,
        ))
    }

    /// Resolve the leader and register with it
    pub async fn initialize(&self) -> Result<()> {
        self.subscriptions.resync().await?;
        if let Some(leader) = self.resolver.current() {
            info!(
                subscriber_id = self.identity.id(),
                leader = %leader.address,
                "Subscriber session ready"
            );
        }
        Ok(())
    }

    #[must_use]
    pub fn identity(&self) -> &SubscriberIdentity {
        &self.identity
    }

    #[must_use]
    pub fn resolver(&self) -> &LeaderResolver {
        &self.resolver
    }

    #[must_use]
    pub fn registration(&self) -> &RegistrationManager {
        &self.registration
    }

    #[must_use]
    pub const fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }
}
