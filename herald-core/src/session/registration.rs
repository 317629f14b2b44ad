//! Registration of the subscriber identity with the leader

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::leader::LeaderResolver;
use crate::client::BrokerClient;
use crate::error::{Error, Result};
use crate::identity::SubscriberIdentity;
use crate::models::LeaderEndpoint;

/// Outcome of [`RegistrationManager::ensure_registered`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// A register request was sent to this leader just now
    Fresh(LeaderEndpoint),
    /// Already registered with this leader epoch, nothing sent
    Existing(LeaderEndpoint),
}

impl Registration {
    #[must_use]
    pub const fn leader(&self) -> &LeaderEndpoint {
        match self {
            Self::Fresh(leader) | Self::Existing(leader) => leader,
        }
    }

    #[must_use]
    pub const fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }
}

/// Registers the subscriber at most once per leader epoch
pub struct RegistrationManager {
    identity: Arc<SubscriberIdentity>,
    resolver: Arc<LeaderResolver>,
    broker: Arc<dyn BrokerClient>,
    /// Leader epoch the last successful registration was made against.
    /// Held across the register call so concurrent callers don't both send.
    registered_epoch: Mutex<Option<u64>>,
}

impl RegistrationManager {
    pub fn new(
        identity: Arc<SubscriberIdentity>,
        resolver: Arc<LeaderResolver>,
        broker: Arc<dyn BrokerClient>,
    ) -> Self {
        Self {
            identity,
            resolver,
            broker,
            registered_epoch: Mutex::new(None),
        }
    }

    /// Register with the current leader unless already registered with it
    ///
    /// Resolves the leader first when none is cached; a coordinator failure
    /// is returned as is.
    pub async fn ensure_registered(&self) -> Result<Registration> {
        let leader = self.resolver.current_or_resolve().await?;
        self.ensure_registered_with(&leader).await
    }

    /// Register with a specific leader unless already registered with its epoch
    pub async fn ensure_registered_with(&self, leader: &LeaderEndpoint) -> Result<Registration> {
        let mut registered = self.registered_epoch.lock().await;
        if *registered == Some(leader.epoch) {
            debug!(
                leader = %leader.address,
                epoch = leader.epoch,
                "Already registered with leader"
            );
            return Ok(Registration::Existing(leader.clone()));
        }

        match self.broker.register(&leader.address, &self.identity).await {
            Ok(()) => {
                *registered = Some(leader.epoch);
                info!(
                    subscriber_id = self.identity.id(),
                    leader = %leader.address,
                    epoch = leader.epoch,
                    "Subscriber registered with leader broker"
                );
                Ok(Registration::Fresh(leader.clone()))
            }
            Err(e) => {
                warn!(
                    subscriber_id = self.identity.id(),
                    leader = %leader.address,
                    error = %e,
                    "Failed to register subscriber"
                );
                self.resolver.invalidate(leader);
                Err(Error::RegistrationFailed(e.to_string()))
            }
        }
    }

    /// Forget the registration so the next operation registers again
    pub async fn invalidate(&self) {
        *self.registered_epoch.lock().await = None;
    }

    /// Whether registration was made against this leader epoch
    #[cfg(test)]
    pub async fn is_registered_with(&self, leader: &LeaderEndpoint) -> bool {
        *self.registered_epoch.lock().await == Some(leader.epoch)
    }

    #[must_use]
    pub fn identity(&self) -> &SubscriberIdentity {
        &self.identity
    }
}
