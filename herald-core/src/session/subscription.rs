//! Topic subscriptions against the leader broker
//!
//! The local subscription set is the record of what this subscriber believes
//! the broker delivers to it. It only changes after the broker confirms a
//! request, and a failed request never leaves a half-applied topic behind.

use dashmap::DashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::leader::LeaderResolver;
use super::registration::RegistrationManager;
use super::SessionLimits;
use crate::client::{BrokerClient, TransportError};
use crate::error::{Error, Result};
use crate::identity::SubscriberIdentity;
use crate::models::LeaderEndpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Subscribe,
    Unsubscribe,
}

impl Action {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
        }
    }

    /// Whether the local set already reflects the requested state
    const fn is_satisfied(self, present: bool) -> bool {
        match self {
            Self::Subscribe => present,
            Self::Unsubscribe => !present,
        }
    }
}

/// Validate a topic name, returning it trimmed
fn validate_topic(topic: &str) -> Result<&str> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(Error::InvalidTopic("topic name must not be empty".to_string()));
    }
    Ok(topic)
}

/// Owns the subscription set and keeps it in step with the leader
pub struct SubscriptionManager {
    identity: Arc<SubscriberIdentity>,
    resolver: Arc<LeaderResolver>,
    registration: Arc<RegistrationManager>,
    broker: Arc<dyn BrokerClient>,
    topics: DashSet<String>,
    limits: SessionLimits,
}

impl SubscriptionManager {
    pub fn new(
        identity: Arc<SubscriberIdentity>,
        resolver: Arc<LeaderResolver>,
        registration: Arc<RegistrationManager>,
        broker: Arc<dyn BrokerClient>,
        limits: SessionLimits,
    ) -> Self {
        Self {
            identity,
            resolver,
            registration,
            broker,
            topics: DashSet::new(),
            limits,
        }
    }

    /// Subscribe to a topic; a no-op if already subscribed
    pub async fn subscribe(&self, topic: &str) -> Result<()> {
        self.mutate(Action::Subscribe, topic).await
    }

    /// Unsubscribe from a topic; a no-op if not subscribed
    pub async fn unsubscribe(&self, topic: &str) -> Result<()> {
        self.mutate(Action::Unsubscribe, topic).await
    }

    /// Whether the topic is in the local subscription set
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.topics.contains(topic.trim())
    }

    /// Sorted snapshot of the local subscription set
    pub fn subscribed_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.topics.iter().map(|t| t.key().clone()).collect();
        topics.sort();
        topics
    }

    async fn mutate(&self, action: Action, topic: &str) -> Result<()> {
        let topic = validate_topic(topic)?;

        if action.is_satisfied(self.topics.contains(topic)) {
            debug!(
                topic = %topic,
                action = action.as_str(),
                "Local subscription set already up to date"
            );
            return Ok(());
        }

        let mut last_error = String::new();
        for attempt in 1..=self.limits.subscription_attempts {
            match self.attempt(action, topic).await {
                Ok(leader) => {
                    match action {
                        Action::Subscribe => {
                            self.topics.insert(topic.to_string());
                        }
                        Action::Unsubscribe => {
                            self.topics.remove(topic);
                        }
                    }
                    info!(
                        topic = %topic,
                        action = action.as_str(),
                        leader = %leader.address,
                        attempt,
                        "Subscription change confirmed by leader"
                    );
                    return Ok(());
                }
                // Never reached a leader at all
                Err(Error::CoordinatorUnreachable(reason)) if attempt == 1 => {
                    warn!(
                        topic = %topic,
                        action = action.as_str(),
                        "No leader broker, request aborted"
                    );
                    return Err(Error::LeaderUnavailable(reason));
                }
                Err(e) => {
                    warn!(
                        topic = %topic,
                        action = action.as_str(),
                        attempt,
                        max_attempts = self.limits.subscription_attempts,
                        error = %e,
                        "Subscription request failed"
                    );
                    last_error = e.to_string();
                }
            }
        }

        Err(Error::SubscriptionFailed {
            topic: topic.to_string(),
            reason: last_error,
        })
    }

    /// One pass of resolve, register, send
    ///
    /// Any broker failure invalidates the believed leader so the next pass
    /// resolves again; a 403 also drops the registration.
    async fn attempt(&self, action: Action, topic: &str) -> Result<LeaderEndpoint> {
        let leader = self.resolver.current_or_resolve().await?;

        let registration = self.registration.ensure_registered_with(&leader).await?;
        if registration.is_fresh() {
            self.replay(&leader, Some(topic)).await;
        }

        debug!(
            topic = %topic,
            action = action.as_str(),
            leader = %leader.address,
            "Sending request to leader"
        );
        let result = match action {
            Action::Subscribe => {
                self.broker
                    .subscribe(&leader.address, &self.identity, topic)
                    .await
            }
            Action::Unsubscribe => {
                self.broker
                    .unsubscribe(&leader.address, &self.identity, topic)
                    .await
            }
        };

        match result {
            Ok(()) => Ok(leader),
            Err(e) => {
                self.resolver.invalidate(&leader);
                Err(self.broker_failure(&leader, e).await)
            }
        }
    }

    async fn broker_failure(&self, leader: &LeaderEndpoint, err: TransportError) -> Error {
        if err.is_forbidden() {
            self.registration.invalidate().await;
            Error::NotRegistered
        } else {
            Error::LeaderUnavailable(format!("{}: {err}", leader.address))
        }
    }

    /// Re-send every subscription in the set to a leader that just learned
    /// about this subscriber, except `skip`
    ///
    /// Failures are logged and leave the set alone; the topic is re-sent the
    /// next time registration happens.
    async fn replay(&self, leader: &LeaderEndpoint, skip: Option<&str>) -> usize {
        let topics: Vec<String> = self
            .subscribed_topics()
            .into_iter()
            .filter(|t| Some(t.as_str()) != skip)
            .collect();

        let mut replayed = 0;
        for topic in topics {
            match self.broker.subscribe(&leader.address, &self.identity, &topic).await {
                Ok(()) => {
                    replayed += 1;
                    debug!(
                        topic = %topic,
                        leader = %leader.address,
                        "Replayed subscription to new leader"
                    );
                }
                Err(e) => {
                    warn!(
                        topic = %topic,
                        leader = %leader.address,
                        error = %e,
                        "Failed to replay subscription"
                    );
                }
            }
        }
        if replayed > 0 {
            info!(
                leader = %leader.address,
                epoch = leader.epoch,
                replayed,
                "Subscriptions reconciled with leader"
            );
        }
        replayed
    }

    /// Make sure the current leader knows this subscriber and its topics
    ///
    /// Registers when needed and, after a fresh registration, re-sends the
    /// whole subscription set. Returns how many topics were replayed.
    pub async fn resync(&self) -> Result<usize> {
        let registration = self.registration.ensure_registered().await?;
        if registration.is_fresh() {
            Ok(self.replay(registration.leader(), None).await)
        } else {
            Ok(0)
        }
    }

    /// Topics available platform-wide
    ///
    /// Tries up to `topic_list_attempts` leaders, registering with each one
    /// first. A 403 from the broker is returned as [`Error::NotRegistered`]
    /// and drops the registration.
    pub async fn try_available_topics(&self) -> Result<Vec<String>> {
        let mut last_error = String::new();

        for attempt in 1..=self.limits.topic_list_attempts {
            let leader = match self.resolver.current_or_resolve().await {
                Ok(leader) => leader,
                Err(e) => {
                    warn!(attempt, error = %e, "Failed to determine leader broker");
                    last_error = e.to_string();
                    continue;
                }
            };

            // A failed registration has already invalidated the leader
            match self.registration.ensure_registered_with(&leader).await {
                Ok(registration) if registration.is_fresh() => {
                    self.replay(&leader, None).await;
                }
                Ok(_) => {}
                Err(e) => {
                    last_error = e.to_string();
                    continue;
                }
            }

            match self.broker.list_topics(&leader.address, &self.identity).await {
                Ok(Some(topics)) => {
                    info!(
                        count = topics.len(),
                        leader = %leader.address,
                        "Fetched available topics"
                    );
                    return Ok(topics);
                }
                Ok(None) => {
                    warn!(leader = %leader.address, "Received empty topic list from broker");
                    return Ok(Vec::new());
                }
                Err(e) if e.is_forbidden() => {
                    self.registration.invalidate().await;
                    return Err(Error::NotRegistered);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        leader = %leader.address,
                        error = %e,
                        "Leader broker unavailable"
                    );
                    self.resolver.invalidate(&leader);
                    last_error = e.to_string();
                }
            }
        }

        Err(Error::LeaderUnavailable(format!(
            "no leader answered after {} attempt(s): {last_error}",
            self.limits.topic_list_attempts
        )))
    }

    /// Topics available platform-wide, empty when they cannot be listed
    pub async fn available_topics(&self) -> Vec<String> {
        match self.try_available_topics().await {
            Ok(topics) => topics,
            Err(Error::NotRegistered) => {
                warn!(
                    subscriber_id = self.identity.id(),
                    "Subscriber id is not registered with the leader"
                );
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Returning empty topic list");
                Vec::new()
            }
        }
    }
}
