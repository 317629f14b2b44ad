//! Test helpers for herald-core tests
//!
//! In-memory coordinator and broker fakes that record every call, so tests
//! can assert which leader a request reached and how often.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::client::{BrokerClient, CoordinatorClient, TransportError};
use crate::identity::SubscriberIdentity;
use crate::session::{SessionLimits, SubscriberSession};

/// Coordinator answering from a scripted sequence; the last entry repeats
pub struct FakeCoordinator {
    responses: Mutex<VecDeque<Option<String>>>,
    calls: AtomicUsize,
}

impl FakeCoordinator {
    pub fn sequence(responses: &[Option<&str>]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| r.map(str::to_string)).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn leader(address: &str) -> Self {
        Self::sequence(&[Some(address)])
    }

    pub fn unreachable() -> Self {
        Self::sequence(&[None])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CoordinatorClient for FakeCoordinator {
    async fn leader_address(&self) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock();
        let next = if responses.len() > 1 {
            responses.pop_front().flatten()
        } else {
            responses.front().cloned().flatten()
        };
        next.ok_or_else(|| TransportError::Network("coordinator connection refused".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerCall {
    Register { leader: String },
    Subscribe { leader: String, topic: String },
    Unsubscribe { leader: String, topic: String },
    ListTopics { leader: String },
}

/// Broker that answers OK unless the target leader was killed
pub struct FakeBroker {
    calls: Mutex<Vec<BrokerCall>>,
    dead: Mutex<HashSet<String>>,
    forbidden: AtomicUsize,
    topics: Mutex<Option<Vec<String>>>,
    /// Leaders that accepted a registration
    registered: Mutex<HashSet<String>>,
    require_registration: bool,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            dead: Mutex::new(HashSet::new()),
            forbidden: AtomicUsize::new(0),
            topics: Mutex::new(None),
            registered: Mutex::new(HashSet::new()),
            require_registration: false,
        }
    }

    /// Answer 403 to subscription and listing requests sent to a leader the
    /// subscriber has not registered with
    pub fn requiring_registration(mut self) -> Self {
        self.require_registration = true;
        self
    }

    pub fn with_topics(self, topics: &[&str]) -> Self {
        *self.topics.lock() = Some(topics.iter().map(|t| (*t).to_string()).collect());
        self
    }

    /// Every later request to this leader fails with a network error
    pub fn kill(&self, leader: &str) {
        self.dead.lock().insert(leader.to_string());
    }

    /// The next `n` subscription or listing requests answer 403
    pub fn forbid_next(&self, n: usize) {
        self.forbidden.store(n, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<BrokerCall> {
        self.calls.lock().clone()
    }

    pub fn register_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, BrokerCall::Register { .. }))
            .count()
    }

    pub fn subscription_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, BrokerCall::Subscribe { .. } | BrokerCall::Unsubscribe { .. }))
            .count()
    }

    fn answer(
        &self,
        call: BrokerCall,
        leader: &str,
        may_forbid: bool,
    ) -> Result<(), TransportError> {
        self.calls.lock().push(call);
        if self.dead.lock().contains(leader) {
            return Err(TransportError::Network(format!("{leader}: connection refused")));
        }
        if !may_forbid {
            return Ok(());
        }
        let unregistered =
            self.require_registration && !self.registered.lock().contains(leader);
        let forbidden = unregistered
            || self
                .forbidden
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
        if forbidden {
            return Err(TransportError::Forbidden {
                url: leader.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BrokerClient for FakeBroker {
    async fn register(
        &self,
        leader: &str,
        _identity: &SubscriberIdentity,
    ) -> Result<(), TransportError> {
        let call = BrokerCall::Register {
            leader: leader.to_string(),
        };
        self.answer(call, leader, false)?;
        self.registered.lock().insert(leader.to_string());
        Ok(())
    }

    async fn subscribe(
        &self,
        leader: &str,
        _identity: &SubscriberIdentity,
        topic: &str,
    ) -> Result<(), TransportError> {
        let call = BrokerCall::Subscribe {
            leader: leader.to_string(),
            topic: topic.to_string(),
        };
        self.answer(call, leader, true)
    }

    async fn unsubscribe(
        &self,
        leader: &str,
        _identity: &SubscriberIdentity,
        topic: &str,
    ) -> Result<(), TransportError> {
        let call = BrokerCall::Unsubscribe {
            leader: leader.to_string(),
            topic: topic.to_string(),
        };
        self.answer(call, leader, true)
    }

    async fn list_topics(
        &self,
        leader: &str,
        _identity: &SubscriberIdentity,
    ) -> Result<Option<Vec<String>>, TransportError> {
        let call = BrokerCall::ListTopics {
            leader: leader.to_string(),
        };
        self.answer(call, leader, true)?;
        Ok(self.topics.lock().clone())
    }
}

/// Session over the given fakes with identity `{42, "node-A"}`
pub fn test_session(
    coordinator: Arc<FakeCoordinator>,
    broker: Arc<FakeBroker>,
) -> SubscriberSession {
    SubscriberSession::new(
        SubscriberIdentity::new(42, "node-A"),
        coordinator,
        broker,
        SessionLimits::default(),
    )
}
