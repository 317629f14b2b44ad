//! Wire types exchanged with the coordinator and the leader broker

use serde::{Deserialize, Serialize};

/// Address of the leader broker as last resolved from the coordinator
///
/// The epoch increases on every successful resolution, so two endpoints with
/// the same address but different epochs are different leader terms as far
/// as registration is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderEndpoint {
    pub address: String,
    pub epoch: u64,
}

impl LeaderEndpoint {
    #[must_use]
    pub fn new(address: impl Into<String>, epoch: u64) -> Self {
        Self {
            address: address.into(),
            epoch,
        }
    }
}

impl std::fmt::Display for LeaderEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (epoch {})", self.address, self.epoch)
    }
}

/// Coordinator answer to a leader lookup
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerInfo {
    #[serde(default)]
    pub connection_url: Option<String>,
}

/// Body of register, subscribe and unsubscribe requests
#[derive(Debug, Clone, Serialize)]
pub struct SubscriberRequest<'a> {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<&'a str>,
    pub url: &'a str,
}

/// Message pushed by the broker to the callback address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub topic: String,
    pub message: String,
    /// Publisher id
    #[serde(default)]
    pub pid: Option<i64>,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

/// Publish time as sent by the broker: epoch millis or a formatted string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(i64),
    Text(String),
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Millis(ms) => write!(f, "{ms}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}
