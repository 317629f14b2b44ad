pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod models;
pub mod session;
pub mod sink;

#[cfg(test)]
pub mod test_helpers;

pub use config::Config;
pub use error::{Error, Result};
pub use identity::SubscriberIdentity;
pub use models::{LeaderEndpoint, Packet};
pub use session::{
    LeaderResolver, RegistrationManager, SessionLimits, SubscriberSession, SubscriptionManager,
};
pub use sink::{MessageQueue, MessageSink};
