use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity a subscriber presents to the broker
///
/// Created once at startup. The id is unique per process lifetime and the
/// callback URL is where the broker pushes messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberIdentity {
    id: u32,
    callback_url: String,
}

impl SubscriberIdentity {
    #[must_use]
    pub fn new(id: u32, callback_url: impl Into<String>) -> Self {
        Self {
            id,
            callback_url: callback_url.into(),
        }
    }

    /// Create an identity with a fresh id derived from a random UUID
    #[must_use]
    pub fn generate(callback_url: impl Into<String>) -> Self {
        Self::new(Self::id_from_uuid(Uuid::new_v4()), callback_url)
    }

    /// Fold a UUID into a non-negative 31-bit id
    #[must_use]
    pub fn id_from_uuid(uuid: Uuid) -> u32 {
        let bits = uuid.as_u128();
        let folded =
            (bits as u32) ^ ((bits >> 32) as u32) ^ ((bits >> 64) as u32) ^ ((bits >> 96) as u32);
        folded & 0x7fff_ffff
    }

    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }
}

impl std::fmt::Display for SubscriberIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.id, self.callback_url)
    }
}
