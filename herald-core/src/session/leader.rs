//! Leader discovery through the coordinator

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::client::CoordinatorClient;
use crate::error::{Error, Result};
use crate::models::LeaderEndpoint;

/// Resolves and caches the current leader broker
///
/// The cached endpoint is only a hint: leadership can move between the
/// moment it is read and the moment it is used. Callers that see a failed
/// call to the believed leader call [`LeaderResolver::invalidate`] and
/// resolve again; the resolver never polls on its own.
pub struct LeaderResolver {
    coordinator: Arc<dyn CoordinatorClient>,
    current: RwLock<Option<LeaderEndpoint>>,
    next_epoch: AtomicU64,
}

impl LeaderResolver {
    pub fn new(coordinator: Arc<dyn CoordinatorClient>) -> Self {
        Self {
            coordinator,
            current: RwLock::new(None),
            next_epoch: AtomicU64::new(1),
        }
    }

    /// Ask the coordinator for the current leader and replace the cache
    ///
    /// On failure the cache is cleared, so a stale address from an earlier
    /// success is never handed out after a failed re-resolve.
    pub async fn resolve(&self) -> Result<LeaderEndpoint> {
        match self.coordinator.leader_address().await {
            Ok(address) => {
                let epoch = self.next_epoch.fetch_add(1, Ordering::SeqCst);
                let leader = LeaderEndpoint::new(address, epoch);
                info!(leader = %leader.address, epoch, "Resolved leader broker");
                *self.current.write() = Some(leader.clone());
                Ok(leader)
            }
            Err(e) => {
                *self.current.write() = None;
                warn!(error = %e, "Failed to resolve leader broker from coordinator");
                Err(Error::CoordinatorUnreachable(e.to_string()))
            }
        }
    }

    /// Cached leader without contacting the coordinator
    pub fn current(&self) -> Option<LeaderEndpoint> {
        self.current.read().clone()
    }

    /// Cached leader, resolving first when none is known
    pub async fn current_or_resolve(&self) -> Result<LeaderEndpoint> {
        if let Some(leader) = self.current() {
            return Ok(leader);
        }
        self.resolve().await
    }

    /// Forget the cached leader
    ///
    /// Only clears the cache if it still holds `seen`, so a concurrent
    /// caller that already re-resolved to a newer epoch is not undone.
    pub fn invalidate(&self, seen: &LeaderEndpoint) {
        let mut current = self.current.write();
        if current.as_ref().is_some_and(|c| c.epoch == seen.epoch) {
            warn!(leader = %seen.address, epoch = seen.epoch, "Invalidating cached leader");
            *current = None;
        }
    }
}
