use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::nutrition::wizard::Wizard;
use crate::persistence::PersistenceBridge;

pub type SharedWizard = Arc<Mutex<Wizard>>;

struct Entry {
    wizard: SharedWizard,
    last_seen: Instant,
}

/// Live wizards keyed by user. A missing entry is rebuilt from storage on
/// first access, so idle entries can be dropped at any time.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Entry>>>,
}

impl SessionRegistry {
    pub async fn get_or_restore(&self, owner: Uuid, bridge: &PersistenceBridge) -> SharedWizard {
        if let Some(entry) = self.inner.write().await.get_mut(&owner) {
            entry.last_seen = Instant::now();
            return entry.wizard.clone();
        }

        let snapshot = bridge.load_snapshot(owner).await;
        let last = bridge.load_result(owner).await;
        let wizard = Wizard::restore(
            snapshot,
            last.as_ref().map(|r| (r.summary.as_str(), &r.plan)),
        );

        // another request may have restored the same user meanwhile
        let mut map = self.inner.write().await;
        let entry = map.entry(owner).or_insert_with(|| {
            debug!(%owner, messages = wizard.messages().len(), "chat session restored");
            Entry {
                wizard: Arc::new(Mutex::new(wizard)),
                last_seen: Instant::now(),
            }
        });
        entry.last_seen = Instant::now();
        entry.wizard.clone()
    }

    pub async fn evict(&self, owner: Uuid) -> bool {
        self.inner.write().await.remove(&owner).is_some()
    }

    /// Drops sessions untouched for at least `max_idle`. Sessions that are
    /// locked, still referenced by a request, or waiting on a
    /// recommendation are kept. Returns how many were dropped.
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let mut map = self.inner.write().await;
        let before = map.len();
        map.retain(|_, entry| {
            if entry.last_seen.elapsed() < max_idle || Arc::strong_count(&entry.wizard) > 1 {
                return true;
            }
            match entry.wizard.try_lock() {
                Ok(wizard) => wizard.is_busy(),
                Err(_) => true,
            }
        });
        before - map.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

/// Periodically drops idle sessions; runs for the life of the process.
pub fn spawn_sweeper(registry: SessionRegistry, max_idle: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(max_idle.max(Duration::from_secs(1)) / 2);
        loop {
            ticker.tick().await;
            let evicted = registry.sweep_idle(max_idle).await;
            if evicted > 0 {
                let remaining = registry.len().await;
                info!(evicted, remaining, "idle chat sessions evicted");
            }
        }
    })
}
