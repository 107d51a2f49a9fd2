use crate::detector::{Poller, SubscriptionStatus};
use crate::events::{ChangeEvent, ChangeFeed};
use crate::snapshot::SnapshotStore;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use sw_core::traits::AccessClient;
use sw_core::types::{PermissionSnapshot, ResourceId};
use tokio::sync::{RwLock, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Outcome of a subscribe request.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Subscribed {
    pub started: bool,
}

struct Subscription {
    handle: JoinHandle<()>,
    stop_tx: watch::Sender<()>,
    status: Arc<RwLock<SubscriptionStatus>>,
}

/// Tracks which resources are actively polled and owns their pollers.
///
/// One poller per resource, guaranteed by inserting through the map entry
/// so concurrent subscribes cannot race a second one into existence.
/// There is no unsubscribe operation; pollers run until [`shutdown`].
///
/// [`shutdown`]: WatchEngine::shutdown
pub struct WatchEngine {
    client: Arc<dyn AccessClient>,
    store: Arc<SnapshotStore>,
    feed: Arc<ChangeFeed>,
    subscriptions: DashMap<ResourceId, Subscription>,
    poll_interval: Duration,
}

impl WatchEngine {
    pub fn new(client: Arc<dyn AccessClient>, poll_interval: Duration) -> Self {
        Self {
            client,
            store: Arc::new(SnapshotStore::new()),
            feed: Arc::new(ChangeFeed::new()),
            subscriptions: DashMap::new(),
            poll_interval,
        }
    }

    /// Starts a poller for `resource` unless one is already running.
    ///
    /// Idempotent: the second and later calls are no-ops returning
    /// `started = false` while the existing poller continues.
    pub fn ensure_subscribed(&self, resource: ResourceId) -> Subscribed {
        match self.subscriptions.entry(resource.clone()) {
            Entry::Occupied(_) => {
                debug!(resource = %resource, "already subscribed");
                Subscribed { started: false }
            }
            Entry::Vacant(entry) => {
                let (stop_tx, stop_rx) = watch::channel(());
                let status = Arc::new(RwLock::new(SubscriptionStatus::new()));

                let poller = Poller {
                    resource: resource.clone(),
                    client: Arc::clone(&self.client),
                    store: Arc::clone(&self.store),
                    feed: Arc::clone(&self.feed),
                    status: Arc::clone(&status),
                    poll_interval: self.poll_interval,
                };
                let handle = tokio::spawn(poller.run(stop_rx));

                entry.insert(Subscription {
                    handle,
                    stop_tx,
                    status,
                });
                info!(resource = %resource, "subscription started");
                Subscribed { started: true }
            }
        }
    }

    /// New receiver on the change-event feed.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }

    /// Last-known snapshot for a subscribed resource, if seeded yet.
    pub fn snapshot(&self, resource: &ResourceId) -> Option<PermissionSnapshot> {
        self.store.get(resource)
    }

    pub async fn status(&self, resource: &ResourceId) -> Option<SubscriptionStatus> {
        // Clone the Arc out before awaiting so the map shard lock is not
        // held across the await point.
        let status = self
            .subscriptions
            .get(resource)
            .map(|sub| Arc::clone(&sub.status))?;
        Some(status.read().await.clone())
    }

    pub fn subscriptions(&self) -> Vec<ResourceId> {
        self.subscriptions
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Stops every poller, waits for the tasks to finish and drops their
    /// snapshots. A later re-subscribe seeds a fresh baseline instead of
    /// diffing against stale state.
    pub async fn shutdown(&self) {
        let resources: Vec<ResourceId> = self
            .subscriptions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();

        for resource in resources {
            if let Some((_, subscription)) = self.subscriptions.remove(&resource) {
                let _ = subscription.stop_tx.send(());
                if let Err(e) = subscription.handle.await {
                    warn!(resource = %resource, error = %e, "poller task failed");
                }
            }
            self.store.remove(&resource);
        }
        info!("watch engine shut down");
    }
}
