use crate::events::{ChangeEvent, ChangeFeed};
use crate::snapshot::SnapshotStore;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use sw_core::traits::AccessClient;
use sw_core::types::ResourceId;
use tokio::sync::{RwLock, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Lifecycle of one subscription's poller.
///
/// `Initializing` covers the seed fetch, `Polling` the recurring loop, and
/// `Stopped` is terminal (reached only through the stop handle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PollState {
    Initializing,
    Polling,
    Stopped,
}

/// Observable state of one subscription, including the latest poll error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub state: PollState,
    pub last_error: Option<String>,
    pub last_polled_at: Option<i64>,
    pub principal_count: usize,
}

impl SubscriptionStatus {
    pub(crate) fn new() -> Self {
        Self {
            state: PollState::Initializing,
            last_error: None,
            last_polled_at: None,
            principal_count: 0,
        }
    }
}

/// One resource's fetch-and-diff loop.
///
/// Ticks never overlap: the loop awaits the in-flight fetch before asking
/// the interval for the next tick, and missed ticks are skipped rather
/// than queued, so at most one fetch per resource is ever in flight.
pub(crate) struct Poller {
    pub(crate) resource: ResourceId,
    pub(crate) client: Arc<dyn AccessClient>,
    pub(crate) store: Arc<SnapshotStore>,
    pub(crate) feed: Arc<ChangeFeed>,
    pub(crate) status: Arc<RwLock<SubscriptionStatus>>,
    pub(crate) poll_interval: Duration,
}

impl Poller {
    pub(crate) async fn run(self, mut stop_rx: watch::Receiver<()>) {
        self.seed().await;
        {
            let mut status = self.status.write().await;
            status.state = PollState::Polling;
        }

        let mut tick = tokio::time::interval(self.poll_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The interval's first tick completes immediately; the seed fetch
        // already covered it.
        tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.poll_once().await;
                }
                _ = stop_rx.changed() => {
                    break;
                }
            }
        }

        let mut status = self.status.write().await;
        status.state = PollState::Stopped;
        info!(resource = %self.resource, "poller stopped");
    }

    /// Initializing: one fetch to establish the baseline before the loop,
    /// so the first recurring tick diffs against something meaningful.
    /// A failed seed leaves the baseline absent (empty) and is recorded;
    /// polling starts regardless.
    async fn seed(&self) {
        match self.client.fetch_permissions(&self.resource).await {
            Ok(snapshot) => {
                debug!(
                    resource = %self.resource,
                    principals = snapshot.len(),
                    "baseline snapshot seeded"
                );
                let mut status = self.status.write().await;
                status.principal_count = snapshot.len();
                status.last_polled_at = Some(Utc::now().timestamp());
                drop(status);
                self.store.replace(self.resource.clone(), snapshot);
            }
            Err(e) => {
                warn!(
                    resource = %self.resource,
                    error = %e,
                    "seed fetch failed; starting with empty baseline"
                );
                let mut status = self.status.write().await;
                status.last_error = Some(e.to_string());
            }
        }
    }

    async fn poll_once(&self) {
        match self.client.fetch_permissions(&self.resource).await {
            Ok(current) => {
                let previous = self.store.get(&self.resource).unwrap_or_default();
                let added = current.added_since(&previous);
                let removed = current.removed_since(&previous);
                let timestamp = Utc::now().timestamp();

                if !added.is_empty() {
                    info!(
                        resource = %self.resource,
                        count = added.len(),
                        "principals gained access"
                    );
                    self.feed.publish(ChangeEvent::Added {
                        resource: self.resource.clone(),
                        principals: added,
                        timestamp,
                    });
                }

                if !removed.is_empty() {
                    info!(
                        resource = %self.resource,
                        count = removed.len(),
                        "principals lost access"
                    );
                    self.feed.publish(ChangeEvent::Removed {
                        resource: self.resource.clone(),
                        principals: removed,
                        snapshot: current.clone(),
                        timestamp,
                    });
                }

                let mut status = self.status.write().await;
                status.last_error = None;
                status.last_polled_at = Some(timestamp);
                status.principal_count = current.len();
                drop(status);

                // Unconditional, even when nothing changed.
                self.store.replace(self.resource.clone(), current);
            }
            Err(e) => {
                // A failed tick is a skip: no snapshot mutation, no event,
                // and only explicit cancellation ends the subscription.
                warn!(
                    resource = %self.resource,
                    error = %e,
                    "permission poll failed; skipping tick"
                );
                let mut status = self.status.write().await;
                status.last_error = Some(e.to_string());
            }
        }
    }
}
