use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use sw_core::types::{PermissionSnapshot, PrincipalId, ResourceId};
use tokio::sync::broadcast;

/// A detected change in the set of principals with access to one resource.
///
/// Emitted on the feed, never stored. Events for one resource are ordered
/// because only that resource's poller emits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChangeEvent {
    #[serde(rename_all = "camelCase")]
    Added {
        resource: ResourceId,
        principals: HashSet<PrincipalId>,
        timestamp: i64,
    },
    /// Principals that lost access, plus the new full snapshot (the shape
    /// the original removal signal carried).
    #[serde(rename_all = "camelCase")]
    Removed {
        resource: ResourceId,
        principals: HashSet<PrincipalId>,
        snapshot: PermissionSnapshot,
        timestamp: i64,
    },
}

impl ChangeEvent {
    pub fn resource(&self) -> &ResourceId {
        match self {
            Self::Added { resource, .. } | Self::Removed { resource, .. } => resource,
        }
    }
}

/// Broadcast fan-out for change events.
///
/// Live subscribers get every event; a lagging receiver observes
/// `RecvError::Lagged` instead of blocking the pollers.
pub struct ChangeFeed {
    event_tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(1024);
        Self { event_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.event_tx.subscribe()
    }

    /// Publishes an event; returns the number of live receivers.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.event_tx.send(event).unwrap_or(0)
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn added(resource: &str, ids: &[&str]) -> ChangeEvent {
        ChangeEvent::Added {
            resource: ResourceId::from_str(resource).unwrap(),
            principals: ids
                .iter()
                .map(|id| PrincipalId::from_str(id).unwrap())
                .collect(),
            timestamp: 0,
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let feed = ChangeFeed::new();
        let mut rx = feed.subscribe();

        let receivers = feed.publish(added("a.txt", &["u1"]));
        assert_eq!(receivers, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.resource().as_str(), "a.txt");
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let feed = ChangeFeed::new();
        assert_eq!(feed.publish(added("a.txt", &["u1"])), 0);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let json = serde_json::to_value(added("a.txt", &["u1"])).unwrap();
        assert_eq!(json["type"], "added");
        assert_eq!(json["resource"], "a.txt");
    }
}
