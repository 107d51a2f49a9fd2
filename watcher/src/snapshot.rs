use dashmap::DashMap;
use sw_core::types::{PermissionSnapshot, ResourceId};

/// Last-known permission snapshot per monitored resource.
///
/// Only the poller that owns a resource ever writes its entry; DashMap's
/// per-entry locking makes the replace atomic, so concurrent readers never
/// observe a partially updated set.
#[derive(Default)]
pub struct SnapshotStore {
    snapshots: DashMap<ResourceId, PermissionSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, resource: &ResourceId) -> Option<PermissionSnapshot> {
        self.snapshots.get(resource).map(|entry| entry.clone())
    }

    pub fn replace(&self, resource: ResourceId, snapshot: PermissionSnapshot) {
        self.snapshots.insert(resource, snapshot);
    }

    pub fn remove(&self, resource: &ResourceId) {
        self.snapshots.remove(resource);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use sw_core::types::PrincipalId;

    fn resource(name: &str) -> ResourceId {
        ResourceId::from_str(name).unwrap()
    }

    fn snapshot(ids: &[&str]) -> PermissionSnapshot {
        ids.iter()
            .map(|id| PrincipalId::from_str(id).unwrap())
            .collect()
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = SnapshotStore::new();
        assert!(store.get(&resource("a.txt")).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_replace_overwrites_whole_snapshot() {
        let store = SnapshotStore::new();
        store.replace(resource("a.txt"), snapshot(&["u1", "u2"]));
        store.replace(resource("a.txt"), snapshot(&["u3"]));

        let current = store.get(&resource("a.txt")).unwrap();
        assert_eq!(current.len(), 1);
        assert!(current.contains(&PrincipalId::from_str("u3").unwrap()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_resources_are_independent() {
        let store = SnapshotStore::new();
        store.replace(resource("a.txt"), snapshot(&["u1"]));
        store.replace(resource("b.txt"), snapshot(&["u2"]));

        store.remove(&resource("a.txt"));
        assert!(store.get(&resource("a.txt")).is_none());
        assert!(store.get(&resource("b.txt")).is_some());
    }
}
