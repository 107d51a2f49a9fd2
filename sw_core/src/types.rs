use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Opaque identifier of a user/identity that holds access to a resource.
///
/// Equality is exact string match; no normalization is performed.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord,
)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(id: String) -> Option<Self> {
        if id.is_empty() { None } else { Some(Self(id)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PrincipalId {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string()).ok_or_else(|| anyhow::anyhow!("Invalid principal ID"))
    }
}

/// The drive path/name identifying a remote file being monitored.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord,
)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: String) -> Option<Self> {
        if id.is_empty() { None } else { Some(Self(id)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ResourceId {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string()).ok_or_else(|| anyhow::anyhow!("Invalid resource ID"))
    }
}

/// The complete set of principals authorized for one resource at one point
/// in time. Duplicate-free by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSnapshot {
    principals: HashSet<PrincipalId>,
}

impl PermissionSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }

    pub fn contains(&self, principal: &PrincipalId) -> bool {
        self.principals.contains(principal)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrincipalId> {
        self.principals.iter()
    }

    /// Principals present in `self` but not in `previous`.
    pub fn added_since(&self, previous: &Self) -> HashSet<PrincipalId> {
        self.principals
            .difference(&previous.principals)
            .cloned()
            .collect()
    }

    /// Principals present in `previous` but no longer in `self`.
    pub fn removed_since(&self, previous: &Self) -> HashSet<PrincipalId> {
        previous
            .principals
            .difference(&self.principals)
            .cloned()
            .collect()
    }
}

impl FromIterator<PrincipalId> for PermissionSnapshot {
    fn from_iter<I: IntoIterator<Item = PrincipalId>>(iter: I) -> Self {
        Self {
            principals: iter.into_iter().collect(),
        }
    }
}

impl From<HashSet<PrincipalId>> for PermissionSnapshot {
    fn from(principals: HashSet<PrincipalId>) -> Self {
        Self { principals }
    }
}
