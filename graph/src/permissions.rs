use serde::Deserialize;
use sw_core::types::PrincipalId;

/// One raw permission entry as returned by
/// `GET /me/drive/root:/{path}:/permissions`.
///
/// The upstream representation is heterogeneous: a grantee can appear under
/// `grantedTo` as a single identity set, under `grantedTo` as an array
/// (observed upstream quirk), or under `grantedToIdentities`. Link-based
/// grants carry none of these.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionEntry {
    #[serde(default)]
    granted_to: Option<GrantedTo>,
    #[serde(default)]
    granted_to_identities: Option<Vec<IdentitySet>>,
}

// `Many` must come first: serde tries untagged variants in declaration
// order, and a JSON array could otherwise be coerced into the struct
// variant via serde's positional struct-from-sequence rules.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GrantedTo {
    Many(Vec<IdentitySet>),
    Single(IdentitySet),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentitySet {
    #[serde(default)]
    user: Option<Identity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Identity {
    id: String,
}

impl PermissionEntry {
    /// Resolves this entry to the principal it grants access to.
    ///
    /// Precedence, preserved exactly from the upstream behavior:
    /// 1. a single direct grantee with a user identity;
    /// 2. a direct grantee that is itself a non-empty array: first
    ///    element's user (do not "fix" this without flagging it);
    /// 3. a non-empty `grantedToIdentities` list: first element's user;
    /// 4. otherwise unresolvable (e.g. link-based sharing): `None`.
    pub fn principal(&self) -> Option<PrincipalId> {
        match &self.granted_to {
            Some(GrantedTo::Single(set)) if set.user.is_some() => {
                set.user.as_ref().and_then(identity_principal)
            }
            Some(GrantedTo::Many(sets)) if !sets.is_empty() => {
                sets[0].user.as_ref().and_then(identity_principal)
            }
            _ => self
                .granted_to_identities
                .as_ref()
                .and_then(|sets| sets.first())
                .and_then(|set| set.user.as_ref())
                .and_then(identity_principal),
        }
    }
}

fn identity_principal(identity: &Identity) -> Option<PrincipalId> {
    PrincipalId::new(identity.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(value: serde_json::Value) -> PermissionEntry {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_direct_grantee() {
        let entry = entry(json!({
            "grantedTo": { "user": { "id": "u1", "displayName": "User One" } }
        }));
        assert_eq!(entry.principal().unwrap().as_str(), "u1");
    }

    #[test]
    fn test_direct_grantee_as_array() {
        let entry = entry(json!({
            "grantedTo": [
                { "user": { "id": "u1" } },
                { "user": { "id": "u2" } }
            ]
        }));
        assert_eq!(entry.principal().unwrap().as_str(), "u1");
    }

    #[test]
    fn test_granted_to_identities_fallback() {
        let entry = entry(json!({
            "grantedToIdentities": [
                { "user": { "id": "u3" } },
                { "user": { "id": "u4" } }
            ]
        }));
        assert_eq!(entry.principal().unwrap().as_str(), "u3");
    }

    #[test]
    fn test_direct_grantee_takes_precedence_over_identities() {
        let entry = entry(json!({
            "grantedTo": { "user": { "id": "direct" } },
            "grantedToIdentities": [ { "user": { "id": "listed" } } ]
        }));
        assert_eq!(entry.principal().unwrap().as_str(), "direct");
    }

    #[test]
    fn test_direct_grantee_without_user_falls_through() {
        // grantedTo present but application-only: the identities list wins.
        let entry = entry(json!({
            "grantedTo": { "application": { "id": "app-1" } },
            "grantedToIdentities": [ { "user": { "id": "u5" } } ]
        }));
        assert_eq!(entry.principal().unwrap().as_str(), "u5");
    }

    #[test]
    fn test_link_based_grant_is_unresolvable() {
        let entry = entry(json!({
            "link": { "type": "view", "scope": "anonymous" }
        }));
        assert!(entry.principal().is_none());
    }

    #[test]
    fn test_empty_identities_is_unresolvable() {
        let entry = entry(json!({ "grantedToIdentities": [] }));
        assert!(entry.principal().is_none());
    }
}
