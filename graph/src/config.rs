use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Azure AD authority base, without the `/oauth2/v2.0/...` suffix.
    #[serde(default = "default_authority_url")]
    pub authority_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Graph API base. Overridable so tests can point at a local mock.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_authority_url() -> String {
    "https://login.microsoftonline.com/common".to_string()
}

fn default_scopes() -> Vec<String> {
    vec!["files.read".to_string(), "user.read".to_string()]
}

fn default_base_url() -> String {
    "https://graph.microsoft.com/v1.0".to_string()
}

impl GraphConfig {
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            authority_url: default_authority_url(),
            scopes: default_scopes(),
            base_url: default_base_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GraphConfig::default();
        assert_eq!(config.base_url, "https://graph.microsoft.com/v1.0");
        assert_eq!(config.scope_string(), "files.read user.read");
    }
}
