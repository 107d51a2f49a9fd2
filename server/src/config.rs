use graph::GraphConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    pub graph: GraphConfig,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_poll_interval() -> u64 {
    1
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    /// Reads the TOML config named by `SHAREWATCH_CONFIG` (default
    /// `sharewatch.toml`), then applies environment overrides for the
    /// values that should not live in a file.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("SHAREWATCH_CONFIG")
            .unwrap_or_else(|_| "sharewatch.toml".to_string());
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("cannot read config {path}: {e}"))?;
        let mut config: Self = toml::from_str(&raw)?;

        if let Ok(secret) = std::env::var("SHAREWATCH_CLIENT_SECRET") {
            config.graph.client_secret = secret;
        }
        if let Ok(addr) = std::env::var("SHAREWATCH_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
            [graph]
            client_id = "client-1"
            client_secret = "secret"
            redirect_uri = "http://localhost:3000/auth/redirect"
            "#,
        )
        .unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:3000");
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(
            config.graph.authority_url,
            "https://login.microsoftonline.com/common"
        );
        assert_eq!(config.graph.scopes, vec!["files.read", "user.read"]);
    }

    #[test]
    fn test_explicit_values_win() {
        let config: Config = toml::from_str(
            r#"
            listen_addr = "127.0.0.1:8080"
            poll_interval_secs = 5

            [graph]
            client_id = "client-1"
            client_secret = "secret"
            redirect_uri = "http://localhost:8080/auth/redirect"
            authority_url = "https://login.microsoftonline.com/my-tenant"
            "#,
        )
        .unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert!(config.graph.authority_url.ends_with("my-tenant"));
    }
}
