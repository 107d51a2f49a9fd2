use crate::config::GraphConfig;
use reqwest::Client;
use sw_core::error::{QueryError, QueryResult};
use serde::Deserialize;
use tracing::{debug, info};

/// OAuth2 authorization-code exchange against the Azure AD authority.
///
/// This is deliberately the whole surface: building the login URL and
/// redeeming the one-time code for a bearer token. Refresh and expiry are
/// out of scope; the resulting token is handed to the [`TokenProvider`]
/// and used until replaced.
///
/// [`TokenProvider`]: crate::token::TokenProvider
pub struct AuthFlow {
    http_client: Client,
    config: GraphConfig,
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
}

impl AuthFlow {
    pub fn new(config: GraphConfig) -> QueryResult<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(QueryError::transport)?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// The authority URL the browser is redirected to for login.
    pub fn authorize_url(&self) -> String {
        format!(
            "{}/oauth2/v2.0/authorize?client_id={}&response_type=code&redirect_uri={}&response_mode=query&scope={}",
            self.config.authority_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&self.config.scope_string())
        )
    }

    /// Redeems an authorization code for an access token.
    pub async fn redeem_code(&self, code: &str) -> QueryResult<String> {
        let token_url = format!("{}/oauth2/v2.0/token", self.config.authority_url);

        let body = format!(
            "client_id={}&client_secret={}&code={}&redirect_uri={}&scope={}&grant_type=authorization_code",
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.client_secret),
            urlencoding::encode(code),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&self.config.scope_string())
        );

        debug!(url = %token_url, "redeeming authorization code");

        let response = self
            .http_client
            .post(&token_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(QueryError::transport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_body = response.text().await.unwrap_or_default();
            return Err(QueryError::OAuth(format!(
                "Token request failed: {} - {}",
                status, error_body
            )));
        }

        let token_response: OAuthTokenResponse = response
            .json()
            .await
            .map_err(|e| QueryError::OAuth(format!("Failed to parse token response: {}", e)))?;

        info!("access token obtained");
        Ok(token_response.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow() -> AuthFlow {
        AuthFlow::new(GraphConfig {
            client_id: "client-1".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:3000/auth/redirect".to_string(),
            ..GraphConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_authorize_url_carries_client_and_scopes() {
        let url = flow().authorize_url();
        assert!(url.starts_with("https://login.microsoftonline.com/common/oauth2/v2.0/authorize?"));
        assert!(url.contains("client_id=client-1"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=files.read%20user.read"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fredirect"));
    }
}
