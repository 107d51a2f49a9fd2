use std::sync::Arc;
use sw_core::error::{QueryError, QueryResult};
use tokio::sync::RwLock;
use tracing::info;

/// Holds the current bearer token for the drive client.
///
/// Empty until an authorization flow completes; after that it holds exactly
/// one opaque token until overwritten (last-writer-wins). Callers borrow the
/// token per request and never store it. No expiry tracking: a downstream
/// 401 and an empty provider are equally terminal for a single query.
#[derive(Clone, Default)]
pub struct TokenProvider {
    token: Arc<RwLock<Option<String>>>,
}

impl TokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_token(&self, token: String) {
        let mut guard = self.token.write().await;
        *guard = Some(token);
        info!("access token stored");
    }

    pub async fn token(&self) -> QueryResult<String> {
        self.token
            .read()
            .await
            .clone()
            .ok_or(QueryError::NotAuthenticated)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }
}
