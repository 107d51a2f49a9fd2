use crate::error::QueryResult;
use crate::types::{PermissionSnapshot, ResourceId};
use async_trait::async_trait;

/// The query seam the change detector polls through.
///
/// Implementations wrap the opaque remote permission API; the engine only
/// ever sees deduplicated snapshots and the typed error taxonomy.
#[async_trait]
pub trait AccessClient: Send + Sync {
    /// Fetches the deduplicated set of principals with access to `resource`.
    async fn fetch_permissions(&self, resource: &ResourceId)
    -> QueryResult<PermissionSnapshot>;
}
