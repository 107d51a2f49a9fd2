pub mod error;
pub mod traits;
pub mod types;

pub use error::{QueryError, QueryResult};
pub use traits::AccessClient;
pub use types::{PermissionSnapshot, PrincipalId, ResourceId};
