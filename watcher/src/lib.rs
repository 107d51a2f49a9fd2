pub mod detector;
pub mod events;
pub mod registry;
pub mod snapshot;

pub use detector::{PollState, SubscriptionStatus};
pub use events::{ChangeEvent, ChangeFeed};
pub use registry::{Subscribed, WatchEngine};
pub use snapshot::SnapshotStore;
