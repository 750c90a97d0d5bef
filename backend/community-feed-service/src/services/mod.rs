pub mod engagement;
pub mod feed;
pub mod posts;
pub mod reconcile;

pub use engagement::{CounterAdjustment, CounterAdjustmentWarning, EngagementService, ToggleOutcome};
pub use feed::{FeedPage, FeedService};
pub use posts::{CreatePostInput, PostService};
pub use reconcile::{CounterReconciler, ReconcileReport};
