pub mod fetcher;
pub mod render;
pub mod source;

pub use fetcher::{DashboardState, PollGuard, RefreshOutcome, SnapshotFetcher, DEFAULT_POLL_INTERVAL};
pub use render::{render_view, SortDirection, SortKey, SortSpec, ViewOptions};
pub use source::{FetchError, HttpSnapshotSource, SnapshotSource, StaticSnapshotSource};
