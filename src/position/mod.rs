//! Position stream module: the location capability the tracker consumes.

pub mod replay;
pub mod source;
pub mod types;

pub use replay::{parse_gpx, GpxReplaySource};
pub use source::{PositionSource, Subscription, SubscriptionFeed};
pub use types::{PositionError, PositionEvent, RawPosition, WatchOptions};
