//! In-process event broadcaster.

pub mod channel_broadcaster;

pub use channel_broadcaster::{ChannelBroadcaster, Subscription};
