// Managers Module
//
// Focused manager classes owned by TrackerHandle.
//
// Each manager handles one specific concern:
// - BroadcastChannelManager: session snapshot broadcast channel
// - SensorSubscriptionManager: scoped step sensor subscription

pub mod broadcast_manager;
pub mod subscription_manager;

pub use broadcast_manager::BroadcastChannelManager;
pub use subscription_manager::SensorSubscriptionManager;
