// Managers Module
//
// Focused managers owned by the AttentionTracker:
// - BroadcastChannelManager: tokio broadcast channels for ticks and events

pub mod broadcast_manager;

pub use broadcast_manager::BroadcastChannelManager;
