//! Shared gateway plumbing types.

/// Broadcast to every subsystem when the gateway shuts down.
#[derive(Debug, Clone)]
pub enum ShutdownMessage {
    ShutdownAll,
}
