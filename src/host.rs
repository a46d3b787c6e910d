use tokio::sync::broadcast;

use crate::types::ReloadPayload;

/// The single capability the listener needs from a host development server:
/// broadcasting a reload payload to its connected clients.
///
/// Everything else about the host (client connections, transport, routing)
/// stays on the host's side of this seam.
pub trait HostServer: Send + Sync {
    fn broadcast(&self, payload: &ReloadPayload);
}

/// Host bridge backed by a tokio broadcast channel.
///
/// Host integrations subscribe and forward received payloads to their own
/// client connections. Sending with no subscribers is not an error.
pub struct ChannelHost {
    broadcaster: broadcast::Sender<ReloadPayload>,
}

impl ChannelHost {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (broadcaster, _) = broadcast::channel(capacity);
        Self { broadcaster }
    }

    /// Get a receiver for broadcast reload payloads.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadPayload> {
        self.broadcaster.subscribe()
    }
}

impl Default for ChannelHost {
    fn default() -> Self {
        Self::new(16)
    }
}

impl HostServer for ChannelHost {
    fn broadcast(&self, payload: &ReloadPayload) {
        // No connected clients yet is fine, drop the payload
        let _ = self.broadcaster.send(payload.clone());
    }
}
