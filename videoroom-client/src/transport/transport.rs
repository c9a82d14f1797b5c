use async_trait::async_trait;
use videoroom_core::{HandleId, OutboundEnvelope};

/// Outbound half of the gateway connection, implemented by the surrounding
/// application (websocket, HTTP long-poll, test harness).
///
/// Inbound envelopes are fed back through [`crate::transport::Gateway::dispatch`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Attaches a new handle to `plugin` and returns its server-assigned id.
    async fn attach(&self, plugin: &str) -> anyhow::Result<HandleId>;

    /// Writes one envelope to the gateway.
    async fn send(&self, envelope: OutboundEnvelope) -> anyhow::Result<()>;
}
