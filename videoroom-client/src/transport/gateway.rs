use crate::error::{Result, SignalingError};
use crate::handle::{EventCallback, PluginHandle};
use crate::transport::Transport;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};
use videoroom_core::{HandleId, InboundEnvelope};

struct GatewayInner {
    transport: Arc<dyn Transport>,
    handles: DashMap<HandleId, Weak<PluginHandle>>,
}

/// The client's session with the gateway: attaches plugin handles and routes
/// inbound envelopes to them.
///
/// Handles are owned by the room sessions; the gateway only keeps weak
/// references and forgets a handle once it is dropped or fully detached.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

impl Gateway {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                transport,
                handles: DashMap::new(),
            }),
        }
    }

    pub async fn attach(&self, plugin: &str, on_event: EventCallback) -> Result<Arc<PluginHandle>> {
        let id = self
            .inner
            .transport
            .attach(plugin)
            .await
            .map_err(SignalingError::Transport)?;

        let handle = Arc::new(PluginHandle::new(
            id,
            plugin.to_owned(),
            self.inner.transport.clone(),
            on_event,
        ));

        self.prune();
        self.inner.handles.insert(id, Arc::downgrade(&handle));
        info!("Attached handle {} to {}", id, plugin);

        Ok(handle)
    }

    /// Routes an inbound envelope by its `sender`, falling back to the handle
    /// that owns its transaction id.
    pub fn dispatch(&self, envelope: InboundEnvelope) {
        let Some(handle) = self.route(&envelope) else {
            warn!(
                "No handle for {:?} (sender {:?}, transaction {:?})",
                envelope.janus, envelope.sender, envelope.transaction
            );
            return;
        };

        handle.dispatch(envelope);

        if handle.is_detached() && handle.pending() == 0 {
            debug!("Forgetting detached handle {}", handle.id());
            self.inner.handles.remove(&handle.id());
        }
    }

    /// Number of live handles known to the gateway.
    pub fn handle_count(&self) -> usize {
        self.prune();
        self.inner.handles.len()
    }

    fn route(&self, envelope: &InboundEnvelope) -> Option<Arc<PluginHandle>> {
        if let Some(sender) = envelope.sender {
            return self.lookup(sender);
        }

        let transaction = envelope.transaction.as_ref()?;
        self.inner
            .handles
            .iter()
            .filter_map(|entry| entry.value().upgrade())
            .find(|handle| handle.owns(transaction))
    }

    fn lookup(&self, id: HandleId) -> Option<Arc<PluginHandle>> {
        // clone out of the map so no shard lock is held while removing
        let weak = self.inner.handles.get(&id).map(|entry| entry.value().clone())?;
        let handle = weak.upgrade();
        if handle.is_none() {
            self.inner.handles.remove(&id);
        }
        handle
    }

    fn prune(&self) {
        self.inner.handles.retain(|_, weak| {
            weak.upgrade()
                .is_some_and(|handle| !handle.is_detached() || handle.pending() > 0)
        });
    }
}
