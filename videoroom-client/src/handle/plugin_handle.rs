use crate::error::{Result, SignalingError};
use crate::handle::transactions::{Settlement, TransactionReply, Transactions};
use crate::transport::Transport;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use videoroom_core::{
    AckKind, HandleId, IceCandidate, InboundEnvelope, InboundKind, Jsep, OutboundEnvelope,
    Payload, RequestKind, TransactionId,
};

/// Receives every inbound envelope that is not a transaction reply.
pub type EventCallback = Arc<dyn Fn(HandleId, InboundEnvelope) + Send + Sync>;

/// A session attached to one server-side plugin.
///
/// Owns its own transaction id space. After [`PluginHandle::detach`] every
/// pending transaction fails with [`SignalingError::Detached`] and new ones are
/// refused.
pub struct PluginHandle {
    id: HandleId,
    plugin: String,
    transport: Arc<dyn Transport>,
    transactions: Transactions,
    detached: AtomicBool,
    on_event: EventCallback,
}

impl PluginHandle {
    pub(crate) fn new(
        id: HandleId,
        plugin: String,
        transport: Arc<dyn Transport>,
        on_event: EventCallback,
    ) -> Self {
        Self {
            id,
            plugin,
            transport,
            transactions: Transactions::new(id),
            detached: AtomicBool::new(false),
            on_event,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    /// Number of transactions still awaiting their reply.
    pub fn pending(&self) -> usize {
        self.transactions.len()
    }

    pub(crate) fn owns(&self, transaction: &TransactionId) -> bool {
        self.transactions.contains(transaction)
    }

    /// Sends a request and waits for the reply of kind `expected`.
    pub async fn transact(
        &self,
        kind: RequestKind,
        payload: Payload,
        expected: AckKind,
    ) -> Result<TransactionReply> {
        self.ensure_attached()?;
        self.send_and_wait(kind, payload, expected).await
    }

    pub async fn message(
        &self,
        body: Value,
        jsep: Option<Jsep>,
        expected: AckKind,
    ) -> Result<TransactionReply> {
        let payload = match jsep {
            Some(jsep) => Payload::body(body).with_jsep(jsep),
            None => Payload::body(body),
        };
        self.transact(RequestKind::Message, payload, expected).await
    }

    /// Fire-and-forget: no waiter is registered for trickle requests.
    pub async fn trickle(&self, candidate: IceCandidate) -> Result<()> {
        self.ensure_attached()?;

        let envelope = OutboundEnvelope {
            janus: RequestKind::Trickle,
            transaction: TransactionId::new(),
            handle_id: self.id,
            payload: Payload::candidate(candidate),
        };
        self.transport
            .send(envelope)
            .await
            .map_err(SignalingError::Transport)
    }

    /// Detaches from the plugin. Pending transactions are rejected before the
    /// detach request goes out; calling this twice is a no-op.
    pub async fn detach(&self) -> Result<()> {
        if !self.mark_detached() {
            return Ok(());
        }

        self.send_and_wait(RequestKind::Detach, Payload::default(), AckKind::Success)
            .await
            .map(|_| ())
    }

    /// Like [`PluginHandle::detach`], but only the local teardown happens
    /// before returning. The detach request is sent from a spawned task and
    /// `on_failure` receives its error, if any.
    pub(crate) fn detach_in_background<F>(self: &Arc<Self>, on_failure: F)
    where
        F: FnOnce(SignalingError) + Send + 'static,
    {
        if !self.mark_detached() {
            return;
        }

        // registered now so the reply routes even if it beats the task
        let (transaction, rx) = self
            .transactions
            .register(RequestKind::Detach, AckKind::Success);
        let handle = Arc::clone(self);
        tokio::spawn(async move {
            let result = handle
                .send_registered(RequestKind::Detach, transaction, Payload::default(), rx)
                .await;
            if let Err(e) = result {
                on_failure(e);
            }
        });
    }

    /// Delivers an inbound envelope routed to this handle.
    pub fn dispatch(&self, envelope: InboundEnvelope) {
        if self.transactions.settle(&envelope) != Settlement::NotPending {
            return;
        }

        match envelope.janus {
            InboundKind::Error => {
                warn!(
                    "Handle {} got an error for unknown transaction {:?}: {:?}",
                    self.id, envelope.transaction, envelope.error
                );
            }
            InboundKind::Ack | InboundKind::Success => {
                debug!(
                    "Handle {} ignoring stray {:?} for {:?}",
                    self.id, envelope.janus, envelope.transaction
                );
            }
            _ if self.is_detached() => {
                debug!("Handle {} is detached, dropping {:?}", self.id, envelope.janus);
            }
            _ => (self.on_event)(self.id, envelope),
        }
    }

    /// Flags the handle detached and rejects pending transactions. Returns
    /// `false` if it already was.
    fn mark_detached(&self) -> bool {
        if self.detached.swap(true, Ordering::SeqCst) {
            return false;
        }

        self.transactions.fail_all();
        info!("Detaching handle {} from {}", self.id, self.plugin);
        true
    }

    fn ensure_attached(&self) -> Result<()> {
        if self.is_detached() {
            return Err(SignalingError::Detached(self.id));
        }
        Ok(())
    }

    async fn send_and_wait(
        &self,
        kind: RequestKind,
        payload: Payload,
        expected: AckKind,
    ) -> Result<TransactionReply> {
        let (transaction, rx) = self.transactions.register(kind, expected);

        // detach may have run between the caller's check and the registration
        if kind != RequestKind::Detach && self.is_detached() {
            self.transactions.cancel(&transaction);
            return Err(SignalingError::Detached(self.id));
        }

        self.send_registered(kind, transaction, payload, rx).await
    }

    async fn send_registered(
        &self,
        kind: RequestKind,
        transaction: TransactionId,
        payload: Payload,
        rx: oneshot::Receiver<Result<TransactionReply>>,
    ) -> Result<TransactionReply> {
        let envelope = OutboundEnvelope {
            janus: kind,
            transaction: transaction.clone(),
            handle_id: self.id,
            payload,
        };

        if let Err(e) = self.transport.send(envelope).await {
            self.transactions.cancel(&transaction);
            return Err(SignalingError::Transport(e));
        }

        rx.await.unwrap_or(Err(SignalingError::Detached(self.id)))
    }
}

impl fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHandle")
            .field("id", &self.id)
            .field("plugin", &self.plugin)
            .field("detached", &self.is_detached())
            .field("pending", &self.pending())
            .finish()
    }
}
