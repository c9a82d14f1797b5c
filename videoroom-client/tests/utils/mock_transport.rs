use anyhow::bail;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc};
use videoroom_client::Transport;
use videoroom_core::{HandleId, OutboundEnvelope, RequestKind};

/// Transport that records every outbound envelope instead of talking to a
/// gateway. Handle ids are assigned from 1 upwards.
pub struct MockTransport {
    next_handle: AtomicU64,
    fail_sends: AtomicBool,
    tx: mpsc::UnboundedSender<OutboundEnvelope>,
    sent: Mutex<Vec<OutboundEnvelope>>,
    attached: Mutex<Vec<String>>,
}

impl MockTransport {
    /// Creates the transport and the receiver the test reads requests from.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<OutboundEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            next_handle: AtomicU64::new(1),
            fail_sends: AtomicBool::new(false),
            tx,
            sent: Mutex::new(Vec::new()),
            attached: Mutex::new(Vec::new()),
        });
        (transport, rx)
    }

    /// Makes every following `send` fail.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<OutboundEnvelope> {
        self.sent.lock().await.clone()
    }

    pub async fn trickles(&self) -> Vec<OutboundEnvelope> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|e| e.janus == RequestKind::Trickle)
            .cloned()
            .collect()
    }

    pub async fn attached_plugins(&self) -> Vec<String> {
        self.attached.lock().await.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn attach(&self, plugin: &str) -> anyhow::Result<HandleId> {
        self.attached.lock().await.push(plugin.to_owned());
        Ok(HandleId(self.next_handle.fetch_add(1, Ordering::SeqCst)))
    }

    async fn send(&self, envelope: OutboundEnvelope) -> anyhow::Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            bail!("connection reset");
        }

        tracing::debug!(
            "[MockTransport] {:?} {:?} on handle {}",
            envelope.janus,
            envelope.request(),
            envelope.handle_id
        );
        self.sent.lock().await.push(envelope.clone());
        let _ = self.tx.send(envelope);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use videoroom_core::{Payload, TransactionId};

    #[tokio::test]
    async fn test_mock_transport_records_envelopes() {
        let (transport, mut rx) = MockTransport::new();

        assert_eq!(transport.attach("janus.plugin.videoroom").await.unwrap(), HandleId(1));
        assert_eq!(transport.attach("janus.plugin.videoroom").await.unwrap(), HandleId(2));

        let envelope = OutboundEnvelope {
            janus: RequestKind::Detach,
            transaction: TransactionId::from("t"),
            handle_id: HandleId(1),
            payload: Payload::default(),
        };
        transport.send(envelope.clone()).await.unwrap();

        assert_eq!(rx.recv().await, Some(envelope));
        assert_eq!(transport.sent().await.len(), 1);

        transport.fail_sends(true);
        let failed = OutboundEnvelope {
            janus: RequestKind::Detach,
            transaction: TransactionId::from("u"),
            handle_id: HandleId(2),
            payload: Payload::default(),
        };
        assert!(transport.send(failed).await.is_err());
    }
}
