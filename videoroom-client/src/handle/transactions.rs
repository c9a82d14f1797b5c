use crate::error::{Result, SignalingError};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use videoroom_core::{AckKind, HandleId, InboundEnvelope, InboundKind, Jsep, RequestKind, TransactionId};

/// Settled value of a transaction: the plugin payload and optional JSEP.
#[derive(Debug, Clone, Default)]
pub struct TransactionReply {
    pub data: Option<Value>,
    pub jsep: Option<Jsep>,
}

impl TransactionReply {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref()?.get(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key)?.as_str()
    }
}

struct Waiter {
    request: RequestKind,
    expected: AckKind,
    tx: oneshot::Sender<Result<TransactionReply>>,
}

/// Outcome of offering an inbound envelope to the pending set.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Settlement {
    /// No pending transaction carries this id.
    NotPending,
    /// Intermediate acknowledgment; the waiter stays registered.
    Acknowledged,
    Settled,
}

/// Pending transactions of a single plugin handle.
pub(crate) struct Transactions {
    handle: HandleId,
    pending: DashMap<TransactionId, Waiter>,
}

impl Transactions {
    pub(crate) fn new(handle: HandleId) -> Self {
        Self {
            handle,
            pending: DashMap::new(),
        }
    }

    pub(crate) fn register(
        &self,
        request: RequestKind,
        expected: AckKind,
    ) -> (TransactionId, oneshot::Receiver<Result<TransactionReply>>) {
        let (tx, rx) = oneshot::channel();
        let waiter = Waiter {
            request,
            expected,
            tx,
        };

        loop {
            match self.pending.entry(TransactionId::new()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    let id = slot.key().clone();
                    slot.insert(waiter);
                    return (id, rx);
                }
            }
        }
    }

    pub(crate) fn cancel(&self, id: &TransactionId) {
        self.pending.remove(id);
    }

    pub(crate) fn contains(&self, id: &TransactionId) -> bool {
        self.pending.contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn settle(&self, envelope: &InboundEnvelope) -> Settlement {
        let Some(id) = envelope.transaction.as_ref() else {
            return Settlement::NotPending;
        };

        let outcome = {
            let Some(waiter) = self.pending.get(id) else {
                return Settlement::NotPending;
            };
            match &envelope.janus {
                InboundKind::Error => Some(Err(server_error(envelope))),
                kind if kind.settles(waiter.expected) => Some(reply(envelope)),
                _ => None,
            }
        };

        let Some(outcome) = outcome else {
            debug!(
                "Transaction {} on handle {} acknowledged with {:?}",
                id, self.handle, envelope.janus
            );
            return Settlement::Acknowledged;
        };

        let Some((_, waiter)) = self.pending.remove(id) else {
            return Settlement::NotPending;
        };
        if waiter.tx.send(outcome).is_err() {
            debug!(
                "{:?} transaction {} settled after its caller went away",
                waiter.request, id
            );
        }
        Settlement::Settled
    }

    /// Rejects every pending waiter with `Detached`.
    pub(crate) fn fail_all(&self) -> usize {
        let ids: Vec<TransactionId> = self.pending.iter().map(|e| e.key().clone()).collect();
        let mut failed = 0;

        for id in ids {
            let Some((_, waiter)) = self.pending.remove(&id) else {
                continue;
            };
            failed += 1;
            let _ = waiter.tx.send(Err(SignalingError::Detached(self.handle)));
        }

        if failed > 0 {
            warn!(
                "Rejected {} pending transaction(s) on detached handle {}",
                failed, self.handle
            );
        }
        failed
    }
}

fn server_error(envelope: &InboundEnvelope) -> SignalingError {
    match &envelope.error {
        Some(body) => SignalingError::Server {
            code: body.code,
            reason: body.reason.clone(),
        },
        None => SignalingError::Server {
            code: 0,
            reason: "error reply without details".to_owned(),
        },
    }
}

/// Plugin failures arrive as ordinary replies carrying `error_code`.
fn reply(envelope: &InboundEnvelope) -> Result<TransactionReply> {
    let data = envelope.plugin_data().cloned();

    if let Some(code) = data.as_ref().and_then(|d| d.get("error_code")).and_then(Value::as_i64) {
        let reason = data
            .as_ref()
            .and_then(|d| d.get("error"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        return Err(SignalingError::Server { code, reason });
    }

    Ok(TransactionReply {
        data,
        jsep: envelope.jsep.clone(),
    })
}
