use crate::error::SignalingError;
use crate::session::Negotiable;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use videoroom_core::{IceCandidate, Jsep};

/// The host's WebRTC peer connection, as far as signaling needs it.
#[async_trait]
pub trait NegotiationEngine: Send + Sync {
    async fn create_offer(&self) -> anyhow::Result<Jsep>;

    async fn create_answer(&self) -> anyhow::Result<Jsep>;

    async fn set_local_description(&self, jsep: &Jsep) -> anyhow::Result<()>;

    async fn set_remote_description(&self, jsep: &Jsep) -> anyhow::Result<()>;
}

/// Submits every candidate read from `candidates` to `session` until the
/// channel closes or the session is detached.
pub fn forward_candidates<S>(
    session: Arc<S>,
    mut candidates: mpsc::Receiver<IceCandidate>,
) -> JoinHandle<()>
where
    S: Negotiable + ?Sized + 'static,
{
    tokio::spawn(async move {
        while let Some(candidate) = candidates.recv().await {
            match session.submit_candidate(candidate).await {
                Ok(true) => {}
                Ok(false) => debug!("Candidate filtered on handle {}", session.core().handle_id()),
                Err(SignalingError::Detached(handle)) => {
                    debug!("Handle {} detached, no more candidates", handle);
                    break;
                }
                Err(e) => {
                    if session.core().state().await.is_terminal() {
                        break;
                    }
                    warn!("Failed to submit candidate: {}", e);
                }
            }
        }
    })
}

pub(crate) fn negotiation_error(e: anyhow::Error) -> SignalingError {
    SignalingError::Negotiation(e)
}
