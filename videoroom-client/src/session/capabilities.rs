use crate::error::Result;
use crate::session::session_core::SessionCore;
use async_trait::async_trait;
use videoroom_core::IceCandidate;

/// Sessions that negotiate a peer connection with the gateway.
#[async_trait]
pub trait Negotiable: Send + Sync {
    fn core(&self) -> &SessionCore;

    /// Trickles a local candidate unless the session's filter drops it.
    /// Returns whether the candidate was sent.
    async fn submit_candidate(&self, candidate: IceCandidate) -> Result<bool> {
        self.core().submit_candidate(candidate).await
    }

    async fn offer_sdp(&self) -> Option<String> {
        self.core().offer_sdp().await
    }

    async fn answer_sdp(&self) -> Option<String> {
        self.core().answer_sdp().await
    }

    async fn detach(&self) -> Result<()> {
        self.core().detach().await
    }
}

/// Sessions whose audio/video can be switched while active.
#[async_trait]
pub trait Reconfigurable: Negotiable {
    async fn reconfigure(&self, audio: bool, video: bool) -> Result<()>;

    async fn start_audio(&self) -> Result<()> {
        let media = self.core().media().await;
        self.reconfigure(true, media.video).await
    }

    async fn stop_audio(&self) -> Result<()> {
        let media = self.core().media().await;
        self.reconfigure(false, media.video).await
    }

    async fn start_video(&self) -> Result<()> {
        let media = self.core().media().await;
        self.reconfigure(media.audio, true).await
    }

    async fn stop_video(&self) -> Result<()> {
        let media = self.core().media().await;
        self.reconfigure(media.audio, false).await
    }
}

/// Sessions that announce their departure to the room before detaching.
#[async_trait]
pub trait Leavable: Negotiable {
    async fn leave(&self) -> Result<()>;
}
