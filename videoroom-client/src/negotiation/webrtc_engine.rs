use crate::negotiation::engine::NegotiationEngine;
use crate::negotiation::engine_config::EngineConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use videoroom_core::{IceCandidate, Jsep, SdpKind};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

const CANDIDATE_BUFFER: usize = 256;

/// [`NegotiationEngine`] backed by a webrtc-rs peer connection.
pub struct WebrtcEngine {
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebrtcEngine {
    /// Builds the peer connection. Locally gathered candidates are delivered
    /// on the returned receiver; the end of gathering arrives as the
    /// completion marker.
    pub async fn new(config: EngineConfig) -> Result<(Self, mpsc::Receiver<IceCandidate>)> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: config.ice_servers,
                username: config.username.unwrap_or_default(),
                credential: config.credential.unwrap_or_default(),
            }],
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                Box::pin(async move {
                    info!("Peer connection state changed: {:?}", s);
                })
            },
        ));

        let (candidate_tx, candidate_rx) = mpsc::channel(CANDIDATE_BUFFER);
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = candidate_tx.clone();

            Box::pin(async move {
                let candidate = match c {
                    Some(candidate) => match candidate.to_json() {
                        Ok(init) => IceCandidate::new(init.candidate, init.sdp_mid, init.sdp_mline_index),
                        Err(e) => {
                            warn!("Failed to serialize local candidate: {}", e);
                            return;
                        }
                    },
                    None => IceCandidate::completed(),
                };
                if tx.send(candidate).await.is_err() {
                    debug!("Local candidate receiver dropped");
                }
            })
        }));

        Ok((Self { peer_connection }, candidate_rx))
    }

    /// The underlying connection, for adding tracks and transceivers.
    pub fn peer_connection(&self) -> &Arc<RTCPeerConnection> {
        &self.peer_connection
    }

    /// Applies a candidate received from the remote side.
    pub async fn add_remote_candidate(&self, candidate: &IceCandidate) -> Result<()> {
        let IceCandidate::Candidate {
            candidate,
            sdp_mid,
            sdp_m_line_index,
        } = candidate
        else {
            return Ok(());
        };

        let init = RTCIceCandidateInit {
            candidate: candidate.clone(),
            sdp_mid: sdp_mid.clone(),
            sdp_mline_index: *sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add remote ICE candidate")
    }

    pub async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

#[async_trait]
impl NegotiationEngine for WebrtcEngine {
    async fn create_offer(&self) -> Result<Jsep> {
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(Jsep::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<Jsep> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(Jsep::answer(answer.sdp))
    }

    async fn set_local_description(&self, jsep: &Jsep) -> Result<()> {
        self.peer_connection
            .set_local_description(description(jsep)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(&self, jsep: &Jsep) -> Result<()> {
        self.peer_connection
            .set_remote_description(description(jsep)?)
            .await?;
        Ok(())
    }
}

fn description(jsep: &Jsep) -> Result<RTCSessionDescription> {
    let description = match jsep.kind {
        SdpKind::Offer => RTCSessionDescription::offer(jsep.sdp.clone())?,
        SdpKind::Answer => RTCSessionDescription::answer(jsep.sdp.clone())?,
    };
    Ok(description)
}
