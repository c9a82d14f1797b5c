use crate::error::{Result, SignalingError};
use crate::negotiation::{NegotiationEngine, negotiation_error};
use crate::session::capabilities::{Leavable, Negotiable, Reconfigurable};
use crate::session::events::{RoomEvents, forward_events};
use crate::session::session_core::SessionCore;
use crate::session::settings::SessionSettings;
use crate::session::state::{MediaFlags, Role, SessionState};
use crate::session::subscriber::{SubscribeOptions, Subscriber, Subscription};
use crate::transport::Gateway;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use videoroom_core::{AckKind, Jsep, MemberId, PrivateId, PublisherInfo, RoomId, SdpKind};

#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub pin: Option<String>,
    pub audio: bool,
    pub video: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            pin: None,
            audio: true,
            video: true,
        }
    }
}

/// Result of a successful join.
#[derive(Debug, Clone)]
pub struct Joined {
    /// Publishers already in the room, exactly as the gateway listed them.
    pub publishers: Vec<PublisherInfo>,
    /// The gateway's answer, filtered.
    pub answer: Jsep,
}

/// A participant that joins a room and publishes its own media.
pub struct Publisher {
    core: SessionCore,
    gateway: Gateway,
}

struct JoinReply {
    member_id: MemberId,
    private_id: PrivateId,
    publishers: Vec<PublisherInfo>,
    answer: Jsep,
}

impl Publisher {
    /// Attaches a new handle; the session starts `Idle`.
    pub async fn attach(gateway: &Gateway, settings: SessionSettings) -> Result<(Self, RoomEvents)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let room = Arc::new(OnceLock::new());
        let on_event = forward_events(Role::Publisher, room.clone(), settings.observer.clone(), tx);

        let handle = gateway.attach(&settings.config.plugin, on_event).await?;
        let core = SessionCore::new(Role::Publisher, handle, settings, room);

        Ok((
            Self {
                core,
                gateway: gateway.clone(),
            },
            rx,
        ))
    }

    /// Joins `room` and publishes `offer` in one exchange.
    pub async fn join_and_publish(
        &self,
        room: RoomId,
        display: &str,
        offer: &Jsep,
        options: PublishOptions,
    ) -> Result<Joined> {
        self.core
            .begin("join_and_publish", &[SessionState::Idle], SessionState::Joining)
            .await?;

        let offer = self.core.filter().filter_jsep(offer);
        let mut body = json!({
            "request": "joinandconfigure",
            "ptype": "publisher",
            "room": room,
            "display": display,
            "audio": options.audio,
            "video": options.video,
            "data": false,
        });
        if let Some(pin) = &options.pin {
            body["pin"] = Value::from(pin.as_str());
        }

        let reply = match self.exchange_join(body, offer.clone()).await {
            Ok(reply) => reply,
            Err(e) => {
                self.core.report("join_and_publish", &e);
                self.core
                    .finish(SessionState::Joining, SessionState::Idle)
                    .await;
                return Err(e);
            }
        };

        let answer = self.core.filter().filter_jsep(&reply.answer);
        let answer_sdp = answer.sdp.clone();
        self.core
            .complete(
                "join_and_publish",
                SessionState::Joining,
                SessionState::Active,
                |record| {
                    self.core.set_room(room);
                    record.member_id.get_or_insert(reply.member_id);
                    record.private_member_id.get_or_insert(reply.private_id);
                    record.media = MediaFlags::new(options.audio, options.video);
                    record.offer_sdp = Some(offer.sdp);
                    record.answer_sdp = Some(answer_sdp);
                    record.pin = options.pin.clone();
                },
            )
            .await?;

        Ok(Joined {
            publishers: reply.publishers,
            answer,
        })
    }

    /// Creates the offer on `engine`, joins with it and applies the answer.
    pub async fn publish_with(
        &self,
        engine: &dyn NegotiationEngine,
        room: RoomId,
        display: &str,
        options: PublishOptions,
    ) -> Result<Joined> {
        self.core.expect("publish_with", &[SessionState::Idle]).await?;

        let offer = engine.create_offer().await.map_err(negotiation_error)?;
        engine
            .set_local_description(&offer)
            .await
            .map_err(negotiation_error)?;

        let joined = self.join_and_publish(room, display, &offer, options).await?;
        engine
            .set_remote_description(&joined.answer)
            .await
            .map_err(negotiation_error)?;

        Ok(joined)
    }

    /// Subscribes to `feed` in this publisher's room on a new handle.
    ///
    /// Without an explicit `private_id`, the publisher's own private id is
    /// quoted.
    pub async fn subscribe(&self, feed: MemberId, options: SubscribeOptions) -> Result<Subscription> {
        let state = self.core.expect("subscribe", &[SessionState::Active]).await?;
        let room = self.core.room_id().ok_or(SignalingError::IllegalState {
            operation: "subscribe",
            state,
        })?;

        let private_id = match options.private_id {
            Some(id) => Some(id),
            None => self.core.private_member_id().await,
        };

        Subscriber::subscribe(
            &self.gateway,
            self.core.settings().clone(),
            room,
            feed,
            SubscribeOptions {
                private_id,
                ..options
            },
        )
        .await
    }

    async fn exchange_join(&self, body: Value, offer: Jsep) -> Result<JoinReply> {
        let reply = self
            .core
            .handle()
            .message(body, Some(offer), AckKind::Event)
            .await?;

        let member_id = reply
            .field("id")
            .and_then(Value::as_u64)
            .map(MemberId)
            .ok_or_else(|| SignalingError::missing("id", "join"))?;
        let private_id = reply
            .field("private_id")
            .and_then(Value::as_u64)
            .map(PrivateId)
            .ok_or_else(|| SignalingError::missing("private_id", "join"))?;
        let publishers = reply
            .field("publishers")
            .filter(|v| v.is_array())
            .ok_or_else(|| SignalingError::missing("publishers", "join"))?;
        let publishers: Vec<PublisherInfo> = serde_json::from_value(publishers.clone())
            .map_err(|e| SignalingError::ProtocolViolation(format!("malformed publishers: {e}")))?;
        let answer = reply
            .jsep
            .filter(|jsep| jsep.kind == SdpKind::Answer)
            .ok_or_else(|| SignalingError::missing("jsep answer", "join"))?;

        Ok(JoinReply {
            member_id,
            private_id,
            publishers,
            answer,
        })
    }
}

impl Negotiable for Publisher {
    fn core(&self) -> &SessionCore {
        &self.core
    }
}

#[async_trait]
impl Reconfigurable for Publisher {
    async fn reconfigure(&self, audio: bool, video: bool) -> Result<()> {
        let mut body = json!({
            "request": "configure",
            "audio": audio,
            "video": video,
        });
        if let Some(pin) = self.core.pin().await {
            body["pin"] = Value::from(pin);
        }

        self.core
            .reconfigure(MediaFlags::new(audio, video), body, true)
            .await
    }
}

#[async_trait]
impl Leavable for Publisher {
    /// Announces the departure, then detaches whatever the answer was. The
    /// gateway's reply to the detach is not awaited.
    async fn leave(&self) -> Result<()> {
        self.core
            .begin("leave", &[SessionState::Active], SessionState::Leaving)
            .await?;

        let result = self
            .core
            .handle()
            .message(json!({ "request": "leave" }), None, AckKind::Event)
            .await
            .map(|_| ());
        if let Err(e) = &result {
            self.core.report("leave", e);
        }

        self.core.release().await;
        result
    }
}
