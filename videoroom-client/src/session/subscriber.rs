use crate::error::{Result, SignalingError};
use crate::negotiation::{NegotiationEngine, negotiation_error};
use crate::session::capabilities::{Negotiable, Reconfigurable};
use crate::session::events::{RoomEvents, forward_events};
use crate::session::session_core::SessionCore;
use crate::session::settings::SessionSettings;
use crate::session::state::{MediaFlags, Role, SessionState};
use crate::transport::Gateway;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use videoroom_core::{AckKind, Jsep, MemberId, PrivateId, RoomId, SdpKind};

#[derive(Debug, Clone)]
pub struct SubscribeOptions {
    pub pin: Option<String>,
    /// Private id of the participant the subscription belongs to.
    pub private_id: Option<PrivateId>,
    pub audio: bool,
    pub video: bool,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            pin: None,
            private_id: None,
            audio: true,
            video: true,
        }
    }
}

/// A receive-only session bound to one publisher's feed.
pub struct Subscriber {
    core: SessionCore,
    feed: MemberId,
    private_id: Option<PrivateId>,
    requested: MediaFlags,
}

/// A subscriber that still has to answer the gateway's offer.
pub struct Subscription {
    pub subscriber: Subscriber,
    /// The gateway's offer, filtered.
    pub offer: Jsep,
    pub events: RoomEvents,
}

impl Subscriber {
    /// Attaches a new handle and asks to receive `feed` in `room`.
    ///
    /// If the gateway's reply is unusable the new handle is detached again
    /// before the error is returned.
    pub async fn subscribe(
        gateway: &Gateway,
        settings: SessionSettings,
        room: RoomId,
        feed: MemberId,
        options: SubscribeOptions,
    ) -> Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let room_cell = Arc::new(OnceLock::new());
        let on_event = forward_events(
            Role::Subscriber,
            room_cell.clone(),
            settings.observer.clone(),
            tx,
        );

        let handle = gateway.attach(&settings.config.plugin, on_event).await?;
        let subscriber = Self {
            core: SessionCore::new(Role::Subscriber, handle, settings, room_cell),
            feed,
            private_id: options.private_id,
            requested: MediaFlags::new(options.audio, options.video),
        };

        match subscriber.join(room, options.pin).await {
            Ok(offer) => Ok(Subscription {
                subscriber,
                offer,
                events: rx,
            }),
            Err(e) => {
                subscriber.core.report("subscribe", &e);
                subscriber.core.release().await;
                Err(e)
            }
        }
    }

    pub fn feed(&self) -> MemberId {
        self.feed
    }

    pub fn private_id(&self) -> Option<PrivateId> {
        self.private_id
    }

    /// Sends the local answer and starts receiving. `Joining → Active`.
    pub async fn start_with_answer(&self, answer: &Jsep) -> Result<()> {
        let state = self.core.expect("start", &[SessionState::Joining]).await?;
        let room = self.core.room_id().ok_or(SignalingError::IllegalState {
            operation: "start",
            state,
        })?;

        let answer = self.core.filter().filter_jsep(answer);
        let result = self
            .core
            .handle()
            .message(
                json!({ "request": "start", "room": room }),
                Some(answer.clone()),
                AckKind::Event,
            )
            .await
            .and_then(|reply| match reply.str_field("started") {
                Some("ok") => Ok(()),
                _ => Err(SignalingError::missing("started", "start")),
            });

        if let Err(e) = result {
            self.core.report("start", &e);
            return Err(e);
        }

        self.core
            .complete("start", SessionState::Joining, SessionState::Active, |record| {
                record.answer_sdp = Some(answer.sdp);
                record.media = self.requested;
            })
            .await
    }

    async fn join(&self, room: RoomId, pin: Option<String>) -> Result<Jsep> {
        self.core
            .begin("subscribe", &[SessionState::Idle], SessionState::Joining)
            .await?;

        let mut body = json!({
            "request": "join",
            "ptype": "subscriber",
            "room": room,
            "feed": self.feed,
            "offer_audio": self.requested.audio,
            "offer_video": self.requested.video,
        });
        if let Some(pin) = &pin {
            body["pin"] = Value::from(pin.as_str());
        }
        if let Some(private_id) = self.private_id {
            body["private_id"] = json!(private_id);
        }

        let reply = self
            .core
            .handle()
            .message(body, None, AckKind::Event)
            .await?;

        if reply.str_field("videoroom") != Some("attached") {
            return Err(SignalingError::missing("videoroom: attached", "subscribe"));
        }
        if let Some(id) = reply.field("id").and_then(Value::as_u64)
            && MemberId(id) != self.feed
        {
            return Err(SignalingError::ProtocolViolation(format!(
                "subscribed to feed {} but gateway attached {}",
                self.feed, id
            )));
        }
        let offer = reply
            .jsep
            .filter(|jsep| jsep.kind == SdpKind::Offer)
            .ok_or_else(|| SignalingError::missing("jsep offer", "subscribe"))?;

        let offer = self.core.filter().filter_jsep(&offer);
        self.core
            .complete("subscribe", SessionState::Joining, SessionState::Joining, |record| {
                self.core.set_room(room);
                record.offer_sdp = Some(offer.sdp.clone());
                record.pin = pin;
            })
            .await?;

        Ok(offer)
    }
}

impl Subscription {
    /// Answers the offer on `engine` and starts the subscriber.
    pub async fn accept_with(&self, engine: &dyn NegotiationEngine) -> Result<Jsep> {
        engine
            .set_remote_description(&self.offer)
            .await
            .map_err(negotiation_error)?;
        let answer = engine.create_answer().await.map_err(negotiation_error)?;
        engine
            .set_local_description(&answer)
            .await
            .map_err(negotiation_error)?;

        self.subscriber.start_with_answer(&answer).await?;
        Ok(answer)
    }
}

impl Negotiable for Subscriber {
    fn core(&self) -> &SessionCore {
        &self.core
    }
}

#[async_trait]
impl Reconfigurable for Subscriber {
    /// Always sends `configure`, with the full subscription context.
    async fn reconfigure(&self, audio: bool, video: bool) -> Result<()> {
        let mut body = json!({
            "request": "configure",
            "ptype": "subscriber",
            "feed": self.feed,
            "room": self.core.room_id(),
            "audio": audio,
            "video": video,
            "offer_audio": audio,
            "offer_video": video,
        });
        if let Some(pin) = self.core.pin().await {
            body["pin"] = Value::from(pin);
        }
        if let Some(private_id) = self.private_id {
            body["private_id"] = json!(private_id);
        }

        self.core
            .reconfigure(MediaFlags::new(audio, video), body, false)
            .await
    }
}
