use crate::config::{RoomDefaults, SessionConfig};
use crate::error::{Result, SignalingError};
use crate::handle::{EventCallback, PluginHandle};
use crate::transport::Gateway;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info};
use videoroom_core::{AckKind, HandleId, InboundEnvelope, RoomId, RoomInfo};

/// Room to create. Unset fields fall back to [`RoomDefaults`].
#[derive(Debug, Clone, Default)]
pub struct CreateRoom {
    pub description: Option<String>,
    /// Keep the room out of public listings.
    pub hidden: bool,
    pub recording: bool,
    /// Required to join the room.
    pub pin: Option<String>,
    /// Required to modify or destroy the room.
    pub secret: Option<String>,
}

/// Room management over a dedicated handle.
pub struct RoomAdmin {
    handle: Arc<PluginHandle>,
    defaults: RoomDefaults,
}

impl RoomAdmin {
    pub async fn attach(
        gateway: &Gateway,
        config: &SessionConfig,
        defaults: RoomDefaults,
    ) -> Result<Self> {
        let on_event: EventCallback = Arc::new(|handle: HandleId, envelope: InboundEnvelope| {
            debug!("Admin handle {} ignoring {:?}", handle, envelope.janus);
        });
        let handle = gateway.attach(&config.plugin, on_event).await?;

        Ok(Self { handle, defaults })
    }

    pub async fn list(&self) -> Result<Vec<RoomInfo>> {
        let reply = self
            .handle
            .message(json!({ "request": "list" }), None, AckKind::Success)
            .await?;

        let list = reply
            .field("list")
            .filter(|v| v.is_array())
            .ok_or_else(|| SignalingError::missing("list", "list"))?;
        serde_json::from_value(list.clone())
            .map_err(|e| SignalingError::ProtocolViolation(format!("malformed room list: {e}")))
    }

    pub async fn create(&self, room: CreateRoom) -> Result<RoomId> {
        info!(
            "Creating room {:?} (hidden: {}, recording: {})",
            room.description, room.hidden, room.recording
        );

        let reply = self
            .handle
            .message(create_body(&self.defaults, &room), None, AckKind::Success)
            .await?;

        reply
            .field("room")
            .and_then(Value::as_u64)
            .map(RoomId)
            .ok_or_else(|| SignalingError::missing("room", "create"))
    }

    /// Returns the room id the gateway confirms as destroyed; any other id is
    /// a protocol violation.
    pub async fn destroy(&self, room: RoomId, secret: Option<&str>) -> Result<RoomId> {
        info!("Destroying room {}", room);

        let mut body = json!({ "request": "destroy", "room": room });
        if let Some(secret) = secret {
            body["secret"] = Value::from(secret);
        }

        let reply = self.handle.message(body, None, AckKind::Success).await?;
        match reply.field("room").and_then(Value::as_u64) {
            Some(id) if RoomId(id) == room => Ok(room),
            Some(id) => Err(SignalingError::ProtocolViolation(format!(
                "destroyed room {id} instead of {room}"
            ))),
            None => Err(SignalingError::missing("room", "destroy")),
        }
    }

    pub async fn detach(&self) -> Result<()> {
        self.handle.detach().await
    }
}

fn create_body(defaults: &RoomDefaults, room: &CreateRoom) -> Value {
    let mut body = json!({
        "request": "create",
        "record": room.recording,
        "videocodec": defaults.codec,
        "publishers": defaults.publishers,
        "videoorient_ext": defaults.video_orient_ext,
    });

    if let Some(description) = &room.description {
        body["description"] = Value::from(description.as_str());
    }
    if room.recording
        && let Some(dir) = &defaults.record_directory
    {
        body["rec_dir"] = Value::from(dir.as_str());
    }
    if room.hidden {
        body["is_private"] = Value::Bool(true);
    }
    if let Some(secret) = &room.secret {
        body["secret"] = Value::from(secret.as_str());
    }
    if let Some(pin) = &room.pin {
        body["pin"] = Value::from(pin.as_str());
    }
    if let Some(bitrate) = defaults.bitrate {
        body["bitrate"] = Value::from(bitrate);
    }
    if let Some(fir_freq) = defaults.fir_freq {
        body["fir_freq"] = Value::from(fir_freq);
    }
    body
}
