use crate::error::ConsistencyError;
use crate::handle::EventCallback;
use crate::session::observer::SessionObserver;
use crate::session::state::Role;
use serde_json::{Map, Value};
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use tracing::debug;
use videoroom_core::{
    HandleId, InboundEnvelope, InboundKind, MemberId, PublisherInfo, RoomEvent, RoomId,
    SlowLinkInfo,
};

/// Room events of one session, in arrival order.
pub type RoomEvents = mpsc::UnboundedReceiver<RoomEvent>;

const MEMBERSHIP_FIELDS: [&str; 4] = ["joining", "unpublished", "leaving", "publishers"];

/// Builds the push callback of a session handle: translated events go to `tx`,
/// everything else to the observer.
pub(crate) fn forward_events(
    role: Role,
    room: Arc<OnceLock<RoomId>>,
    observer: Arc<dyn SessionObserver>,
    tx: mpsc::UnboundedSender<RoomEvent>,
) -> EventCallback {
    Arc::new(move |handle: HandleId, envelope: InboundEnvelope| {
        match translate(&envelope, room.get().copied()) {
            Ok(event) => {
                observer.on_room_event(role, handle, &event);
                if tx.send(event).is_err() {
                    debug!("Room events of handle {} are no longer read", handle);
                }
            }
            Err(e) => observer.on_event_dropped(role, handle, &e),
        }
    })
}

/// Maps one unsolicited envelope to a [`RoomEvent`].
pub(crate) fn translate(
    envelope: &InboundEnvelope,
    room: Option<RoomId>,
) -> Result<RoomEvent, ConsistencyError> {
    match &envelope.janus {
        InboundKind::Event => {}
        InboundKind::SlowLink => return Ok(RoomEvent::SlowLink(slow_link(&envelope.extra))),
        InboundKind::WebrtcUp => return Err(ConsistencyError::Unhandled("webrtcup")),
        InboundKind::Media => return Err(ConsistencyError::Unhandled("media")),
        InboundKind::Hangup => return Err(ConsistencyError::Unhandled("hangup")),
        InboundKind::Detached => return Err(ConsistencyError::Unhandled("detached")),
        _ => return Err(unrecognized(envelope)),
    }

    let Some(data) = envelope.plugin_data().and_then(Value::as_object) else {
        return Err(unrecognized(envelope));
    };

    match data.get("videoroom").and_then(Value::as_str) {
        Some("slow_link") => Ok(RoomEvent::SlowLink(slow_link(data))),
        Some("destroyed") => Err(ConsistencyError::Unhandled("destroyed")),
        Some("event") => room_event(envelope, data, room),
        _ => Err(unrecognized(envelope)),
    }
}

fn room_event(
    envelope: &InboundEnvelope,
    data: &Map<String, Value>,
    room: Option<RoomId>,
) -> Result<RoomEvent, ConsistencyError> {
    let received = data.get("room").and_then(Value::as_u64).map(RoomId);
    if room.is_none() || received != room {
        return Err(ConsistencyError::RoomMismatch {
            expected: room,
            received,
        });
    }

    let mut populated = MEMBERSHIP_FIELDS
        .iter()
        .filter_map(|field| data.get(*field).filter(|v| !v.is_null()).map(|v| (*field, v)));

    let (Some((field, value)), None) = (populated.next(), populated.next()) else {
        return Err(unrecognized(envelope));
    };

    let event = match (field, value) {
        ("unpublished", Value::String(s)) if s == "ok" => {
            return Err(ConsistencyError::Unhandled("unpublished"));
        }
        ("leaving", Value::String(s)) if s == "ok" => {
            return Err(ConsistencyError::Unhandled("leaving"));
        }
        ("joining", value) => member_id(value.get("id").unwrap_or(value)).map(RoomEvent::MemberJoined),
        ("unpublished", value) => member_id(value).map(RoomEvent::MemberUnpublished),
        ("leaving", value) => member_id(value).map(RoomEvent::MemberLeaving),
        ("publishers", value) => serde_json::from_value::<Vec<PublisherInfo>>(value.clone())
            .ok()
            .map(RoomEvent::PublishersUpdated),
        _ => None,
    };

    event.ok_or_else(|| unrecognized(envelope))
}

fn member_id(value: &Value) -> Option<MemberId> {
    value.as_u64().map(MemberId)
}

fn slow_link(fields: &Map<String, Value>) -> SlowLinkInfo {
    serde_json::from_value(Value::Object(fields.clone())).unwrap_or_default()
}

fn unrecognized(envelope: &InboundEnvelope) -> ConsistencyError {
    ConsistencyError::Unrecognized(serde_json::to_value(envelope).unwrap_or(Value::Null))
}
