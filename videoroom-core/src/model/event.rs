use crate::model::ids::MemberId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A publisher as advertised by the room. Everything except `id` and
/// `display` is carried through verbatim in `extra`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PublisherInfo {
    pub id: MemberId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Link-quality warning details reported by the gateway.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SlowLinkInfo {
    #[serde(default, rename = "current-bitrate", skip_serializing_if = "Option::is_none")]
    pub current_bitrate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uplink: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Typed room notifications delivered to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    MemberJoined(MemberId),
    MemberUnpublished(MemberId),
    MemberLeaving(MemberId),
    PublishersUpdated(Vec<PublisherInfo>),
    SlowLink(SlowLinkInfo),
}
