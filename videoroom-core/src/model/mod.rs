mod envelope;
mod event;
mod ids;
mod jsep;
mod room;
mod signaling;

pub use envelope::{
    AckKind, ErrorBody, InboundEnvelope, InboundKind, OutboundEnvelope, Payload, PluginData,
    RequestKind,
};
pub use event::{PublisherInfo, RoomEvent, SlowLinkInfo};
pub use ids::{HandleId, MemberId, PrivateId, TransactionId};
pub use jsep::{Jsep, SdpKind};
pub use room::{RoomId, RoomInfo};
pub use signaling::IceCandidate;
