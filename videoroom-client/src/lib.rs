pub mod admin;
pub mod config;
pub mod error;
pub mod filter;
pub mod handle;
pub mod negotiation;
pub mod session;
pub mod transport;

pub use admin::{CreateRoom, RoomAdmin};
pub use config::{RoomDefaults, SessionConfig, VIDEOROOM_PLUGIN};
pub use error::{ConsistencyError, NO_SUCH_ROOM, Result, SignalingError};
pub use filter::{CandidateFilter, CandidatePolicy, RelayOnly};
pub use handle::{EventCallback, PluginHandle, TransactionReply};
pub use negotiation::{EngineConfig, NegotiationEngine, forward_candidates};
#[cfg(not(target_arch = "wasm32"))]
pub use negotiation::WebrtcEngine;
pub use session::{
    Joined, Leavable, MediaFlags, Negotiable, PublishOptions, Publisher, Reconfigurable, Role,
    RoomEvents, SessionCore, SessionObserver, SessionSettings, SessionState, SubscribeOptions,
    Subscriber, Subscription, TracingObserver,
};
pub use transport::{Gateway, Transport};
