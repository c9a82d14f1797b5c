use crate::session::SessionState;
use serde_json::Value;
use thiserror::Error;
use videoroom_core::{HandleId, RoomId};

/// Gateway error code for a room that does not exist.
pub const NO_SUCH_ROOM: i64 = 426;

#[derive(Debug, Error)]
pub enum SignalingError {
    /// A reply lacked a field the exchange requires.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// The gateway (core or plugin) refused the request.
    #[error("gateway error {code}: {reason}")]
    Server { code: i64, reason: String },

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    /// The owning handle was detached before the transaction settled.
    #[error("plugin handle {0} is detached")]
    Detached(HandleId),

    #[error("transport error: {0}")]
    Transport(#[source] anyhow::Error),

    #[error("negotiation engine error: {0}")]
    Negotiation(#[source] anyhow::Error),

    #[error("cannot {operation} while session is {state:?}")]
    IllegalState {
        operation: &'static str,
        state: SessionState,
    },
}

impl SignalingError {
    pub fn is_no_such_room(&self) -> bool {
        matches!(self, Self::Server { code, .. } if *code == NO_SUCH_ROOM)
    }

    pub(crate) fn missing(field: &str, operation: &str) -> Self {
        Self::ProtocolViolation(format!("{operation} reply is missing `{field}`"))
    }
}

/// Push events that were dropped instead of reaching the application.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConsistencyError {
    #[error("event for room {received:?} does not belong to session room {expected:?}")]
    RoomMismatch {
        expected: Option<RoomId>,
        received: Option<RoomId>,
    },

    #[error("unhandled notification: {0}")]
    Unhandled(&'static str),

    #[error("unrecognized event: {0}")]
    Unrecognized(Value),
}

pub type Result<T, E = SignalingError> = std::result::Result<T, E>;
