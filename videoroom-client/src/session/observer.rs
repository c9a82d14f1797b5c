use crate::error::{ConsistencyError, SignalingError};
use crate::session::state::{Role, SessionState};
use tracing::{debug, info, warn};
use videoroom_core::{HandleId, RoomEvent};

/// Lifecycle hooks of room sessions.
///
/// Installed through [`crate::SessionSettings`] and shared by every session
/// built from those settings.
pub trait SessionObserver: Send + Sync {
    fn on_transition(&self, role: Role, handle: HandleId, from: SessionState, to: SessionState);

    /// A request failed; the error is also returned to the caller unless the
    /// operation swallows it (teardown).
    fn on_request_failed(
        &self,
        role: Role,
        handle: HandleId,
        operation: &'static str,
        error: &SignalingError,
    );

    /// A push event was not turned into a [`RoomEvent`].
    fn on_event_dropped(&self, role: Role, handle: HandleId, error: &ConsistencyError);

    fn on_room_event(&self, _role: Role, _handle: HandleId, _event: &RoomEvent) {}
}

/// Reports everything through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn on_transition(&self, role: Role, handle: HandleId, from: SessionState, to: SessionState) {
        info!("{:?} session on handle {}: {:?} -> {:?}", role, handle, from, to);
    }

    fn on_request_failed(
        &self,
        role: Role,
        handle: HandleId,
        operation: &'static str,
        error: &SignalingError,
    ) {
        warn!(
            "{:?} session on handle {}: {} failed: {}",
            role, handle, operation, error
        );
    }

    fn on_event_dropped(&self, role: Role, handle: HandleId, error: &ConsistencyError) {
        warn!("{:?} session on handle {} dropped event: {}", role, handle, error);
    }

    fn on_room_event(&self, role: Role, handle: HandleId, event: &RoomEvent) {
        debug!("{:?} session on handle {} got {:?}", role, handle, event);
    }
}
