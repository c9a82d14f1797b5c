use crate::error::{Result, SignalingError};
use crate::filter::CandidateFilter;
use crate::handle::PluginHandle;
use crate::session::settings::SessionSettings;
use crate::session::state::{MediaFlags, Role, SessionState};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;
use tracing::debug;
use videoroom_core::{AckKind, HandleId, IceCandidate, MemberId, PrivateId, RoomId};

/// What a session learned from the gateway so far.
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionRecord {
    pub(crate) member_id: Option<MemberId>,
    pub(crate) private_member_id: Option<PrivateId>,
    pub(crate) media: MediaFlags,
    pub(crate) offer_sdp: Option<String>,
    pub(crate) answer_sdp: Option<String>,
    /// Room pin quoted again on every reconfiguration.
    pub(crate) pin: Option<String>,
}

struct SessionInner {
    state: SessionState,
    record: SessionRecord,
}

/// State shared by publishers and subscribers: the handle, the state machine
/// and the recorded negotiation results.
pub struct SessionCore {
    role: Role,
    handle: Arc<PluginHandle>,
    settings: SessionSettings,
    room: Arc<OnceLock<RoomId>>,
    inner: Mutex<SessionInner>,
}

impl SessionCore {
    pub(crate) fn new(
        role: Role,
        handle: Arc<PluginHandle>,
        settings: SessionSettings,
        room: Arc<OnceLock<RoomId>>,
    ) -> Self {
        Self {
            role,
            handle,
            settings,
            room,
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                record: SessionRecord::default(),
            }),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn handle_id(&self) -> HandleId {
        self.handle.id()
    }

    /// Set once, by the first successful join.
    pub fn room_id(&self) -> Option<RoomId> {
        self.room.get().copied()
    }

    pub fn filter(&self) -> &CandidateFilter {
        &self.settings.filter
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    pub async fn member_id(&self) -> Option<MemberId> {
        self.inner.lock().await.record.member_id
    }

    pub async fn private_member_id(&self) -> Option<PrivateId> {
        self.inner.lock().await.record.private_member_id
    }

    pub async fn media(&self) -> MediaFlags {
        self.inner.lock().await.record.media
    }

    /// Last offer sent or received, after filtering.
    pub async fn offer_sdp(&self) -> Option<String> {
        self.inner.lock().await.record.offer_sdp.clone()
    }

    /// Last answer sent or received, after filtering.
    pub async fn answer_sdp(&self) -> Option<String> {
        self.inner.lock().await.record.answer_sdp.clone()
    }

    pub(crate) async fn pin(&self) -> Option<String> {
        self.inner.lock().await.record.pin.clone()
    }

    pub(crate) fn handle(&self) -> &PluginHandle {
        &self.handle
    }

    pub(crate) fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Fails with `IllegalState` unless the session is in one of `allowed`.
    pub(crate) async fn expect(
        &self,
        operation: &'static str,
        allowed: &[SessionState],
    ) -> Result<SessionState> {
        let state = self.state().await;
        if allowed.contains(&state) {
            Ok(state)
        } else {
            Err(SignalingError::IllegalState { operation, state })
        }
    }

    /// Guarded transition into `to` from one of `allowed`.
    pub(crate) async fn begin(
        &self,
        operation: &'static str,
        allowed: &[SessionState],
        to: SessionState,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if !allowed.contains(&inner.state) {
            return Err(SignalingError::IllegalState {
                operation,
                state: inner.state,
            });
        }
        self.transition(&mut inner, to);
        Ok(())
    }

    /// Moves `from → to` only if nothing else moved the session meanwhile.
    pub(crate) async fn finish(&self, from: SessionState, to: SessionState) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.state != from {
            return false;
        }
        self.transition(&mut inner, to);
        true
    }

    /// Applies a successful exchange and moves `from → to` atomically.
    pub(crate) async fn complete(
        &self,
        operation: &'static str,
        from: SessionState,
        to: SessionState,
        apply: impl FnOnce(&mut SessionRecord),
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.state != from {
            return Err(SignalingError::IllegalState {
                operation,
                state: inner.state,
            });
        }
        apply(&mut inner.record);
        self.transition(&mut inner, to);
        Ok(())
    }

    pub(crate) fn set_room(&self, room: RoomId) {
        if self.room.set(room).is_err() {
            debug!(
                "Room of handle {} already set, keeping {:?}",
                self.handle.id(),
                self.room.get()
            );
        }
    }

    pub(crate) fn report(&self, operation: &'static str, error: &SignalingError) {
        self.settings
            .observer
            .on_request_failed(self.role, self.handle.id(), operation, error);
    }

    pub(crate) async fn submit_candidate(&self, candidate: IceCandidate) -> Result<bool> {
        self.expect(
            "submit_candidate",
            &[SessionState::Joining, SessionState::Active],
        )
        .await?;

        if !self.settings.filter.admits(&candidate) {
            debug!("Dropping direct candidate on handle {}", self.handle.id());
            return Ok(false);
        }

        self.handle.trickle(candidate).await.inspect_err(|e| {
            self.report("submit_candidate", e);
        })?;
        Ok(true)
    }

    /// Sends a `configure` body. With `skip_unchanged`, nothing is sent when
    /// `target` equals the current flags.
    ///
    /// `Active → Reconfiguring → Active`; flags change only when the gateway
    /// answers `configured: ok`.
    pub(crate) async fn reconfigure(
        &self,
        target: MediaFlags,
        body: Value,
        skip_unchanged: bool,
    ) -> Result<()> {
        {
            let mut inner = self.inner.lock().await;
            if inner.state != SessionState::Active {
                return Err(SignalingError::IllegalState {
                    operation: "reconfigure",
                    state: inner.state,
                });
            }
            if skip_unchanged && inner.record.media == target {
                return Ok(());
            }
            self.transition(&mut inner, SessionState::Reconfiguring);
        }

        let result = self
            .handle
            .message(body, None, AckKind::Event)
            .await
            .and_then(|reply| match reply.str_field("configured") {
                Some("ok") => Ok(()),
                _ => Err(SignalingError::missing("configured", "configure")),
            });

        match &result {
            Ok(()) => {
                self.complete(
                    "reconfigure",
                    SessionState::Reconfiguring,
                    SessionState::Active,
                    |record| record.media = target,
                )
                .await?;
            }
            Err(e) => {
                self.report("reconfigure", e);
                self.finish(SessionState::Reconfiguring, SessionState::Active)
                    .await;
            }
        }
        result
    }

    /// Marks the session detached and detaches its handle.
    pub(crate) async fn detach(&self) -> Result<()> {
        {
            let mut inner = self.inner.lock().await;
            if inner.state.is_terminal() {
                return Err(SignalingError::IllegalState {
                    operation: "detach",
                    state: inner.state,
                });
            }
            self.transition(&mut inner, SessionState::Detached);
        }

        self.handle.detach().await.inspect_err(|e| {
            self.report("detach", e);
        })
    }

    /// Marks the session detached without waiting for the gateway to confirm
    /// the handle's detach. Failures go to the observer.
    pub(crate) async fn release(&self) {
        {
            let mut inner = self.inner.lock().await;
            if inner.state.is_terminal() {
                return;
            }
            self.transition(&mut inner, SessionState::Detached);
        }

        let observer = self.settings.observer.clone();
        let (role, id) = (self.role, self.handle.id());
        self.handle.detach_in_background(move |e| {
            observer.on_request_failed(role, id, "detach", &e);
        });
    }

    fn transition(&self, inner: &mut SessionInner, to: SessionState) {
        let from = inner.state;
        inner.state = to;
        if from != to {
            self.settings
                .observer
                .on_transition(self.role, self.handle.id(), from, to);
        }
    }
}
