/// Lifecycle of a room session.
///
/// `Idle → Joining → Active ⇄ Reconfiguring → Leaving → Detached`; `Detached`
/// is terminal and reachable from every other state.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum SessionState {
    Idle,
    Joining,
    Active,
    Reconfiguring,
    Leaving,
    Detached,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        self == Self::Detached
    }
}

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Role {
    Publisher,
    Subscriber,
}

/// Audio/video switches of a session.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct MediaFlags {
    pub audio: bool,
    pub video: bool,
}

impl MediaFlags {
    pub fn new(audio: bool, video: bool) -> Self {
        Self { audio, video }
    }
}

impl Default for MediaFlags {
    fn default() -> Self {
        Self::new(true, true)
    }
}
