use crate::filter::candidate_policy::{CandidatePolicy, RelayOnly};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use videoroom_core::{IceCandidate, Jsep};

const CANDIDATE_ATTRIBUTE: &str = "a=candidate:";

/// Applies a [`CandidatePolicy`] to SDP blobs and trickled candidates.
///
/// The same filter is used for outbound descriptions, inbound descriptions and
/// every trickled candidate of a session, so the policy cannot drift.
#[derive(Clone)]
pub struct CandidateFilter {
    enabled: bool,
    policy: Arc<dyn CandidatePolicy>,
}

impl CandidateFilter {
    pub fn new(policy: impl CandidatePolicy + 'static) -> Self {
        Self {
            enabled: true,
            policy: Arc::new(policy),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            policy: Arc::new(RelayOnly),
        }
    }

    /// Default policy, switched by the session config flag.
    pub fn from_flag(enabled: bool) -> Self {
        if enabled {
            Self::new(RelayOnly)
        } else {
            Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_direct(&self, candidate_line: &str) -> bool {
        self.policy.is_direct(candidate_line)
    }

    /// Removes every direct `a=candidate:` line. All other bytes, line
    /// endings included, are left as they were.
    pub fn filter_sdp<'a>(&self, sdp: &'a str) -> Cow<'a, str> {
        if !self.enabled || !sdp.split_inclusive('\n').any(|line| self.drops(line)) {
            return Cow::Borrowed(sdp);
        }

        Cow::Owned(
            sdp.split_inclusive('\n')
                .filter(|line| !self.drops(line))
                .collect(),
        )
    }

    pub fn filter_jsep(&self, jsep: &Jsep) -> Jsep {
        jsep.with_sdp(self.filter_sdp(&jsep.sdp).into_owned())
    }

    /// Whether a trickled candidate may be transmitted.
    pub fn admits(&self, candidate: &IceCandidate) -> bool {
        match candidate.line() {
            Some(line) => !self.enabled || !self.is_direct(line),
            None => true,
        }
    }

    fn drops(&self, line: &str) -> bool {
        let line = line.trim_end_matches(['\r', '\n']);
        line.starts_with(CANDIDATE_ATTRIBUTE) && self.is_direct(line)
    }
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self::disabled()
    }
}

impl fmt::Debug for CandidateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateFilter")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
