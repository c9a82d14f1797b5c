use serde::{Deserialize, Serialize};

/// A trickled ICE candidate, or the marker that ends trickling.
///
/// The completion marker serializes as `{"completed": true}` and carries no
/// address, so candidate filtering never applies to it.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
#[serde(untagged)]
pub enum IceCandidate {
    Candidate {
        candidate: String,
        #[serde(rename = "sdpMid", default)]
        sdp_mid: Option<String>,
        #[serde(rename = "sdpMLineIndex", default)]
        sdp_m_line_index: Option<u16>,
    },
    Completed {
        completed: bool,
    },
}

impl IceCandidate {
    pub fn new(
        candidate: impl Into<String>,
        sdp_mid: Option<String>,
        sdp_m_line_index: Option<u16>,
    ) -> Self {
        Self::Candidate {
            candidate: candidate.into(),
            sdp_mid,
            sdp_m_line_index,
        }
    }

    pub fn completed() -> Self {
        Self::Completed { completed: true }
    }

    /// The raw candidate line, `None` for the completion marker.
    pub fn line(&self) -> Option<&str> {
        match self {
            Self::Candidate { candidate, .. } => Some(candidate),
            Self::Completed { .. } => None,
        }
    }

    pub fn is_completion(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}
