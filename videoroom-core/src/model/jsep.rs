use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Session description exchanged with the gateway.
///
/// Values are never edited in place: candidate filtering produces a new `Jsep`.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct Jsep {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl Jsep {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }

    pub fn with_sdp(&self, sdp: String) -> Self {
        Self {
            kind: self.kind,
            sdp,
        }
    }
}
