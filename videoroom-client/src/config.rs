use serde::{Deserialize, Serialize};

pub const VIDEOROOM_PLUGIN: &str = "janus.plugin.videoroom";

/// Per-session signaling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Server-side plugin every handle of the session attaches to.
    pub plugin: String,
    /// Strip direct (non-relayed) candidates from SDP and trickle.
    pub filter_direct_candidates: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            plugin: VIDEOROOM_PLUGIN.to_owned(),
            filter_direct_candidates: false,
        }
    }
}

/// Defaults merged into every room created through the admin handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomDefaults {
    pub codec: String,
    /// Maximum number of concurrent publishers.
    pub publishers: u32,
    pub bitrate: Option<u64>,
    /// Keyframe request interval, in seconds.
    pub fir_freq: Option<u64>,
    pub record_directory: Option<String>,
    pub video_orient_ext: bool,
}

impl Default for RoomDefaults {
    fn default() -> Self {
        Self {
            codec: "vp8".to_owned(),
            publishers: 3,
            bitrate: None,
            fir_freq: None,
            record_directory: None,
            video_orient_ext: true,
        }
    }
}
