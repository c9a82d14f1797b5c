mod engine;
mod engine_config;
#[cfg(not(target_arch = "wasm32"))]
mod webrtc_engine;

pub use engine::*;
pub use engine_config::*;
#[cfg(not(target_arch = "wasm32"))]
pub use webrtc_engine::*;
