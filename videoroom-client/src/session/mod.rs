mod capabilities;
mod events;
mod observer;
mod publisher;
mod session_core;
mod settings;
mod state;
mod subscriber;

pub use capabilities::*;
pub use events::RoomEvents;
pub use observer::*;
pub use publisher::*;
pub use session_core::SessionCore;
pub use settings::*;
pub use state::*;
pub use subscriber::*;
