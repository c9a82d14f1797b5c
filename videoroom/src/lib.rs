pub use videoroom_core::model::{HandleId, MemberId, PrivateId, RoomId, TransactionId};

pub mod model {
    pub use videoroom_core::model::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use videoroom_client::*;
}
