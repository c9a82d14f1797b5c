mod room_admin;

pub use room_admin::*;
