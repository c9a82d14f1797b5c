mod gateway;
mod transport;

pub use gateway::*;
pub use transport::*;
