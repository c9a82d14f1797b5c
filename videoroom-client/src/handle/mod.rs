mod plugin_handle;
mod transactions;

pub use plugin_handle::*;
pub use transactions::TransactionReply;
