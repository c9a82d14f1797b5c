mod candidate_filter;
mod candidate_policy;

pub use candidate_filter::*;
pub use candidate_policy::*;
