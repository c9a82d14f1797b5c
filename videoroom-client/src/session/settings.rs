use crate::config::SessionConfig;
use crate::filter::CandidateFilter;
use crate::session::observer::{SessionObserver, TracingObserver};
use std::fmt;
use std::sync::Arc;

/// Everything a session needs besides its handle. Subscriptions opened from a
/// publisher reuse the publisher's settings, filter included.
#[derive(Clone)]
pub struct SessionSettings {
    pub config: SessionConfig,
    pub filter: CandidateFilter,
    pub observer: Arc<dyn SessionObserver>,
}

impl SessionSettings {
    /// Builds the default candidate policy from `config.filter_direct_candidates`.
    pub fn new(config: SessionConfig) -> Self {
        let filter = CandidateFilter::from_flag(config.filter_direct_candidates);
        Self {
            config,
            filter,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_filter(mut self, filter: CandidateFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSettings")
            .field("config", &self.config)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}
