//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use playcount_core::{Store, Tracker};

use crate::config::Config;
use crate::fetcher::OsuFetcher;

/// State shared across all HTTP handlers and the scheduler.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    pub store: Store,
    /// Polling passes, shared by the scheduler and `POST /admin/track`.
    pub tracker: Arc<Tracker<OsuFetcher>>,
}

impl AppState {
    pub fn new(config: Config, store: Store, fetcher: OsuFetcher) -> Self {
        let tracker = Tracker::new(store.clone(), fetcher, config.track_pace());
        Self {
            config: Arc::new(config),
            store,
            tracker: Arc::new(tracker),
        }
    }
}
