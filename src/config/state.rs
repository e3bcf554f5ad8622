// Application state module
// Shared runtime state handed to every connection

use std::sync::Arc;

use super::types::Config;
use crate::logger;
use crate::redirect::RedirectResolver;
use crate::store::{ApplicationLookup, InMemoryApplicationStore};

/// Application state
pub struct AppState {
    pub config: Config,
    pub resolver: RedirectResolver,
}

impl AppState {
    /// Create `AppState` backed by the in-memory store seeded from config
    pub fn new(config: &Config) -> Self {
        let store = InMemoryApplicationStore::new(&config.applications);
        if store.is_empty() {
            logger::log_warning(
                "No forked applications configured, appId redirects use the default path",
            );
        } else {
            logger::log_debug(&format!("Indexed {} forked application(s)", store.len()));
        }
        Self::with_lookup(config, Arc::new(store))
    }

    /// Create `AppState` over an arbitrary application lookup
    pub fn with_lookup(config: &Config, lookup: Arc<dyn ApplicationLookup>) -> Self {
        Self {
            config: config.clone(),
            resolver: RedirectResolver::new(lookup),
        }
    }
}
