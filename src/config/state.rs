// Application state module
// Immutable runtime state shared across connections

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::types::{Config, RoutesConfig};

/// Application state
///
/// Fixed at startup; the only per-request read that bypasses the config
/// structure is the cached access-log flag.
pub struct AppState {
    pub config: Config,
    /// Canonicalized Base Directory for all file lookups
    pub site_root: PathBuf,
    pub routes: Arc<RoutesConfig>,

    // Cached config value for fast access without locks
    pub cached_access_log: AtomicBool,
}

impl AppState {
    pub fn new(config: &Config, site_root: PathBuf) -> Self {
        Self {
            routes: Arc::new(config.routes.clone()),
            cached_access_log: AtomicBool::new(config.logging.access_log),
            site_root,
            config: config.clone(),
        }
    }
}
