// ==============================================================================
// state.rs - Application State Management
// ==============================================================================
// Description: Shared application state for the variant API
// Author: Matt Barham
// Created: 2026-10-17
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================

use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::RecordStore;

/// Shared application state
///
/// Holds configuration only; the variant table itself is loaded per request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    store: RecordStore,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = RecordStore::new(config.store_config());
        Self {
            inner: Arc::new(AppStateInner { config, store }),
        }
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get record store
    pub fn store(&self) -> &RecordStore {
        &self.inner.store
    }
}
