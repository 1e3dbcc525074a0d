//! Application state for the payroll engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::{AuthConfig, DeductionConfig};
use crate::materializer::RunMaterializer;
use crate::storage::PayrollStore;

/// Shared application state.
///
/// Handlers see the store only through the [`PayrollStore`] trait object;
/// the secret and admin credentials are threaded in from configuration.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn PayrollStore>,
    materializer: RunMaterializer<dyn PayrollStore>,
    auth: Arc<AuthConfig>,
}

impl AppState {
    /// Creates a new application state over a store.
    pub fn new(store: Arc<dyn PayrollStore>, deductions: DeductionConfig, auth: AuthConfig) -> Self {
        Self {
            materializer: RunMaterializer::new(Arc::clone(&store), deductions),
            store,
            auth: Arc::new(auth),
        }
    }

    /// Returns the storage backend.
    pub fn store(&self) -> &dyn PayrollStore {
        self.store.as_ref()
    }

    /// Returns the run materializer.
    pub fn materializer(&self) -> &RunMaterializer<dyn PayrollStore> {
        &self.materializer
    }

    /// Returns the authentication settings.
    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    #[test]
    fn test_app_state_is_clone() {
        // Verify AppState can be cloned (required for axum state)
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_materializer_shares_store() {
        let store: Arc<dyn PayrollStore> = Arc::new(InMemoryStore::new());
        let state = AppState::new(
            Arc::clone(&store),
            DeductionConfig::default(),
            AuthConfig::default(),
        );
        assert!(Arc::ptr_eq(state.materializer().store(), &store));
    }
}
