//! Application state shared across handlers.

use crate::auth::{StoredTokenVerifier, TokenVerifier};
use shelfwise_core::config::AppConfig;
use shelfwise_metadata::MetadataStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Bearer token verifier.
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    /// Create state that verifies tokens against the metadata store.
    pub fn new(config: AppConfig, metadata: Arc<dyn MetadataStore>) -> Self {
        let verifier = Arc::new(StoredTokenVerifier::new(metadata.clone()));
        Self::with_verifier(config, metadata, verifier)
    }

    /// Create state with a custom token verifier.
    pub fn with_verifier(
        config: AppConfig,
        metadata: Arc<dyn MetadataStore>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            metadata,
            verifier,
        }
    }
}
