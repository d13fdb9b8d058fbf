use std::sync::Arc;

use convertino_core::{
    AuditStore, Authenticator, Config, ConversionClient, ConversionOrchestrator, SanitizedConfig,
};

use crate::files::FilesRoot;

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    audit_store: Arc<dyn AuditStore>,
    orchestrator: Arc<ConversionOrchestrator>,
    files_root: FilesRoot,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        audit_store: Arc<dyn AuditStore>,
        orchestrator: Arc<ConversionOrchestrator>,
        files_root: FilesRoot,
    ) -> Self {
        Self {
            config,
            authenticator,
            audit_store,
            orchestrator,
            files_root,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }

    pub fn orchestrator(&self) -> &ConversionOrchestrator {
        self.orchestrator.as_ref()
    }

    pub fn files_root(&self) -> &FilesRoot {
        &self.files_root
    }

    /// Backend client the orchestrator converts with.
    pub fn client(&self) -> &dyn ConversionClient {
        self.orchestrator.client().as_ref()
    }
}
