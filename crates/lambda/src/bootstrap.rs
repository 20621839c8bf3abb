use std::sync::Arc;

use deckhand_actions::{
    ActionRegistry, CreateDeck, DuckDuckGoClient, S3ObjectStore, SearchWeb, SendMail, SnsNotifier,
};
use deckhand_core::config::{AppConfig, ConfigError, LoadOptions};
use deckhand_core::ApplicationError;
use thiserror::Error;
use tracing::info;

#[derive(Debug)]
pub struct Application {
    pub config: AppConfig,
    pub registry: ActionRegistry,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("collaborator construction failed: {0}")]
    Collaborator(#[from] ApplicationError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

/// Builds every collaborator from the already-loaded config and registers
/// the three action handlers. Fails fast on missing deployment settings so
/// a misconfigured function never accepts events.
pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting action runtime bootstrap"
    );

    let store = Arc::new(S3ObjectStore::from_config(&config.aws, &config.storage)?);
    let notifier = Arc::new(SnsNotifier::from_config(&config.aws, &config.notify)?);
    let search = Arc::new(DuckDuckGoClient::from_config(&config.search));

    let mut registry = ActionRegistry::new();
    registry.register(CreateDeck::new(store));
    registry.register(SendMail::new(notifier, config.notify.subject.clone()));
    registry.register(SearchWeb::new(search));

    info!(
        event_name = "system.bootstrap.registry_ready",
        correlation_id = "bootstrap",
        handler_count = registry.len(),
        "action handlers registered"
    );

    Ok(Application { config, registry })
}
