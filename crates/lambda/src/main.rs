mod bootstrap;

use deckhand_actions::ActionRegistry;
use deckhand_core::config::{AppConfig, LoadOptions};
use deckhand_core::ActionEvent;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};

fn init_logging(config: &AppConfig) {
    use deckhand_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;
    info!(
        event_name = "system.lambda.started",
        correlation_id = "bootstrap",
        handler_count = app.registry.len(),
        "action runtime started"
    );

    let registry = &app.registry;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle(registry, event).await
    }))
    .await
}

/// Decodes the incoming action event and routes it through the registry.
/// The request id doubles as the correlation id on failure logs.
async fn handle(registry: &ActionRegistry, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let (payload, context) = event.into_parts();
    let request_id = context.request_id.clone();

    let action_event: ActionEvent = serde_json::from_value(payload)?;
    info!(
        event_name = "ingress.action.event_received",
        correlation_id = %request_id,
        action_group = %action_event.action_group,
        function = %action_event.function,
        "received action event"
    );

    match registry.dispatch(&action_event).await {
        Ok(response) => Ok(serde_json::to_value(&response)?),
        Err(application_error) => {
            let interface = application_error.into_interface(request_id.clone());
            error!(
                event_name = "ingress.action.dispatch_failed",
                correlation_id = %request_id,
                function = %action_event.function,
                error = %interface,
                user_message = interface.user_message(),
                "action dispatch failed"
            );
            Err(Box::new(interface))
        }
    }
}
