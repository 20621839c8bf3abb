use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use deckhand_core::{ActionEvent, ActionResponse, ApplicationError};
use tracing::info;

#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Function name the agent routes on.
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &ActionEvent) -> Result<ActionResponse, ApplicationError>;
}

#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<&'static str, Arc<dyn ActionHandler>>,
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: ActionHandler + 'static,
    {
        self.handlers.insert(handler.name(), Arc::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub async fn dispatch(&self, event: &ActionEvent) -> Result<ActionResponse, ApplicationError> {
        let Some(handler) = self.handlers.get(event.function.as_str()) else {
            return Err(ApplicationError::UnknownFunction(event.function.clone()));
        };

        info!(
            event_name = "actions.dispatch",
            function = %event.function,
            action_group = %event.action_group,
            "dispatching action event"
        );
        handler.handle(event).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use deckhand_core::{ActionEvent, ActionResponse, ApplicationError};
    use serde_json::json;

    use super::{ActionHandler, ActionRegistry};

    struct EchoHandler;

    #[async_trait]
    impl ActionHandler for EchoHandler {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn handle(&self, event: &ActionEvent) -> Result<ActionResponse, ApplicationError> {
            Ok(ActionResponse::text(
                &event.action_group,
                &event.function,
                &json!({"echo": event.first_parameter()}),
            )?)
        }
    }

    fn event(function: &str) -> ActionEvent {
        serde_json::from_value(json!({
            "actionGroup": "demo",
            "function": function,
            "parameters": [{"name": "value", "value": "hello"}]
        }))
        .expect("event decodes")
    }

    #[tokio::test]
    async fn dispatches_to_the_handler_matching_the_function_name() {
        let mut registry = ActionRegistry::new();
        registry.register(EchoHandler);

        let response = registry.dispatch(&event("echo")).await.expect("dispatch succeeds");
        assert_eq!(response.payload(), "{\"echo\":\"hello\"}");
    }

    #[tokio::test]
    async fn unknown_function_is_rejected_by_name() {
        let registry = ActionRegistry::new();

        let error = registry.dispatch(&event("missing")).await.expect_err("should fail");
        assert!(matches!(error, ApplicationError::UnknownFunction(function) if function == "missing"));
    }

    #[test]
    fn registering_twice_keeps_one_handler_per_name() {
        let mut registry = ActionRegistry::new();
        registry.register(EchoHandler);
        registry.register(EchoHandler);

        assert_eq!(registry.len(), 1);
    }
}
