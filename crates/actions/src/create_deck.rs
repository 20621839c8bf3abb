use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use deckhand_core::{ActionEvent, ActionResponse, ApplicationError, Deck, DeckWriter};
use serde::Serialize;
use tracing::info;

use crate::registry::ActionHandler;
use crate::storage::ObjectStore;

pub const FUNCTION_NAME: &str = "create-pptx";

#[derive(Serialize)]
struct CreateDeckPayload<'a> {
    signed_url: &'a str,
}

/// Turns a topic and free-form content into a stored PPTX and answers with
/// a presigned download link.
pub struct CreateDeck {
    store: Arc<dyn ObjectStore>,
}

impl CreateDeck {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ActionHandler for CreateDeck {
    fn name(&self) -> &'static str {
        FUNCTION_NAME
    }

    async fn handle(&self, event: &ActionEvent) -> Result<ActionResponse, ApplicationError> {
        let topic = event.parameter("topic");
        let content = event.parameter("content");

        let deck = Deck::build(topic, content, Utc::now().date_naive());
        let file_name = deck.file_name();
        let bytes = DeckWriter::write(&deck)?;

        info!(
            event_name = "actions.create_deck.serialized",
            file_name = %file_name,
            slide_count = deck.slides.len() + 1,
            byte_count = bytes.len(),
            "serialized deck artifact"
        );

        self.store.put(&file_name, &bytes).await?;
        let signed_url = self.store.presigned_url(&file_name).await?;

        Ok(ActionResponse::text(
            &event.action_group,
            &event.function,
            &CreateDeckPayload { signed_url: &signed_url },
        )?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use deckhand_core::{ActionEvent, ApplicationError};
    use serde_json::json;

    use crate::registry::ActionHandler;
    use crate::storage::ObjectStore;

    use super::CreateDeck;

    #[derive(Default)]
    struct RecordingStore {
        puts: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ApplicationError> {
            self.puts.lock().expect("lock").push((key.to_string(), bytes.len()));
            Ok(())
        }

        async fn presigned_url(&self, key: &str) -> Result<String, ApplicationError> {
            Ok(format!("https://bucket.example/{key}?expires=3600"))
        }
    }

    struct FailingStore;

    #[async_trait]
    impl ObjectStore for FailingStore {
        async fn put(&self, _key: &str, _bytes: &[u8]) -> Result<(), ApplicationError> {
            Err(ApplicationError::Storage("bucket unreachable".to_string()))
        }

        async fn presigned_url(&self, _key: &str) -> Result<String, ApplicationError> {
            Err(ApplicationError::Storage("bucket unreachable".to_string()))
        }
    }

    fn event(topic: &str, content: &str) -> ActionEvent {
        serde_json::from_value(json!({
            "actionGroup": "deck-actions",
            "function": "create-pptx",
            "parameters": [
                {"name": "topic", "value": topic},
                {"name": "content", "value": content}
            ]
        }))
        .expect("event decodes")
    }

    #[tokio::test]
    async fn stores_the_deck_under_the_derived_key_and_answers_with_the_link() {
        let store = Arc::new(RecordingStore::default());
        let handler = CreateDeck::new(store.clone());

        let response =
            handler.handle(&event("AI trends", "A\nB")).await.expect("handler succeeds");

        let puts = store.puts.lock().expect("lock");
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].0, "AI_trends.pptx");
        assert!(puts[0].1 > 0);

        let payload: serde_json::Value =
            serde_json::from_str(response.payload()).expect("payload is json");
        assert_eq!(
            payload,
            json!({"signed_url": "https://bucket.example/AI_trends.pptx?expires=3600"})
        );
    }

    #[tokio::test]
    async fn missing_parameters_default_to_empty_strings_without_failing() {
        let store = Arc::new(RecordingStore::default());
        let handler = CreateDeck::new(store.clone());
        let bare: ActionEvent = serde_json::from_value(json!({
            "actionGroup": "deck-actions",
            "function": "create-pptx"
        }))
        .expect("event decodes");

        handler.handle(&bare).await.expect("handler stays total");

        let puts = store.puts.lock().expect("lock");
        assert_eq!(puts[0].0, ".pptx");
    }

    #[tokio::test]
    async fn storage_failures_surface_as_storage_errors() {
        let handler = CreateDeck::new(Arc::new(FailingStore));

        let error = handler.handle(&event("T", "A")).await.expect_err("put fails");
        assert!(matches!(error, ApplicationError::Storage(_)));
    }

    #[tokio::test]
    async fn response_envelope_echoes_action_group_and_function() {
        let handler = CreateDeck::new(Arc::new(RecordingStore::default()));

        let response = handler.handle(&event("T", "A")).await.expect("handler succeeds");
        assert_eq!(response.response.action_group, "deck-actions");
        assert_eq!(response.response.function, "create-pptx");
        assert_eq!(response.message_version, "1.0");
    }
}
