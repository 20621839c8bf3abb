use std::sync::Arc;

use async_trait::async_trait;
use deckhand_core::{ActionEvent, ActionResponse, ApplicationError};
use serde::Serialize;

use crate::notify::Notifier;
use crate::registry::ActionHandler;

pub const FUNCTION_NAME: &str = "send-email";

#[derive(Serialize)]
struct SendMailPayload<'a> {
    message: &'a str,
    #[serde(rename = "presentationUrl")]
    presentation_url: &'a str,
}

/// Publishes the deck link to the notification topic subscribers (email
/// delivery is the topic's concern, not this handler's).
pub struct SendMail {
    notifier: Arc<dyn Notifier>,
    subject: String,
}

impl SendMail {
    pub fn new(notifier: Arc<dyn Notifier>, subject: impl Into<String>) -> Self {
        Self { notifier, subject: subject.into() }
    }
}

fn notification_message(signed_url: &str) -> String {
    format!(
        "The agent has finished your slide deck. The download link stays valid for one hour:\n{signed_url}"
    )
}

#[async_trait]
impl ActionHandler for SendMail {
    fn name(&self) -> &'static str {
        FUNCTION_NAME
    }

    async fn handle(&self, event: &ActionEvent) -> Result<ActionResponse, ApplicationError> {
        // By-name lookup first; some callers pass the link as the sole
        // positional parameter, so that stays as the fallback.
        let named = event.parameter("signed_url");
        let signed_url = if named.is_empty() { event.first_parameter() } else { named };

        self.notifier.publish(&self.subject, &notification_message(signed_url)).await?;

        Ok(ActionResponse::text(
            event.action_group_or(FUNCTION_NAME),
            event.function_or(FUNCTION_NAME),
            &SendMailPayload { message: "Email sent successfully", presentation_url: signed_url },
        )?)
    }
}
