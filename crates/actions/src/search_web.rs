use std::sync::Arc;

use async_trait::async_trait;
use deckhand_core::{ActionEvent, ActionResponse, ApplicationError};
use serde::Serialize;

use crate::registry::ActionHandler;
use crate::search::{SearchHit, SearchProvider};

pub const FUNCTION_NAME: &str = "search-web";

#[derive(Serialize)]
struct SearchWebPayload<'a> {
    summary: &'a str,
}

/// Runs the search collaborator and answers with a flat text summary the
/// agent can fold into its reply.
pub struct SearchWeb {
    provider: Arc<dyn SearchProvider>,
}

impl SearchWeb {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }
}

fn format_summary(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| format!("Title: {}\nSummary: {}", hit.title, hit.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl ActionHandler for SearchWeb {
    fn name(&self) -> &'static str {
        FUNCTION_NAME
    }

    async fn handle(&self, event: &ActionEvent) -> Result<ActionResponse, ApplicationError> {
        let query = event.parameter("query");
        let hits = self.provider.search(query).await?;
        let summary = format_summary(&hits);

        Ok(ActionResponse::text(
            &event.action_group,
            &event.function,
            &SearchWebPayload { summary: &summary },
        )?)
    }
}
