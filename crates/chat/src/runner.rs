use std::io::{self, BufRead, Write};

use crate::gateway::{AgentGateway, GatewayError};
use crate::render::{DisplayBlock, TraceRenderer};
use crate::session::ChatSession;

pub const THROTTLE_NOTICE: &str =
    "The agent is under heavy load right now. Wait a minute and try again.";

/// The front-end event loop: one prompt in, the rendered completion stream
/// out, answer text appended to the transcript.
pub struct ChatRunner<G> {
    gateway: G,
    renderer: TraceRenderer,
    session: ChatSession,
}

impl<G: AgentGateway> ChatRunner<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway, renderer: TraceRenderer::new(), session: ChatSession::new() }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Handles one prompt. Gateway failures come back as notices rather
    /// than errors: the transcript keeps only what was actually said, so a
    /// failed attempt leaves no partial state behind.
    pub async fn handle_prompt(&mut self, prompt: &str) -> Vec<DisplayBlock> {
        self.session.record_user(prompt);
        let session_id = self.session.session_id.to_string();

        match self.gateway.invoke(&session_id, prompt).await {
            Ok(events) => {
                let mut blocks = Vec::new();
                let mut answer = String::new();
                for event in &events {
                    for block in self.renderer.render(event) {
                        if let DisplayBlock::Answer(text) = &block {
                            answer.push_str(text);
                        }
                        blocks.push(block);
                    }
                }
                if !answer.is_empty() {
                    self.session.record_assistant(answer);
                }
                blocks
            }
            Err(GatewayError::Throttled) => vec![DisplayBlock::Notice(THROTTLE_NOTICE.to_string())],
            Err(error) => {
                vec![DisplayBlock::Notice(format!("The agent call failed: {error}. Please try again."))]
            }
        }
    }

    /// Reads prompts line by line until EOF or `/quit`, writing rendered
    /// blocks to `output`.
    pub async fn run<R: BufRead, W: Write>(&mut self, input: R, output: &mut W) -> io::Result<()> {
        writeln!(output, "deckhand chat - session {}", self.session.session_id)?;
        for line in input.lines() {
            let line = line?;
            let prompt = line.trim();
            if prompt.is_empty() {
                continue;
            }
            if prompt == "/quit" || prompt == "/exit" {
                break;
            }
            for block in self.handle_prompt(prompt).await {
                write_block(output, &block)?;
            }
        }
        Ok(())
    }
}

fn write_block<W: Write>(output: &mut W, block: &DisplayBlock) -> io::Result<()> {
    match block {
        DisplayBlock::Expander { label, body, expanded } => {
            writeln!(output, "{label}")?;
            if *expanded {
                for line in body.lines() {
                    writeln!(output, "  {line}")?;
                }
            }
            Ok(())
        }
        DisplayBlock::Answer(text) => writeln!(output, "{text}"),
        DisplayBlock::Notice(text) => writeln!(output, "! {text}"),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::gateway::{AgentGateway, GatewayError};
    use crate::render::DisplayBlock;
    use crate::session::Role;
    use crate::trace::CompletionEvent;

    use super::{ChatRunner, THROTTLE_NOTICE};

    struct ScriptedGateway {
        events: Vec<CompletionEvent>,
    }

    #[async_trait]
    impl AgentGateway for ScriptedGateway {
        async fn invoke(
            &self,
            _session_id: &str,
            _input_text: &str,
        ) -> Result<Vec<CompletionEvent>, GatewayError> {
            Ok(self.events.clone())
        }
    }

    struct ThrottledGateway;

    #[async_trait]
    impl AgentGateway for ThrottledGateway {
        async fn invoke(
            &self,
            _session_id: &str,
            _input_text: &str,
        ) -> Result<Vec<CompletionEvent>, GatewayError> {
            Err(GatewayError::Throttled)
        }
    }

    fn scripted_runner() -> ChatRunner<ScriptedGateway> {
        ChatRunner::new(ScriptedGateway {
            events: vec![
                CompletionEvent::Trace(json!({
                    "orchestrationTrace": {"rationale": {"text": "build the deck"}}
                })),
                CompletionEvent::Chunk("Deck is ready: ".to_string()),
                CompletionEvent::Chunk("https://bucket.example/d.pptx".to_string()),
            ],
        })
    }

    #[tokio::test]
    async fn renders_traces_and_stitches_answer_chunks_into_the_transcript() {
        let mut runner = scripted_runner();

        let blocks = runner.handle_prompt("make a deck about rust").await;
        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks[0], DisplayBlock::Expander { .. }));

        let messages = &runner.session().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].text, "Deck is ready: https://bucket.example/d.pptx");
    }

    #[tokio::test]
    async fn throttling_surfaces_as_a_retry_notice_without_an_assistant_turn() {
        let mut runner = ChatRunner::new(ThrottledGateway);

        let blocks = runner.handle_prompt("make a deck").await;
        assert_eq!(blocks, vec![DisplayBlock::Notice(THROTTLE_NOTICE.to_string())]);

        let messages = &runner.session().messages;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
    }

    #[tokio::test]
    async fn run_loop_consumes_prompts_until_quit() {
        let mut runner = scripted_runner();
        let input = Cursor::new("make a deck\n/quit\nignored\n");
        let mut output = Vec::new();

        runner.run(input, &mut output).await.expect("loop completes");

        let rendered = String::from_utf8(output).expect("utf-8 output");
        assert!(rendered.contains("Decided the next action"));
        assert!(rendered.contains("https://bucket.example/d.pptx"));
        assert!(!rendered.contains("ignored"));
    }

    #[tokio::test]
    async fn blank_lines_are_skipped_without_invoking_the_gateway() {
        let mut runner = scripted_runner();
        let input = Cursor::new("\n   \n/quit\n");
        let mut output = Vec::new();

        runner.run(input, &mut output).await.expect("loop completes");
        assert!(runner.session().messages.is_empty());
    }
}
