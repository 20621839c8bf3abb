use serde_json::Value;

use crate::trace::{orchestration_trace, CompletionEvent};

/// One unit of transcript output. Expanders are collapsible sections: a
/// collapsed one shows its label only, an expanded one also prints its
/// body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayBlock {
    Expander { label: String, body: String, expanded: bool },
    Answer(String),
    Notice(String),
}

impl DisplayBlock {
    fn expander(label: &str, body: impl Into<String>, expanded: bool) -> Self {
        Self::Expander { label: label.to_string(), body: body.into(), expanded }
    }
}

/// Maps completion events to display blocks. Trace snapshots are matched
/// shape by shape; anything unrecognized renders to nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct TraceRenderer;

impl TraceRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, event: &CompletionEvent) -> Vec<DisplayBlock> {
        match event {
            CompletionEvent::Chunk(text) => vec![DisplayBlock::Answer(text.clone())],
            CompletionEvent::Trace(union) => self.render_trace(union),
            CompletionEvent::Unsupported(_) => Vec::new(),
        }
    }

    fn render_trace(&self, union: &Value) -> Vec<DisplayBlock> {
        let Some(trace) = orchestration_trace(union) else {
            return Vec::new();
        };

        let mut blocks = Vec::new();
        if let Some(input) = trace.model_invocation_input {
            blocks.push(DisplayBlock::expander(
                "\u{1f914} Thinking…",
                pretty_json_or_raw(&input.text),
                false,
            ));
        }
        if let Some(output) = trace.model_invocation_output {
            blocks.push(DisplayBlock::expander(
                "\u{1f4a1} Thoughts in place",
                extract_thinking(&output.raw_response.content),
                false,
            ));
        }
        if let Some(rationale) = trace.rationale {
            blocks.push(DisplayBlock::expander(
                "\u{2705} Decided the next action",
                rationale.text,
                true,
            ));
        }
        if let Some(invocation) = trace.invocation_input {
            if invocation.invocation_type == "ACTION_GROUP" {
                blocks.push(DisplayBlock::expander(
                    "\u{1f4bb} Running an action…",
                    pretty_value(&invocation.action_group_invocation_input),
                    false,
                ));
            }
        }
        if let Some(observation) = trace.observation {
            if observation.kind == "ACTION_GROUP" {
                blocks.push(DisplayBlock::expander(
                    "\u{1f4bb} Action result received",
                    observation.action_group_invocation_output.text,
                    false,
                ));
            }
        }
        blocks
    }
}

fn pretty_json_or_raw(text: &str) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => pretty_value(&value),
        Err(_) => text.to_string(),
    }
}

fn pretty_value(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// The raw model response packs its reasoning into `content[0].text`; fall
/// back to the first content element, then to the raw string.
fn extract_thinking(raw_content: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<Value>(raw_content) else {
        return raw_content.to_string();
    };
    let Some(first) = parsed.get("content").and_then(|content| content.get(0)) else {
        return raw_content.to_string();
    };
    match first.get("text").and_then(Value::as_str) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => pretty_value(first),
    }
}
