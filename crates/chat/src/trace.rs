use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

/// One event from the agent completion stream.
#[derive(Clone, Debug, PartialEq)]
pub enum CompletionEvent {
    /// A fragment of the final answer text.
    Chunk(String),
    /// A trace snapshot; holds the trace union object, of which only the
    /// orchestration branch is rendered.
    Trace(Value),
    /// A shape this front-end does not recognize. Skipped by the renderer.
    Unsupported(Value),
}

impl CompletionEvent {
    /// Decodes one event payload by shape. Both the enveloped stream form
    /// (`{"chunk": …}` / `{"trace": {"trace": …}}`) and the bare payloads
    /// delivered over HTTP (`{"bytes": …}` / `{"trace": …}`) are accepted.
    pub fn from_value(value: Value) -> Self {
        if let Some(chunk) = value.get("chunk") {
            if let Some(text) = chunk_text(chunk) {
                return Self::Chunk(text);
            }
        }
        if value.get("bytes").is_some() {
            if let Some(text) = chunk_text(&value) {
                return Self::Chunk(text);
            }
        }
        if let Some(trace_event) = value.get("trace") {
            if let Some(union) = trace_event.get("trace") {
                return Self::Trace(union.clone());
            }
            return Self::Trace(trace_event.clone());
        }
        Self::Unsupported(value)
    }
}

/// Answer bytes arrive base64-encoded over JSON; a value that fails to
/// decode is taken as plain text.
fn chunk_text(chunk: &Value) -> Option<String> {
    let encoded = chunk.get("bytes")?.as_str()?;
    match BASE64.decode(encoded) {
        Ok(decoded) => Some(String::from_utf8_lossy(&decoded).into_owned()),
        Err(_) => Some(encoded.to_string()),
    }
}

/// The orchestration branch of a trace union, in the shapes the renderer
/// knows how to display. Every field is optional; a snapshot usually
/// carries exactly one of them.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrchestrationTrace {
    pub model_invocation_input: Option<ModelInvocationInput>,
    pub model_invocation_output: Option<ModelInvocationOutput>,
    pub rationale: Option<Rationale>,
    pub invocation_input: Option<InvocationInput>,
    pub observation: Option<Observation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModelInvocationInput {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelInvocationOutput {
    pub raw_response: RawResponse,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawResponse {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Rationale {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InvocationInput {
    pub invocation_type: String,
    pub action_group_invocation_input: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Observation {
    #[serde(rename = "type")]
    pub kind: String,
    pub action_group_invocation_output: ActionGroupOutput,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActionGroupOutput {
    pub text: String,
}

/// Extracts the orchestration branch from a trace union, if present.
pub fn orchestration_trace(union: &Value) -> Option<OrchestrationTrace> {
    let branch = union.get("orchestrationTrace")?;
    serde_json::from_value(branch.clone()).ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{orchestration_trace, CompletionEvent};

    #[test]
    fn enveloped_chunk_decodes_to_answer_text() {
        let event = CompletionEvent::from_value(json!({"chunk": {"bytes": "SGVsbG8h"}}));

        assert_eq!(event, CompletionEvent::Chunk("Hello!".to_string()));
    }

    #[test]
    fn bare_chunk_payload_decodes_too() {
        let event = CompletionEvent::from_value(json!({"bytes": "SGVsbG8h"}));

        assert_eq!(event, CompletionEvent::Chunk("Hello!".to_string()));
    }

    #[test]
    fn non_base64_bytes_pass_through_as_plain_text() {
        let event = CompletionEvent::from_value(json!({"chunk": {"bytes": "not@base64!"}}));

        assert_eq!(event, CompletionEvent::Chunk("not@base64!".to_string()));
    }

    #[test]
    fn enveloped_trace_unwraps_to_the_union() {
        let event = CompletionEvent::from_value(json!({
            "trace": {
                "agentId": "A1",
                "trace": {"orchestrationTrace": {"rationale": {"text": "do the thing"}}}
            }
        }));

        let CompletionEvent::Trace(union) = event else { panic!("expected trace") };
        let trace = orchestration_trace(&union).expect("orchestration branch");
        assert_eq!(trace.rationale.expect("rationale").text, "do the thing");
    }

    #[test]
    fn bare_trace_event_unwraps_to_the_union() {
        let event = CompletionEvent::from_value(json!({
            "agentId": "A1",
            "trace": {"orchestrationTrace": {"rationale": {"text": "next step"}}}
        }));

        let CompletionEvent::Trace(union) = event else { panic!("expected trace") };
        assert!(orchestration_trace(&union).is_some());
    }

    #[test]
    fn non_orchestration_trace_has_no_renderable_branch() {
        let event = CompletionEvent::from_value(json!({
            "trace": {"trace": {"guardrailTrace": {"action": "NONE"}}}
        }));

        let CompletionEvent::Trace(union) = event else { panic!("expected trace") };
        assert!(orchestration_trace(&union).is_none());
    }

    #[test]
    fn unknown_shapes_are_preserved_as_unsupported() {
        let event = CompletionEvent::from_value(json!({"returnControl": {"invocationId": "x"}}));

        assert!(matches!(event, CompletionEvent::Unsupported(_)));
    }
}
