use async_trait::async_trait;
use chrono::Utc;
use deckhand_core::aws::{uri_encode, RequestSigner, SigningRequest};
use deckhand_core::config::{AgentConfig, AwsConfig};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::trace::CompletionEvent;

const EVENT_STREAM_CONTENT_TYPE: &str = "application/vnd.amazon.eventstream";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("agent invocation throttled")]
    Throttled,
    #[error("agent invocation failed: {0}")]
    Invoke(String),
    #[error("completion stream decode failed: {0}")]
    Decode(String),
}

/// Invokes the conversational agent for one prompt and returns the decoded
/// completion events in stream order.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    async fn invoke(
        &self,
        session_id: &str,
        input_text: &str,
    ) -> Result<Vec<CompletionEvent>, GatewayError>;
}

/// Offline stand-in used when no agent is configured.
#[derive(Default)]
pub struct NoopAgentGateway;

#[async_trait]
impl AgentGateway for NoopAgentGateway {
    async fn invoke(
        &self,
        _session_id: &str,
        _input_text: &str,
    ) -> Result<Vec<CompletionEvent>, GatewayError> {
        Ok(vec![CompletionEvent::Chunk(
            "No agent gateway is configured. Set agent.agent_id and agent.agent_alias_id to chat."
                .to_string(),
        )])
    }
}

/// Signed HTTP gateway to the agent runtime endpoint.
pub struct HttpAgentGateway {
    client: reqwest::Client,
    signer: RequestSigner,
    host: String,
    agent_id: String,
    agent_alias_id: String,
}

impl HttpAgentGateway {
    pub fn from_config(aws: &AwsConfig, agent: &AgentConfig) -> Result<Self, GatewayError> {
        if agent.agent_id.is_empty() || agent.agent_alias_id.is_empty() {
            return Err(GatewayError::Invoke(
                "agent.agent_id and agent.agent_alias_id must be set".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            signer: RequestSigner::new(aws.credentials(), aws.region.clone(), "bedrock"),
            host: format!("bedrock-agent-runtime.{}.amazonaws.com", aws.region),
            agent_id: agent.agent_id.clone(),
            agent_alias_id: agent.agent_alias_id.clone(),
        })
    }
}

#[async_trait]
impl AgentGateway for HttpAgentGateway {
    async fn invoke(
        &self,
        session_id: &str,
        input_text: &str,
    ) -> Result<Vec<CompletionEvent>, GatewayError> {
        let path = format!(
            "/agents/{}/agentAliases/{}/sessions/{}/text",
            self.agent_id,
            self.agent_alias_id,
            uri_encode(session_id, true)
        );
        let body = serde_json::to_vec(&serde_json::json!({
            "inputText": input_text,
            "enableTrace": true,
        }))
        .map_err(|error| GatewayError::Decode(error.to_string()))?;

        let signed = self
            .signer
            .sign(
                &SigningRequest {
                    method: "POST",
                    host: &self.host,
                    path: &path,
                    query: &[],
                    headers: &[("content-type", "application/json")],
                    payload: &body,
                },
                Utc::now(),
            )
            .map_err(|error| GatewayError::Invoke(error.to_string()))?;

        let mut request = self
            .client
            .post(format!("https://{}{path}", self.host))
            .header("content-type", "application/json")
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", &signed.authorization)
            .body(body);
        if let Some(token) = &signed.security_token {
            request = request.header("x-amz-security-token", token);
        }

        let response = request
            .send()
            .await
            .map_err(|error| GatewayError::Invoke(error.to_string()))?;
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 || detail.contains("throttlingException") {
                return Err(GatewayError::Throttled);
            }
            return Err(GatewayError::Invoke(format!("agent endpoint returned {status}: {detail}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|error| GatewayError::Invoke(error.to_string()))?;
        debug!(
            event_name = "chat.gateway.completion_received",
            byte_count = bytes.len(),
            content_type = %content_type,
            "received completion response"
        );

        if content_type.starts_with(EVENT_STREAM_CONTENT_TYPE) {
            decode_completion_stream(&bytes)
        } else {
            let value: Value = serde_json::from_slice(&bytes)
                .map_err(|error| GatewayError::Decode(error.to_string()))?;
            Ok(vec![CompletionEvent::from_value(value)])
        }
    }
}

/// Splits a binary event stream into its JSON message payloads.
///
/// Each frame is `[total_len][headers_len][prelude_crc] headers payload
/// [message_crc]` with big-endian u32 words. The event kind is recovered
/// from the payload shape, so the header block is skipped; the CRC words
/// are not validated.
pub fn decode_completion_stream(bytes: &[u8]) -> Result<Vec<CompletionEvent>, GatewayError> {
    let mut events = Vec::new();
    let mut offset = 0usize;

    while offset < bytes.len() {
        if offset + 16 > bytes.len() {
            return Err(GatewayError::Decode("truncated frame prelude".to_string()));
        }
        let total = read_u32(bytes, offset) as usize;
        let headers_len = read_u32(bytes, offset + 4) as usize;
        if total < 16 || offset + total > bytes.len() {
            return Err(GatewayError::Decode("frame length out of bounds".to_string()));
        }
        let payload_start = offset + 12 + headers_len;
        let payload_end = offset + total - 4;
        if payload_start > payload_end {
            return Err(GatewayError::Decode("frame headers overrun payload".to_string()));
        }

        let payload = &bytes[payload_start..payload_end];
        if !payload.is_empty() {
            if let Ok(value) = serde_json::from_slice::<Value>(payload) {
                events.push(CompletionEvent::from_value(value));
            }
        }
        offset += total;
    }

    Ok(events)
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

#[cfg(test)]
mod tests {
    use deckhand_core::config::AppConfig;
    use serde_json::json;

    use crate::trace::CompletionEvent;

    use super::{decode_completion_stream, AgentGateway, HttpAgentGateway, NoopAgentGateway};

    fn frame(payload: &[u8]) -> Vec<u8> {
        let total = (16 + payload.len()) as u32;
        let mut frame = Vec::new();
        frame.extend_from_slice(&total.to_be_bytes());
        frame.extend_from_slice(&0u32.to_be_bytes());
        frame.extend_from_slice(&0u32.to_be_bytes());
        frame.extend_from_slice(payload);
        frame.extend_from_slice(&0u32.to_be_bytes());
        frame
    }

    #[test]
    fn decodes_consecutive_frames_in_order() {
        let mut stream = frame(json!({"bytes": "SGVsbG8h"}).to_string().as_bytes());
        stream.extend(frame(
            json!({"trace": {"orchestrationTrace": {"rationale": {"text": "r"}}}})
                .to_string()
                .as_bytes(),
        ));

        let events = decode_completion_stream(&stream).expect("stream decodes");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], CompletionEvent::Chunk("Hello!".to_string()));
        assert!(matches!(events[1], CompletionEvent::Trace(_)));
    }

    #[test]
    fn truncated_streams_are_rejected() {
        let mut stream = frame(json!({"bytes": "SGVsbG8h"}).to_string().as_bytes());
        stream.truncate(stream.len() - 6);

        assert!(decode_completion_stream(&stream).is_err());
    }

    #[test]
    fn empty_stream_decodes_to_no_events() {
        let events = decode_completion_stream(&[]).expect("empty stream is fine");
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn noop_gateway_answers_with_a_configuration_hint() {
        let events =
            NoopAgentGateway.invoke("session", "hello").await.expect("noop never fails");

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], CompletionEvent::Chunk(text) if text.contains("agent_id")));
    }

    #[test]
    fn http_gateway_requires_agent_identifiers() {
        let config = AppConfig::default();

        assert!(HttpAgentGateway::from_config(&config.aws, &config.agent).is_err());
    }
}
