use async_trait::async_trait;
use chrono::Utc;
use deckhand_core::aws::{uri_encode, RequestSigner, SigningRequest};
use deckhand_core::config::{AwsConfig, NotifyConfig};
use deckhand_core::ApplicationError;
use tracing::info;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";
const SNS_API_VERSION: &str = "2010-03-31";

/// Notification dispatch: publish one message to the configured topic.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), ApplicationError>;
}

/// Publishes through the SNS query API: a SigV4-signed form POST against
/// the regional endpoint.
pub struct SnsNotifier {
    client: reqwest::Client,
    signer: RequestSigner,
    host: String,
    topic_arn: String,
}

impl SnsNotifier {
    pub fn from_config(aws: &AwsConfig, notify: &NotifyConfig) -> Result<Self, ApplicationError> {
        if notify.topic_arn.is_empty() {
            return Err(ApplicationError::Configuration("notify.topic_arn is not set".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            signer: RequestSigner::new(aws.credentials(), aws.region.clone(), "sns"),
            host: format!("sns.{}.amazonaws.com", aws.region),
            topic_arn: notify.topic_arn.clone(),
        })
    }

    fn form_body(&self, subject: &str, message: &str) -> String {
        form_encode(&[
            ("Action", "Publish"),
            ("Message", message),
            ("Subject", subject),
            ("TopicArn", &self.topic_arn),
            ("Version", SNS_API_VERSION),
        ])
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), ApplicationError> {
        let body = self.form_body(subject, message);
        let signed = self
            .signer
            .sign(
                &SigningRequest {
                    method: "POST",
                    host: &self.host,
                    path: "/",
                    query: &[],
                    headers: &[("content-type", FORM_CONTENT_TYPE)],
                    payload: body.as_bytes(),
                },
                Utc::now(),
            )
            .map_err(|error| ApplicationError::Notification(error.to_string()))?;

        let mut request = self
            .client
            .post(format!("https://{}/", self.host))
            .header("content-type", FORM_CONTENT_TYPE)
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", &signed.authorization)
            .body(body);
        if let Some(token) = &signed.security_token {
            request = request.header("x-amz-security-token", token);
        }

        let response = request
            .send()
            .await
            .map_err(|error| ApplicationError::Notification(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ApplicationError::Notification(format!(
                "publish returned {status}: {detail}"
            )));
        }

        info!(
            event_name = "actions.notify.published",
            topic_arn = %self.topic_arn,
            "published notification"
        );
        Ok(())
    }
}

fn form_encode(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", uri_encode(key, true), uri_encode(value, true)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use deckhand_core::config::AppConfig;

    use super::{form_encode, SnsNotifier};

    fn notifier() -> SnsNotifier {
        let mut config = AppConfig::default();
        config.notify.topic_arn = "arn:aws:sns:ap-northeast-1:123456789012:deck-ready".to_string();
        SnsNotifier::from_config(&config.aws, &config.notify).expect("notifier constructs")
    }

    #[test]
    fn missing_topic_arn_is_rejected_at_construction() {
        let config = AppConfig::default();

        assert!(SnsNotifier::from_config(&config.aws, &config.notify).is_err());
    }

    #[test]
    fn publish_body_is_form_encoded_in_canonical_order() {
        let body = notifier().form_body("Deck ready", "line one\nhttps://example.com/d.pptx");

        assert!(body.starts_with("Action=Publish&Message=line%20one%0Ahttps%3A%2F%2F"));
        assert!(body.contains("&Subject=Deck%20ready&"));
        assert!(body.contains(
            "&TopicArn=arn%3Aaws%3Asns%3Aap-northeast-1%3A123456789012%3Adeck-ready&"
        ));
        assert!(body.ends_with("Version=2010-03-31"));
    }

    #[test]
    fn form_encoding_leaves_unreserved_characters_alone() {
        assert_eq!(form_encode(&[("Key", "a-b._~")]), "Key=a-b._~");
    }
}
