//! AWS request signing (Signature Version 4).
//!
//! Collaborators that speak to AWS query APIs sign their own HTTP requests
//! with the derived-key HMAC chain. The signer is a pure function of the
//! request, the credentials, and an injected timestamp, which keeps it fully
//! testable against the published AWS vectors.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone, Debug)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: Option<SecretString>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SigningError {
    #[error("signing key material rejected")]
    KeyMaterial,
}

/// The parts of an HTTP request that participate in the signature. Extra
/// headers (e.g. `content-type`) are signed alongside the `host` and
/// `x-amz-date` headers the signer adds itself.
#[derive(Clone, Debug)]
pub struct SigningRequest<'a> {
    pub method: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    pub query: &'a [(&'a str, &'a str)],
    pub headers: &'a [(&'a str, &'a str)],
    pub payload: &'a [u8],
}

/// Header values to attach to the outgoing request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedRequest {
    pub amz_date: String,
    pub authorization: String,
    pub content_sha256: String,
    pub security_token: Option<String>,
}

pub struct RequestSigner {
    credentials: AwsCredentials,
    region: String,
    service: String,
}

impl RequestSigner {
    pub fn new(
        credentials: AwsCredentials,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self { credentials, region: region.into(), service: service.into() }
    }

    pub fn sign(
        &self,
        request: &SigningRequest<'_>,
        at: DateTime<Utc>,
    ) -> Result<SignedRequest, SigningError> {
        let amz_date = at.format("%Y%m%dT%H%M%SZ").to_string();
        let date_scope = at.format("%Y%m%d").to_string();
        let payload_hash = sha256_hex(request.payload);

        let mut headers: Vec<(String, String)> = request
            .headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string()))
            .collect();
        headers.push(("host".to_string(), request.host.to_string()));
        headers.push(("x-amz-date".to_string(), amz_date.clone()));
        let security_token = self
            .credentials
            .session_token
            .as_ref()
            .map(|token| token.expose_secret().to_string());
        if let Some(token) = &security_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }
        headers.sort();

        let signed_headers =
            headers.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>().join(";");
        let canonical_headers: String =
            headers.iter().map(|(name, value)| format!("{name}:{value}\n")).collect();

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            request.method,
            request.path,
            canonical_query_string(request.query),
            canonical_headers,
            signed_headers,
            payload_hash
        );

        let scope = format!("{date_scope}/{}/{}/aws4_request", self.region, self.service);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        let signing_key = self.derive_signing_key(&date_scope)?;
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.credentials.access_key_id
        );

        Ok(SignedRequest { amz_date, authorization, content_sha256: payload_hash, security_token })
    }

    fn derive_signing_key(&self, date_scope: &str) -> Result<Vec<u8>, SigningError> {
        let seed = format!("AWS4{}", self.credentials.secret_access_key.expose_secret());
        let date_key = hmac_sha256(seed.as_bytes(), date_scope.as_bytes())?;
        let region_key = hmac_sha256(&date_key, self.region.as_bytes())?;
        let service_key = hmac_sha256(&region_key, self.service.as_bytes())?;
        hmac_sha256(&service_key, b"aws4_request")
    }
}

/// URI-encodes a value per the SigV4 canonicalization rules. Path segments
/// keep their slashes; query keys and values encode them.
pub fn uri_encode(value: &str, encode_slash: bool) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char);
            }
            b'/' if !encode_slash => encoded.push('/'),
            _ => {
                encoded.push('%');
                encoded.push_str(&format!("{byte:02X}"));
            }
        }
    }
    encoded
}

fn canonical_query_string(query: &[(&str, &str)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(key, value)| (uri_encode(key, true), uri_encode(value, true)))
        .collect();
    pairs.sort();
    pairs.iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join("&")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SigningError::KeyMaterial)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::{uri_encode, AwsCredentials, RequestSigner, SigningRequest};

    fn example_signer() -> RequestSigner {
        RequestSigner::new(
            AwsCredentials {
                access_key_id: "AKIDEXAMPLE".to_string(),
                secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string().into(),
                session_token: None,
            },
            "us-east-1",
            "iam",
        )
    }

    #[test]
    fn derives_the_published_aws_signing_key() {
        let signer = example_signer();
        let key = signer.derive_signing_key("20150830").expect("key derivation");

        assert_eq!(
            hex::encode(key),
            "c4afb1cc5771d871763a393e44b703571b55cc28424d1a5e86da6ed3c154a4b9"
        );
    }

    #[test]
    fn reproduces_the_published_aws_request_signature() {
        let signer = example_signer();
        let at = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).single().expect("valid timestamp");

        let signed = signer
            .sign(
                &SigningRequest {
                    method: "GET",
                    host: "iam.amazonaws.com",
                    path: "/",
                    query: &[("Action", "ListUsers"), ("Version", "2010-05-08")],
                    headers: &[(
                        "content-type",
                        "application/x-www-form-urlencoded; charset=utf-8",
                    )],
                    payload: b"",
                },
                at,
            )
            .expect("signing succeeds");

        assert_eq!(signed.amz_date, "20150830T123600Z");
        assert!(signed.authorization.ends_with(
            "Signature=5d672d79c15b13162d9279b0855cfba6789a8edb4c82c400e06b5924a6f2b5d7"
        ));
        assert!(signed
            .authorization
            .contains("Credential=AKIDEXAMPLE/20150830/us-east-1/iam/aws4_request"));
        assert!(signed.authorization.contains("SignedHeaders=content-type;host;x-amz-date"));
    }

    #[test]
    fn session_token_joins_the_signed_headers() {
        let signer = RequestSigner::new(
            AwsCredentials {
                access_key_id: "AKIDEXAMPLE".to_string(),
                secret_access_key: "secret".to_string().into(),
                session_token: Some("token-value".to_string().into()),
            },
            "ap-northeast-1",
            "sns",
        );
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).single().expect("valid timestamp");

        let signed = signer
            .sign(
                &SigningRequest {
                    method: "POST",
                    host: "sns.ap-northeast-1.amazonaws.com",
                    path: "/",
                    query: &[],
                    headers: &[],
                    payload: b"Action=Publish",
                },
                at,
            )
            .expect("signing succeeds");

        assert_eq!(signed.security_token.as_deref(), Some("token-value"));
        assert!(signed
            .authorization
            .contains("SignedHeaders=host;x-amz-date;x-amz-security-token"));
    }

    #[test]
    fn uri_encoding_follows_the_canonical_rules() {
        assert_eq!(uri_encode("AI trends 2025", true), "AI%20trends%202025");
        assert_eq!(uri_encode("a/b", false), "a/b");
        assert_eq!(uri_encode("a/b", true), "a%2Fb");
        assert_eq!(uri_encode("safe-._~", true), "safe-._~");
    }
}
