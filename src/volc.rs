use chrono::Utc;
use reqwest::Url;
use serde::Serialize;
use thiserror::Error;

use crate::config::Credentials;
use crate::signer::{self, SignableRequest};

pub const ACTION: &str = "CVProcess";
pub const API_VERSION: &str = "2022-08-31";
pub const SERVICE: &str = "cv";
pub const REGION: &str = "cn-north-1";
pub const REQ_KEY: &str = "high_aes_smart_drawing";

/// In-band success code of the visual API.
pub const SUCCESS_CODE: i64 = 10000;

const CONTENT_TYPE: &str = "application/json";

#[derive(Serialize)]
struct VendorRequest<'a> {
    req_key: &'a str,
    prompt: &'a str,
}

/// Body of a non-2xx vendor reply, kept as close to the wire as possible.
#[derive(Debug, Clone, PartialEq)]
pub enum VendorBody {
    Json(serde_json::Value),
    Text(String),
}

#[derive(Debug, Error)]
pub enum VendorError {
    #[error("Vendor API responded with status {status}")]
    Status { status: u16, body: VendorBody },

    #[error("Vendor request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse vendor response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid vendor API URL '{0}'")]
    InvalidUrl(String),
}

pub struct VolcClient {
    http_client: reqwest::Client,
    credentials: Credentials,
    base_url: String,
}

impl VolcClient {
    pub fn new(http_client: reqwest::Client, credentials: Credentials, base_url: &str) -> Self {
        Self {
            http_client,
            credentials,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Run the smart-drawing model on `prompt` and return the raw vendor JSON.
    pub async fn generate(&self, prompt: &str) -> Result<serde_json::Value, VendorError> {
        let url = Url::parse(&format!("{}/", self.base_url))
            .map_err(|_| VendorError::InvalidUrl(self.base_url.clone()))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(VendorError::InvalidUrl(self.base_url.clone())),
        };

        let body = serde_json::to_vec(&VendorRequest {
            req_key: REQ_KEY,
            prompt,
        })?;

        let query = [("Action", ACTION), ("Version", API_VERSION)];
        let signed = signer::sign(
            &self.credentials,
            REGION,
            SERVICE,
            &SignableRequest {
                method: "POST",
                host: &host,
                path: url.path(),
                query: &query,
                content_type: CONTENT_TYPE,
                body: &body,
            },
            Utc::now(),
        );

        let request_url = format!("{}?{}", url, signer::canonical_query(&query));
        let response = self
            .http_client
            .post(&request_url)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Date", &signed.x_date)
            .header("X-Content-Sha256", &signed.x_content_sha256)
            .header("Authorization", &signed.authorization)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let body = match serde_json::from_str(&text) {
                Ok(json) => VendorBody::Json(json),
                Err(_) => VendorBody::Text(text),
            };
            return Err(VendorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

/// The vendor's in-band status code, if the payload carries one.
pub fn response_code(response: &serde_json::Value) -> Option<i64> {
    response.get("code").and_then(serde_json::Value::as_i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> VolcClient {
        VolcClient::new(
            reqwest::Client::new(),
            Credentials {
                access_key_id: "AKTEST".to_string(),
                secret_key: "SKTEST".to_string(),
            },
            base_url,
        )
    }

    #[tokio::test]
    async fn sends_signed_request_with_fixed_parameters() {
        let server = MockServer::start().await;
        let reply = serde_json::json!({
            "code": 10000,
            "data": { "binary_data_base64": ["AAAA"] }
        });

        Mock::given(method("POST"))
            .and(path("/"))
            .and(query_param("Action", "CVProcess"))
            .and(query_param("Version", "2022-08-31"))
            .and(header("content-type", "application/json"))
            .and(header_exists("x-date"))
            .and(header_exists("x-content-sha256"))
            .and(header_exists("authorization"))
            .and(body_json(serde_json::json!({
                "req_key": "high_aes_smart_drawing",
                "prompt": "a red fox"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server.uri()).generate("a red fox").await.unwrap();
        assert_eq!(result, reply);
    }

    #[tokio::test]
    async fn authorization_header_uses_credential_scope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        client(&server.uri()).generate("x").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let auth = requests[0]
            .headers
            .get("authorization")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(auth.starts_with("HMAC-SHA256 Credential=AKTEST/"));
        assert!(auth.contains("/cn-north-1/cv/request, "));
        assert!(auth.contains("SignedHeaders=content-type;host;x-content-sha256;x-date"));
    }

    #[tokio::test]
    async fn non_success_status_keeps_json_body() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({ "code": 50411, "message": "Pre Img Risk Not Pass" });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(error_body.clone()))
            .mount(&server)
            .await;

        let err = client(&server.uri()).generate("x").await.unwrap_err();
        match err {
            VendorError::Status { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, VendorBody::Json(error_body));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_success_status_keeps_text_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client(&server.uri()).generate("x").await.unwrap_err();
        assert!(matches!(
            err,
            VendorError::Status { status: 502, body: VendorBody::Text(ref t) } if t == "bad gateway"
        ));
    }

    #[tokio::test]
    async fn undecodable_success_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server.uri()).generate("x").await.unwrap_err();
        assert!(matches!(err, VendorError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_vendor_is_transport_error() {
        // nothing listens on port 9 of localhost
        let err = client("http://127.0.0.1:9").generate("x").await.unwrap_err();
        assert!(matches!(err, VendorError::Transport(_)));
    }

    #[tokio::test]
    async fn invalid_base_url_is_rejected_early() {
        let err = client("not a url").generate("x").await.unwrap_err();
        assert!(matches!(err, VendorError::InvalidUrl(_)));
    }

    #[test]
    fn reads_in_band_code() {
        assert_eq!(response_code(&serde_json::json!({ "code": 10000 })), Some(10000));
        assert_eq!(response_code(&serde_json::json!({ "data": {} })), None);
    }
}
