//! Object storage over the provider's `/storage/v1` REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use luminarch_platform_access::AuthenticationError;
use luminarch_ticket::{ObjectStorage, StorageError};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use rootcause::Report;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use crate::auth::ProviderClient;

/// Supplies the bearer token storage calls run under.
#[async_trait]
pub trait AccessTokens: Send + Sync {
    async fn access_token(&self) -> Result<Option<String>, Report<AuthenticationError>>;
}

#[async_trait]
impl AccessTokens for ProviderClient {
    async fn access_token(&self) -> Result<Option<String>, Report<AuthenticationError>> {
        ProviderClient::access_token(self).await
    }
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct StorageErrorBody {
    #[serde(default, rename = "statusCode")]
    status_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// One storage bucket, accessed with the signed-in user's token.
pub struct BucketStorage {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    bucket: String,
    tokens: Arc<dyn AccessTokens>,
}

impl BucketStorage {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        anon_key: &str,
        bucket: &str,
        tokens: Arc<dyn AccessTokens>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            bucket: bucket.to_string(),
            tokens,
        }
    }

    /// Builds `{base}/storage/v1/{prefix...}/{bucket}/{path}` with each
    /// segment percent-encoded.
    fn object_url(&self, prefix: &[&str], path: &str) -> Result<Url, String> {
        let mut url = Url::parse(&self.base_url).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|()| format!("{} cannot be a base URL", self.base_url))?
            .pop_if_empty()
            .extend(["storage", "v1"])
            .extend(prefix)
            .push(&self.bucket)
            .extend(path.split('/'));
        Ok(url)
    }

    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, String> {
        let token = self
            .tokens
            .access_token()
            .await
            .map_err(|e| e.to_string())?
            .unwrap_or_else(|| self.anon_key.clone());

        Ok(self
            .http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token))
    }
}

/// Reads the failure out of a non-success response. `Ok(None)` means the
/// object does not exist.
async fn failure_message(response: Response) -> Option<String> {
    let status = response.status();
    let body: StorageErrorBody = response.json().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND || body.status_code.as_deref() == Some("404") {
        return None;
    }
    Some(
        body.message
            .or(body.error)
            .unwrap_or_else(|| status.to_string()),
    )
}

#[async_trait]
impl ObjectStorage for BucketStorage {
    #[instrument(skip(self, bytes), fields(bucket = %self.bucket, size = bytes.len()))]
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), Report<StorageError>> {
        let upload_failed = |message: String| StorageError::UploadFailed {
            path: path.to_string(),
            message,
        };

        let url = self.object_url(&["object"], path).map_err(upload_failed)?;
        let response = self
            .request(Method::POST, url)
            .await
            .map_err(upload_failed)?
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| upload_failed(e.to_string()))?;

        if !response.status().is_success() {
            let message = failure_message(response)
                .await
                .unwrap_or_else(|| format!("bucket {} not found", self.bucket));
            return Err(upload_failed(message).into());
        }

        debug!("object uploaded");
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn create_signed_url(
        &self,
        path: &str,
        expires_in: Duration,
    ) -> Result<String, Report<StorageError>> {
        let sign_failed = |message: String| StorageError::SignFailed {
            path: path.to_string(),
            message,
        };

        let url = self
            .object_url(&["object", "sign"], path)
            .map_err(sign_failed)?;
        let response = self
            .request(Method::POST, url)
            .await
            .map_err(sign_failed)?
            .json(&json!({ "expiresIn": expires_in.as_secs() }))
            .send()
            .await
            .map_err(|e| sign_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(match failure_message(response).await {
                Some(message) => sign_failed(message),
                None => StorageError::NotFound {
                    path: path.to_string(),
                },
            }
            .into());
        }

        let signed: SignedUrlResponse = response
            .json()
            .await
            .map_err(|e| sign_failed(e.to_string()))?;

        Ok(format!("{}/storage/v1{}", self.base_url, signed.signed_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedToken(Option<&'static str>);

    #[async_trait]
    impl AccessTokens for FixedToken {
        async fn access_token(&self) -> Result<Option<String>, Report<AuthenticationError>> {
            Ok(self.0.map(str::to_string))
        }
    }

    fn storage(server: &MockServer, token: Option<&'static str>) -> BucketStorage {
        BucketStorage::new(
            reqwest::Client::new(),
            &server.uri(),
            "anon-key",
            "ticket-files",
            Arc::new(FixedToken(token)),
        )
    }

    #[tokio::test]
    async fn upload_posts_bytes_under_user_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/ticket-files/u1/tkt_1/17-0_logo.png"))
            .and(header("authorization", "Bearer user-token"))
            .and(header("apikey", "anon-key"))
            .and(header("content-type", "image/png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "x" })))
            .expect(1)
            .mount(&server)
            .await;

        storage(&server, Some("user-token"))
            .upload("u1/tkt_1/17-0_logo.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn path_segments_are_percent_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/ticket-files/u1/t/0-0_brand%20guide.pdf"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        storage(&server, None)
            .upload("u1/t/0-0_brand guide.pdf", Vec::new(), "application/pdf")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejected_upload_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "statusCode": "403",
                "error": "Unauthorized",
                "message": "new row violates row-level security policy"
            })))
            .mount(&server)
            .await;

        let err = storage(&server, Some("t"))
            .upload("u1/t/f", Vec::new(), "text/plain")
            .await
            .unwrap_err();

        assert_eq!(
            err.current_context(),
            &StorageError::UploadFailed {
                path: "u1/t/f".to_string(),
                message: "new row violates row-level security policy".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn signed_url_is_absolute() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/sign/ticket-files/u1/t/f.txt"))
            .and(body_json(json!({ "expiresIn": 300 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "signedURL": "/object/sign/ticket-files/u1/t/f.txt?token=abc"
            })))
            .mount(&server)
            .await;

        let url = storage(&server, Some("t"))
            .create_signed_url("u1/t/f.txt", Duration::from_secs(300))
            .await
            .unwrap();

        assert_eq!(
            url,
            format!(
                "{}/storage/v1/object/sign/ticket-files/u1/t/f.txt?token=abc",
                server.uri()
            )
        );
    }

    #[tokio::test]
    async fn signing_missing_object_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "statusCode": "404",
                "error": "not_found",
                "message": "Object not found"
            })))
            .mount(&server)
            .await;

        let err = storage(&server, Some("t"))
            .create_signed_url("u1/t/gone.txt", Duration::from_secs(60))
            .await
            .unwrap_err();

        assert_eq!(
            err.current_context(),
            &StorageError::NotFound {
                path: "u1/t/gone.txt".to_string()
            }
        );
    }
}
