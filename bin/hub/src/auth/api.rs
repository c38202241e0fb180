//! HTTP client for the identity provider's REST API.

use chrono::{DateTime, Duration, Utc};
use luminarch_core::IdentityId;
use luminarch_platform_access::{
    AuthenticationError, Identity, ProviderConfig, Session, SignUpRequest,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use rootcause::Report;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

/// Which endpoint family a failure came from; decides how statuses map.
#[derive(Debug, Clone, Copy)]
enum Endpoint {
    /// Token grants: a 4xx means the credentials were rejected.
    Grant,
    /// Calls made with a bearer token: 401/403 means the session is gone.
    Authenticated,
    /// Everything else.
    Public,
}

/// User record as returned by the provider.
#[derive(Debug, Deserialize)]
pub struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl UserResponse {
    pub fn into_identity(self) -> Identity {
        Identity::new(
            IdentityId::new(self.id),
            self.email.unwrap_or_default(),
            self.created_at,
        )
        .with_full_name(self.user_metadata.full_name)
        .with_name(self.user_metadata.name)
    }
}

/// Tokens issued by a grant or an auto-confirmed sign-up.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
    user: UserResponse,
}

impl TokenResponse {
    pub fn into_session(self) -> Session {
        Session::new(
            self.access_token,
            self.refresh_token,
            Duration::seconds(self.expires_in),
            self.user.into_identity(),
        )
    }

    /// Updates an existing session, keeping its refresh token when the
    /// provider did not rotate it.
    pub fn apply_to(self, session: &mut Session) {
        session.refresh(
            self.access_token,
            self.refresh_token,
            Duration::seconds(self.expires_in),
        );
        session.set_identity(self.user.into_identity());
    }
}

/// Sign-up answers with tokens when email confirmation is disabled, and
/// with the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(TokenResponse),
    PendingConfirmation(UserResponse),
}

/// Error body; providers differ in which field carries the message.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self, status: StatusCode) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .unwrap_or_else(|| status.to_string())
    }
}

/// Thin wrapper over the provider's `/auth/v1` endpoints.
#[derive(Clone)]
pub struct AuthApi {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl AuthApi {
    pub fn new(http: reqwest::Client, config: ProviderConfig) -> Self {
        Self { http, config }
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.http
            .request(method, self.config.auth_endpoint(endpoint))
            .header("apikey", self.config.anon_key())
    }

    fn with_redirect(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.config.redirect_url() {
            Some(url) => builder.query(&[("redirect_to", url)]),
            None => builder,
        }
    }

    /// Exchanges email and password for a session.
    #[instrument(skip(self, password))]
    pub async fn password_grant(
        &self,
        email: &str,
        password: &str,
    ) -> Result<TokenResponse, Report<AuthenticationError>> {
        let response = self
            .request(Method::POST, "token?grant_type=password")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport_error)?;

        parse(response, Endpoint::Grant).await
    }

    /// Exchanges a refresh token for a new session.
    #[instrument(skip_all)]
    pub async fn refresh_grant(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, Report<AuthenticationError>> {
        let response = self
            .request(Method::POST, "token?grant_type=refresh_token")
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(transport_error)?;

        parse(response, Endpoint::Grant).await
    }

    /// Emails a one-time sign-in link.
    #[instrument(skip(self))]
    pub async fn send_otp(&self, email: &str) -> Result<(), Report<AuthenticationError>> {
        let builder = self
            .request(Method::POST, "otp")
            .json(&json!({ "email": email, "create_user": true }));
        let response = self
            .with_redirect(builder)
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response, Endpoint::Public).await?;
        debug!("magic link requested");
        Ok(())
    }

    /// Registers a new account with `full_name` metadata.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn sign_up(
        &self,
        request: &SignUpRequest,
    ) -> Result<SignUpResponse, Report<AuthenticationError>> {
        let builder = self.request(Method::POST, "signup").json(&json!({
            "email": request.email,
            "password": request.password,
            "data": { "full_name": request.full_name },
        }));
        let response = self
            .with_redirect(builder)
            .send()
            .await
            .map_err(transport_error)?;

        parse(response, Endpoint::Public).await
    }

    /// Fetches the user record for an access token.
    #[instrument(skip_all)]
    pub async fn get_user(&self, access_token: &str) -> Result<Identity, Report<AuthenticationError>> {
        let response = self
            .request(Method::GET, "user")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        let user: UserResponse = parse(response, Endpoint::Authenticated).await?;
        Ok(user.into_identity())
    }

    /// Revokes the session behind an access token.
    #[instrument(skip_all)]
    pub async fn logout(&self, access_token: &str) -> Result<(), Report<AuthenticationError>> {
        let response = self
            .request(Method::POST, "logout")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response, Endpoint::Authenticated).await?;
        Ok(())
    }
}

fn transport_error(e: reqwest::Error) -> AuthenticationError {
    AuthenticationError::ProviderError {
        reason: e.to_string(),
    }
}

async fn ensure_success(
    response: Response,
    endpoint: Endpoint,
) -> Result<Response, Report<AuthenticationError>> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: ErrorBody = response.json().await.unwrap_or_default();
    let reason = body.into_message(status);
    debug!(%status, %reason, "identity provider rejected request");

    let error = match (endpoint, status) {
        (Endpoint::Grant, s) if s.is_client_error() => {
            AuthenticationError::InvalidCredentials { reason }
        }
        (Endpoint::Authenticated, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
            AuthenticationError::SessionExpired
        }
        _ => AuthenticationError::ProviderError { reason },
    };
    Err(error.into())
}

async fn parse<T: DeserializeOwned>(
    response: Response,
    endpoint: Endpoint,
) -> Result<T, Report<AuthenticationError>> {
    let response = ensure_success(response, endpoint).await?;
    let value = response
        .json()
        .await
        .map_err(|e| AuthenticationError::InvalidResponse {
            reason: e.to_string(),
        })?;
    Ok(value)
}
