//! Session store and authenticator backed by the identity provider.

use async_trait::async_trait;
use luminarch_platform_access::{
    AuthenticationError, Authenticator, Identity, Session, SessionBroadcaster, SessionEvent,
    SessionEvents, SessionStore, SignUpOutcome, SignUpRequest,
};
use rootcause::Report;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::api::{AuthApi, SignUpResponse};
use super::session_file::SessionFile;

#[derive(Debug, Default)]
struct SessionCache {
    /// The file has been read at least once.
    loaded: bool,
    /// The identity was confirmed with the provider during this run.
    verified: bool,
    session: Option<Session>,
}

/// Identity provider client holding the session for this process.
///
/// The session is read from disk lazily, confirmed against the provider
/// once per run, and refreshed when it is about to expire.
pub struct ProviderClient {
    api: AuthApi,
    file: SessionFile,
    cache: Mutex<SessionCache>,
    broadcaster: SessionBroadcaster,
}

impl ProviderClient {
    pub fn new(api: AuthApi, file: SessionFile) -> Self {
        Self {
            api,
            file,
            cache: Mutex::new(SessionCache::default()),
            broadcaster: SessionBroadcaster::new(),
        }
    }

    /// Access token of the current session, refreshed if needed.
    ///
    /// Storage calls authenticate with this token.
    pub async fn access_token(&self) -> Result<Option<String>, Report<AuthenticationError>> {
        if self.current_session().await?.is_none() {
            return Ok(None);
        }
        let cache = self.cache.lock().await;
        Ok(cache.session.as_ref().map(|s| s.access_token().to_string()))
    }

    async fn establish(&self, session: Session) -> Result<Identity, Report<AuthenticationError>> {
        self.file.save(&session).await?;
        let identity = session.identity().clone();

        let mut cache = self.cache.lock().await;
        *cache = SessionCache {
            loaded: true,
            verified: true,
            session: Some(session),
        };
        drop(cache);

        info!(user_id = %identity.id(), "signed in");
        self.broadcaster.emit(SessionEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn refresh(
        &self,
        cache: &mut SessionCache,
    ) -> Result<Option<Identity>, Report<AuthenticationError>> {
        let refresh_token = cache
            .session
            .as_ref()
            .and_then(Session::refresh_token)
            .map(str::to_string);

        let Some(refresh_token) = refresh_token else {
            debug!("session expired without refresh token");
            self.discard(cache).await?;
            return Ok(None);
        };

        match self.api.refresh_grant(&refresh_token).await {
            Ok(tokens) => {
                let Some(session) = cache.session.as_mut() else {
                    return Ok(None);
                };
                tokens.apply_to(session);
                self.file.save(session).await?;
                let identity = session.identity().clone();
                cache.verified = true;
                debug!(user_id = %identity.id(), "session refreshed");
                self.broadcaster
                    .emit(SessionEvent::TokenRefreshed(identity.clone()));
                Ok(Some(identity))
            }
            Err(e) if is_rejection(&e) => {
                warn!(error = %e, "refresh token rejected, signing out");
                self.discard(cache).await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn discard(&self, cache: &mut SessionCache) -> Result<(), Report<AuthenticationError>> {
        self.file.clear().await?;
        let had_session = cache.session.take().is_some();
        cache.loaded = true;
        cache.verified = false;
        if had_session {
            self.broadcaster.emit(SessionEvent::SignedOut);
        }
        Ok(())
    }
}

fn is_rejection(err: &Report<AuthenticationError>) -> bool {
    matches!(
        err.current_context(),
        AuthenticationError::InvalidCredentials { .. } | AuthenticationError::SessionExpired
    )
}

#[async_trait]
impl SessionStore for ProviderClient {
    #[instrument(skip(self))]
    async fn current_session(&self) -> Result<Option<Identity>, Report<AuthenticationError>> {
        let mut guard = self.cache.lock().await;
        let cache = &mut *guard;

        if !cache.loaded {
            cache.session = self.file.load().await?;
            cache.loaded = true;
        }

        let Some(session) = cache.session.as_ref() else {
            return Ok(None);
        };

        let mut expired = session.needs_refresh();
        if !expired && !cache.verified {
            match self.api.get_user(session.access_token()).await {
                Ok(identity) => {
                    if let Some(session) = cache.session.as_mut() {
                        session.set_identity(identity);
                    }
                    cache.verified = true;
                }
                Err(e) if matches!(e.current_context(), AuthenticationError::SessionExpired) => {
                    expired = true;
                }
                Err(e) => return Err(e),
            }
        }

        if expired {
            return self.refresh(cache).await;
        }

        Ok(cache.session.as_ref().map(|s| s.identity().clone()))
    }

    fn subscribe(&self) -> SessionEvents {
        self.broadcaster.subscribe()
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), Report<AuthenticationError>> {
        let mut guard = self.cache.lock().await;
        let cache = &mut *guard;

        if !cache.loaded {
            cache.session = self.file.load().await?;
        }

        if let Some(session) = cache.session.as_ref()
            && let Err(e) = self.api.logout(session.access_token()).await
        {
            warn!(error = %e, "provider logout failed, clearing local session anyway");
        }

        self.discard(cache).await?;
        info!("signed out");
        Ok(())
    }
}

#[async_trait]
impl Authenticator for ProviderClient {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, Report<AuthenticationError>> {
        let tokens = self.api.password_grant(email.trim(), password).await?;
        self.establish(tokens.into_session()).await
    }

    async fn send_magic_link(&self, email: &str) -> Result<(), Report<AuthenticationError>> {
        self.api.send_otp(email.trim()).await
    }

    async fn sign_up(
        &self,
        request: &SignUpRequest,
    ) -> Result<SignUpOutcome, Report<AuthenticationError>> {
        match self.api.sign_up(request).await? {
            SignUpResponse::Session(tokens) => {
                let identity = self.establish(tokens.into_session()).await?;
                Ok(SignUpOutcome::SignedIn(identity))
            }
            SignUpResponse::PendingConfirmation(_) => {
                info!(email = %request.email, "sign-up awaiting email confirmation");
                Ok(SignUpOutcome::ConfirmationRequired)
            }
        }
    }
}
