//! Supabase password auth and the observable session used by sync.

mod tracker;

pub use tracker::{AuthEvent, AuthTracker};

use std::fmt;

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::{error_excerpt, is_http_url, normalize_text_option, unix_timestamp_now};

const EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("{0} is required")]
    MissingCredential(&'static str),
    #[error("Auth request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Malformed auth payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth server rejected the request: {0}")]
    Api(String),
    #[error("Could not access the saved session: {0}")]
    SessionStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Where a signed-in session is kept between runs.
pub trait SessionPersistence: Send + Sync {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// Body of a `/token` call; the variant picks the `grant_type`.
#[derive(Serialize)]
#[serde(untagged)]
enum Grant<'a> {
    Password { email: &'a str, password: &'a str },
    Refresh { refresh_token: &'a str },
}

impl Grant<'_> {
    const fn grant_type(&self) -> &'static str {
        match self {
            Self::Password { .. } => "password",
            Self::Refresh { .. } => "refresh_token",
        }
    }
}

/// Password sign-in against Supabase GoTrue, with the session persisted in
/// `store` after every successful grant.
pub struct SupabaseAuthClient<S: SessionPersistence> {
    auth_url: String,
    anon_key: String,
    http: Client,
    store: S,
}

impl<S: SessionPersistence> SupabaseAuthClient<S> {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>, store: S) -> AuthResult<Self> {
        let auth_url = normalize_auth_url(url.as_ref())?;
        let Some(anon_key) = normalize_text_option(Some(anon_key.into())) else {
            return Err(AuthError::InvalidConfiguration("anon key is empty"));
        };

        Ok(Self {
            auth_url,
            anon_key,
            http: Client::builder().build()?,
            store,
        })
    }

    /// Saved session from a previous run, refreshed if it has expired.
    ///
    /// When the refresh is refused the saved session is dropped and the
    /// caller starts signed out.
    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(saved) = self.store.load_session()? else {
            return Ok(None);
        };
        if !saved.is_expired() {
            tracing::debug!(user_id = %saved.user.id, "Restored saved session");
            return Ok(Some(saved));
        }

        match self.refresh_session(&saved.refresh_token).await {
            Ok(session) => Ok(Some(session)),
            Err(error) => {
                tracing::warn!(user_id = %saved.user.id, "Saved session could not be refreshed: {}", error);
                self.store.clear_session()?;
                Ok(None)
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::MissingCredential("Email"));
        }
        if password.is_empty() {
            return Err(AuthError::MissingCredential("Password"));
        }

        self.grant(Grant::Password { email, password }).await
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::MissingCredential("Refresh token"));
        }
        self.grant(Grant::Refresh { refresh_token }).await
    }

    /// Revoke `access_token` and forget the saved session.
    ///
    /// A token the server already considers invalid (401) is treated as
    /// signed out.
    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let response = self
            .http
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            ensure_success(response).await?;
        }
        self.store.clear_session()
    }

    async fn grant(&self, grant: Grant<'_>) -> AuthResult<AuthSession> {
        let response = self
            .http
            .post(format!("{}/token", self.auth_url))
            .query(&[("grant_type", grant.grant_type())])
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&grant)
            .send()
            .await?;

        let session = ensure_success(response)
            .await?
            .json::<TokenResponse>()
            .await?
            .into_session()
            .ok_or_else(|| AuthError::Api("token response carried no session".to_string()))?;

        self.store.save_session(&session)?;
        tracing::info!(user_id = %session.user.id, grant = grant.grant_type(), "Session issued");
        Ok(session)
    }
}

async fn ensure_success(response: Response) -> AuthResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AuthError::Api(parse_api_error(status, &body)))
}

/// Base URL of the GoTrue API for a Supabase project URL.
pub fn normalize_auth_url(url: &str) -> AuthResult<String> {
    let base = url.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(AuthError::InvalidConfiguration("Supabase URL is empty"));
    }
    if !is_http_url(base) {
        return Err(AuthError::InvalidConfiguration(
            "Supabase URL needs an http:// or https:// scheme",
        ));
    }
    let project = base.trim_end_matches("/auth/v1");
    Ok(format!("{project}/auth/v1"))
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<AuthUser>,
}

impl TokenResponse {
    fn into_session(self) -> Option<AuthSession> {
        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(at), _) => at,
            (None, Some(seconds)) => unix_timestamp_now().saturating_add(seconds),
            (None, None) => return None,
        };
        Some(AuthSession {
            access_token: self.access_token?,
            refresh_token: self.refresh_token?,
            expires_at,
            user: self.user?,
        })
    }
}

/// Human-readable message for a failed Supabase call.
///
/// GoTrue and PostgREST disagree on the field name, so the first of
/// `message`, `msg`, `error_description` or `error` wins; otherwise an excerpt
/// of the raw body is used.
pub(crate) fn parse_api_error(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        msg: Option<String>,
        error_description: Option<String>,
        error: Option<String>,
    }

    let code = status.as_u16();
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| {
            [body.message, body.msg, body.error_description, body.error]
                .into_iter()
                .find_map(normalize_text_option)
        })
        .unwrap_or_else(|| error_excerpt(body));

    if detail.is_empty() {
        format!("HTTP {code}")
    } else {
        format!("{detail} ({code})")
    }
}
