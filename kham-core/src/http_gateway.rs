//! [`SyncGateway`] over the backend's REST API.
//!
//! The bearer token returned by [`HttpGateway::register`] or
//! [`HttpGateway::login`] is kept and sent with every authenticated call;
//! the `user_id` argument of the gateway methods is not sent, since the
//! server identifies the player by token.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::gateway::{GatewayError, Profile, ProfileUpdate, SyncGateway};
use crate::lexicon::Lexicon;
use crate::progress::ProgressState;
use crate::schema::{
    AuthResponse, LeaderboardEntry, LeaderboardSubmission, LoginRequest, Period,
    ProfileRequest, ProgressDocument, PublicUser, RegisterRequest,
};

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: PublicUser,
}

#[derive(Deserialize)]
struct EntryEnvelope {
    entry: LeaderboardEntry,
}

/// HTTP client for the progress backend.
#[derive(Clone)]
pub struct HttpGateway {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: Client,
    base: Url,
    lexicon: Arc<Lexicon>,
    token: RwLock<Option<String>>,
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base", &self.inner.base.as_str())
            .field("authenticated", &self.token().is_some())
            .finish_non_exhaustive()
    }
}

impl HttpGateway {
    /// Create a client for a backend root URL such as `http://localhost:3000`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] if the URL is malformed and
    /// [`GatewayError::Transport`] if the HTTP client fails to build.
    pub fn new(base_url: impl AsRef<str>, lexicon: Arc<Lexicon>) -> Result<Self, GatewayError> {
        let mut base = Url::parse(base_url.as_ref())
            .map_err(|e| GatewayError::Validation(format!("invalid backend URL: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = Client::builder()
            .user_agent(concat!("kham/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(InnerClient {
                http,
                base,
                lexicon,
                token: RwLock::new(None),
            }),
        })
    }

    /// Current bearer token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Use an existing bearer token.
    pub fn set_token(&self, token: impl Into<String>) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    /// Forget the bearer token.
    pub fn clear_token(&self) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, GatewayError> {
        let url = self
            .inner
            .base
            .join(path)
            .map_err(|e| GatewayError::Validation(format!("invalid path {path}: {e}")))?;
        Ok(self.inner.http.request(method, url))
    }

    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, GatewayError> {
        let token = self
            .token()
            .ok_or_else(|| GatewayError::Auth("not signed in".to_string()))?;
        Ok(self.request(method, path)?.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| GatewayError::Transport(format!("unexpected response: {e}")));
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map_or_else(|_| status.to_string(), |body| body.error);
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Auth(message),
            StatusCode::NOT_FOUND => GatewayError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                GatewayError::Validation(message)
            }
            StatusCode::CONFLICT => GatewayError::Conflict(message),
            _ => GatewayError::Transport(format!("{status}: {message}")),
        })
    }

    async fn authenticate<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<AuthResponse, GatewayError> {
        let response: AuthResponse =
            Self::send(self.request(Method::POST, path)?.json(body)).await?;
        self.set_token(response.token.clone());
        Ok(response)
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Validation`] for rejected input,
    /// [`GatewayError::Conflict`] for a taken username, or transport failures.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, GatewayError> {
        self.authenticate("api/auth/register", request).await
    }

    /// Sign in.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Validation`] for bad credentials, or transport failures.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, GatewayError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.authenticate("api/auth/login", &body).await
    }

    /// Top leaderboard entries for a period.
    ///
    /// # Errors
    ///
    /// Transport failures or [`GatewayError::Validation`] for a bad limit.
    pub async fn fetch_leaderboard(
        &self,
        period: Period,
        limit: Option<usize>,
    ) -> Result<Vec<LeaderboardEntry>, GatewayError> {
        let mut request = self.request(Method::GET, &format!("api/leaderboard/{period}"))?;
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        Self::send(request).await
    }

    /// Record the signed-in player's score for a period.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Auth`] when not signed in, or transport failures.
    pub async fn submit_leaderboard(
        &self,
        score: u32,
        level: u32,
        period: Period,
    ) -> Result<LeaderboardEntry, GatewayError> {
        let body = LeaderboardSubmission {
            score,
            level,
            period: period.to_string(),
        };
        let envelope: EntryEnvelope =
            Self::send(self.authed(Method::POST, "api/leaderboard")?.json(&body)).await?;
        Ok(envelope.entry)
    }
}

#[async_trait]
impl SyncGateway for HttpGateway {
    async fn load_progress(&self, _user_id: &str) -> Result<ProgressState, GatewayError> {
        let doc: ProgressDocument = Self::send(self.authed(Method::GET, "api/progress")?).await?;
        Ok(doc.into_state(&self.inner.lexicon))
    }

    async fn save_progress(&self, _user_id: &str, state: &ProgressState) -> Result<(), GatewayError> {
        let doc = ProgressDocument::from_state(state);
        let _: serde_json::Value =
            Self::send(self.authed(Method::PUT, "api/progress")?.json(&doc)).await?;
        Ok(())
    }

    async fn load_profile(&self, _user_id: &str) -> Result<Profile, GatewayError> {
        let user: PublicUser = Self::send(self.authed(Method::GET, "api/user/profile")?).await?;
        Ok(Profile::from(&user))
    }

    async fn update_profile(
        &self,
        _user_id: &str,
        update: ProfileUpdate,
    ) -> Result<Profile, GatewayError> {
        let body = ProfileRequest {
            display_name: update.display_name,
            character_id: update.character_id.map(|c| i64::from(c.get())),
        };
        let envelope: UserEnvelope =
            Self::send(self.authed(Method::PUT, "api/user/profile")?.json(&body)).await?;
        Ok(Profile::from(&envelope.user))
    }
}
