use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use quiz_core::model::UserId;

use crate::error::{ConfigError, PersistenceError, RegistrationError};

/// Contract for the remote registration/scoring service.
#[async_trait]
pub trait ScoreApi: Send + Sync {
    /// Register a quiz taker and return the identity to attach scores to.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError` on transport or server-side failure.
    async fn register_user(&self, username: &str) -> Result<UserId, RegistrationError>;

    /// Save the final score for a registered user. Single attempt, no retry.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` on transport or server-side failure.
    async fn save_score(&self, user_id: UserId, score: u32) -> Result<(), PersistenceError>;
}

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ApiConfig {
    /// Reads `QUIZ_API_URL` and `QUIZ_API_TIMEOUT_SECS` through `lookup`,
    /// falling back to defaults for unset or blank values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set but unusable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = lookup("QUIZ_API_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = check_base_url(url)?;
        }
        if let Some(raw) = lookup("QUIZ_API_TIMEOUT_SECS").filter(|v| !v.trim().is_empty()) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidEnv {
                    var: "QUIZ_API_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

/// Accepts only absolute http(s) URLs.
///
/// # Errors
///
/// Returns `ConfigError::InvalidBaseUrl` for any other scheme.
pub fn check_base_url(url: String) -> Result<String, ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url)
    } else {
        Err(ConfigError::InvalidBaseUrl(url))
    }
}

/// JSON-over-HTTP binding of `ScoreApi`.
#[derive(Clone, Debug)]
pub struct HttpScoreApi {
    client: Client,
    config: ApiConfig,
}

impl HttpScoreApi {
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ScoreApi for HttpScoreApi {
    async fn register_user(&self, username: &str) -> Result<UserId, RegistrationError> {
        let response = self
            .client
            .post(self.config.endpoint("register"))
            .json(&RegisterRequest { username })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RegistrationError::Status(response.status()));
        }

        let body: RegisterResponse = response.json().await?;
        if body.id.is_blank() {
            return Err(RegistrationError::InvalidResponse("blank id".into()));
        }
        Ok(body.id)
    }

    async fn save_score(&self, user_id: UserId, score: u32) -> Result<(), PersistenceError> {
        let response = self
            .client
            .post(self.config.endpoint("save-score"))
            .json(&SaveScoreRequest { user_id, score })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PersistenceError::Status(response.status()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    id: UserId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveScoreRequest {
    user_id: UserId,
    score: u32,
}

/// In-process `ScoreApi` for offline runs and tests.
///
/// Hands out sequential ids and keeps every saved score. Failures can be switched
/// on to exercise the error paths.
#[derive(Clone, Debug, Default)]
pub struct InMemoryScoreApi {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<String>,
    scores: Vec<(UserId, u32)>,
    fail_registration: bool,
    fail_saves: bool,
}

impl InMemoryScoreApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_failing_registration(self, fail: bool) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.fail_registration = fail;
        }
        self
    }

    #[must_use]
    pub fn with_failing_saves(self, fail: bool) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.fail_saves = fail;
        }
        self
    }

    /// Usernames registered so far, in order.
    #[must_use]
    pub fn users(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.users.clone())
            .unwrap_or_default()
    }

    /// Scores saved so far, in order.
    #[must_use]
    pub fn scores(&self) -> Vec<(UserId, u32)> {
        self.state
            .lock()
            .map(|state| state.scores.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ScoreApi for InMemoryScoreApi {
    async fn register_user(&self, username: &str) -> Result<UserId, RegistrationError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| RegistrationError::InvalidResponse(e.to_string()))?;
        if state.fail_registration {
            return Err(RegistrationError::Status(StatusCode::SERVICE_UNAVAILABLE));
        }
        state.users.push(username.to_owned());
        let id = u64::try_from(state.users.len()).unwrap_or(u64::MAX);
        Ok(UserId::new(id))
    }

    async fn save_score(&self, user_id: UserId, score: u32) -> Result<(), PersistenceError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| PersistenceError::Status(StatusCode::INTERNAL_SERVER_ERROR))?;
        if state.fail_saves {
            return Err(PersistenceError::Status(StatusCode::INTERNAL_SERVER_ERROR));
        }
        state.scores.push((user_id, score));
        Ok(())
    }
}
