//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use quiz_core::model::QuestionError;

/// Errors emitted while registering a quiz taker.
///
/// The quiz stays unregistered when any of these is returned, so the caller can
/// simply retry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistrationError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("registration failed with status {0}")]
    Status(reqwest::StatusCode),
    #[error("registration returned an unusable response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while saving a final score. Logged, never surfaced to the quiz flow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    #[error("save-score failed with status {0}")]
    Status(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while reading score-service settings.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("base url must start with http:// or https://: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid {var} value: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Errors emitted while loading a question bank.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("question {position}: {source}")]
    Question {
        position: usize,
        #[source]
        source: QuestionError,
    },
}
