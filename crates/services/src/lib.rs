#![forbid(unsafe_code)]

pub mod api;
pub mod bank;
pub mod error;
pub mod quiz_service;

pub use quiz_core::Clock;

pub use api::{ApiConfig, HttpScoreApi, InMemoryScoreApi, ScoreApi, check_base_url};
pub use error::{BankError, ConfigError, PersistenceError, RegistrationError};
pub use quiz_service::{Quiz, QuizAdvance, QuizService, RegisteredUser};
