#![forbid(unsafe_code)]

pub mod model;
pub mod session;
pub mod shuffle;
pub mod time;

pub use session::{
    AdvanceOutcome, AnswerFeedback, QuizProgress, QuizSession, SelectOutcome, SessionError,
    SessionStatus,
};
pub use time::Clock;
