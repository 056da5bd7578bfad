mod ids;
mod question;

pub use ids::UserId;
pub use question::{ChoiceIndex, ChoiceIndexError, Question, QuestionBank, QuestionError};
