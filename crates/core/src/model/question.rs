use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors raised when a raw selection cannot be turned into a `ChoiceIndex`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChoiceIndexError {
    #[error("choice index {0} is outside 1..=4")]
    OutOfRange(u8),
}

/// Errors raised while assembling questions or a question bank.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("invalid correct answer: {0}")]
    InvalidAnswer(#[from] ChoiceIndexError),
}

//
// ─── CHOICE INDEX ─────────────────────────────────────────────────────────────
//

/// One-based position of a choice within a question (1..=4).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChoiceIndex(u8);

impl ChoiceIndex {
    /// Number of choices every question carries.
    pub const COUNT: u8 = 4;

    /// Builds a choice index from its one-based value.
    ///
    /// # Errors
    ///
    /// Returns `ChoiceIndexError::OutOfRange` unless `value` is in `1..=4`.
    pub fn new(value: u8) -> Result<Self, ChoiceIndexError> {
        if (1..=Self::COUNT).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ChoiceIndexError::OutOfRange(value))
        }
    }

    /// Returns the one-based value.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Returns the zero-based slot into `Question::choices`.
    #[must_use]
    pub fn slot(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// Iterates all valid indices in display order.
    pub fn all() -> impl Iterator<Item = ChoiceIndex> {
        (1..=Self::COUNT).map(ChoiceIndex)
    }
}

impl TryFrom<u8> for ChoiceIndex {
    type Error = ChoiceIndexError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Debug for ChoiceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChoiceIndex({})", self.0)
    }
}

impl fmt::Display for ChoiceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    prompt: String,
    choices: [String; 4],
    correct: ChoiceIndex,
}

impl Question {
    #[must_use]
    pub fn new(prompt: impl Into<String>, choices: [String; 4], correct: ChoiceIndex) -> Self {
        Self {
            prompt: prompt.into(),
            choices,
            correct,
        }
    }

    /// Builds a question from a raw one-based answer number.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidAnswer` if `correct` is not in `1..=4`.
    pub fn from_raw(
        prompt: impl Into<String>,
        choices: [String; 4],
        correct: u8,
    ) -> Result<Self, QuestionError> {
        Ok(Self::new(prompt, choices, ChoiceIndex::new(correct)?))
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[String; 4] {
        &self.choices
    }

    #[must_use]
    pub fn choice(&self, index: ChoiceIndex) -> &str {
        &self.choices[index.slot()]
    }

    #[must_use]
    pub fn correct(&self) -> ChoiceIndex {
        self.correct
    }

    #[must_use]
    pub fn is_correct(&self, choice: ChoiceIndex) -> bool {
        self.correct == choice
    }
}

//
// ─── QUESTION BANK ────────────────────────────────────────────────────────────
//

/// The full, fixed question set for a quiz.
///
/// Cloning is cheap; every session shares the same backing slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank(Arc<[Question]>);

impl QuestionBank {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self(questions.into())
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.0
    }
}

impl Deref for QuestionBank {
    type Target = [Question];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Question>> for QuestionBank {
    fn from(questions: Vec<Question>) -> Self {
        Self::new(questions)
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
