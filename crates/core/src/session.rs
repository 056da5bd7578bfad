//! Quiz session state machine.
//!
//! A session walks a shuffled copy of the question bank one question at a time.
//! Each question locks on its first selection; `advance` is only honoured once
//! the current question is locked, and advancing past the last question
//! completes the session. Calls that arrive in the wrong state are ignored
//! rather than rejected.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use thiserror::Error;

use crate::model::{ChoiceIndex, Question, QuestionBank};
use crate::shuffle::shuffle_with;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("question bank is empty")]
    EmptyBank,
}

//
// ─── OUTCOMES ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    InProgress,
    Completed,
}

/// What the presentation layer needs to highlight a locked question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub chosen: ChoiceIndex,
    pub correct: ChoiceIndex,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Session completed or question already locked.
    Ignored,
    Locked(AnswerFeedback),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Session completed or current question not yet answered.
    Ignored,
    Moved { index: usize },
    Completed { score: u32, total: usize },
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    /// One-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub score: u32,
    pub is_complete: bool,
}

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

pub struct QuizSession {
    bank: QuestionBank,
    sequence: Vec<Question>,
    current: usize,
    selection: Option<ChoiceIndex>,
    score: u32,
    status: SessionStatus,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a session over a freshly shuffled copy of `bank`.
    ///
    /// `started_at` should come from the services layer clock to keep time deterministic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyBank` if the bank has no questions.
    pub fn start<R: Rng + ?Sized>(
        bank: QuestionBank,
        rng: &mut R,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if bank.is_empty() {
            return Err(SessionError::EmptyBank);
        }
        let sequence = shuffle_with(bank.questions(), rng);
        Ok(Self {
            bank,
            sequence,
            current: 0,
            selection: None,
            score: 0,
            status: SessionStatus::InProgress,
            started_at,
            completed_at: None,
        })
    }

    /// Record a selection for the current question.
    ///
    /// The first selection locks the question and scores it; later selections,
    /// and any selection after completion, are ignored.
    pub fn select_answer(&mut self, choice: ChoiceIndex) -> SelectOutcome {
        if self.is_complete() || self.is_locked() {
            return SelectOutcome::Ignored;
        }

        let correct = self.sequence[self.current].correct();
        let is_correct = correct == choice;
        if is_correct {
            self.score += 1;
        }
        self.selection = Some(choice);

        SelectOutcome::Locked(AnswerFeedback {
            chosen: choice,
            correct,
            is_correct,
        })
    }

    /// Move past a locked question, completing the session after the last one.
    ///
    /// `now` is recorded as the completion time when this call finishes the quiz.
    pub fn advance(&mut self, now: DateTime<Utc>) -> AdvanceOutcome {
        if self.is_complete() || !self.is_locked() {
            return AdvanceOutcome::Ignored;
        }

        if self.current + 1 == self.sequence.len() {
            self.status = SessionStatus::Completed;
            self.completed_at = Some(now);
            return AdvanceOutcome::Completed {
                score: self.score,
                total: self.sequence.len(),
            };
        }

        self.current += 1;
        self.selection = None;
        AdvanceOutcome::Moved {
            index: self.current,
        }
    }

    /// Reshuffle the bank and return to the initial state. Valid in any state.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R, started_at: DateTime<Utc>) {
        self.sequence = shuffle_with(self.bank.questions(), rng);
        self.current = 0;
        self.selection = None;
        self.score = 0;
        self.status = SessionStatus::InProgress;
        self.started_at = started_at;
        self.completed_at = None;
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.sequence[self.current]
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.sequence.len()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.selection.is_some()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    #[must_use]
    pub fn selection(&self) -> Option<ChoiceIndex> {
        self.selection
    }

    /// Highlight data for the current question once it is locked.
    #[must_use]
    pub fn feedback(&self) -> Option<AnswerFeedback> {
        let chosen = self.selection?;
        let correct = self.current_question().correct();
        Some(AnswerFeedback {
            chosen,
            correct,
            is_correct: chosen == correct,
        })
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        QuizProgress {
            position: self.current + 1,
            total: self.total(),
            score: self.score,
            is_complete: self.is_complete(),
        }
    }

    #[must_use]
    pub fn sequence(&self) -> &[Question] {
        &self.sequence
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Time from (re)start to completion; `None` while in progress.
    #[must_use]
    pub fn elapsed(&self) -> Option<TimeDelta> {
        self.completed_at.map(|done| done - self.started_at)
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("sequence_len", &self.sequence.len())
            .field("current", &self.current)
            .field("selection", &self.selection)
            .field("score", &self.score)
            .field("status", &self.status)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
