use std::fmt;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use quiz_core::model::{ChoiceIndex, QuestionBank, UserId};
use quiz_core::{AdvanceOutcome, Clock, QuizSession, SelectOutcome, SessionError};

use crate::api::ScoreApi;
use crate::error::RegistrationError;

//
// ─── QUIZ ─────────────────────────────────────────────────────────────────────
//

/// Identity attached to a quiz after successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredUser {
    pub id: UserId,
    pub username: String,
}

/// A shuffled session plus the registration gate in front of it.
///
/// Selections and advances are ignored until a user is registered.
pub struct Quiz {
    session: QuizSession,
    user: Option<RegisteredUser>,
    rng: StdRng,
}

impl Quiz {
    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn user(&self) -> Option<&RegisteredUser> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.user.is_some()
    }
}

impl fmt::Debug for Quiz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Quiz")
            .field("session", &self.session)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Result of `QuizService::advance`.
#[derive(Debug)]
pub struct QuizAdvance {
    pub outcome: AdvanceOutcome,
    /// Handle to the detached score save, present only on the completing advance.
    ///
    /// Dropping it does not cancel the save.
    pub save: Option<JoinHandle<()>>,
}

//
// ─── SERVICE ──────────────────────────────────────────────────────────────────
//

/// Orchestrates registration, answering and best-effort score persistence.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    api: Arc<dyn ScoreApi>,
    bank: QuestionBank,
    seed: Option<u64>,
}

impl QuizService {
    #[must_use]
    pub fn new(clock: Clock, api: Arc<dyn ScoreApi>, bank: QuestionBank) -> Self {
        Self {
            clock,
            api,
            bank,
            seed: None,
        }
    }

    /// Fix the shuffle seed so every quiz from this service replays the same order.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Shuffle the bank into a new, unregistered quiz.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyBank` if the bank has no questions.
    pub fn new_quiz(&self) -> Result<Quiz, SessionError> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let session = QuizSession::start(self.bank.clone(), &mut rng, self.clock.now())?;
        debug!(questions = session.total(), "quiz shuffled");
        Ok(Quiz {
            session,
            user: None,
            rng,
        })
    }

    /// Register `username` and open the quiz.
    ///
    /// A quiz that is already registered keeps its user and no request is made.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::EmptyUsername` for blank names, or the
    /// collaborator's error. The quiz stays unregistered on error.
    pub async fn register(
        &self,
        quiz: &mut Quiz,
        username: &str,
    ) -> Result<UserId, RegistrationError> {
        if let Some(user) = &quiz.user {
            return Ok(user.id.clone());
        }

        let username = username.trim();
        if username.is_empty() {
            return Err(RegistrationError::EmptyUsername);
        }

        let id = self.api.register_user(username).await?;
        info!(user_id = %id, username, "user registered");
        quiz.user = Some(RegisteredUser {
            id: id.clone(),
            username: username.to_owned(),
        });
        Ok(id)
    }

    pub fn select_answer(&self, quiz: &mut Quiz, choice: ChoiceIndex) -> SelectOutcome {
        if !quiz.is_registered() {
            return SelectOutcome::Ignored;
        }
        let outcome = quiz.session.select_answer(choice);
        if let SelectOutcome::Locked(feedback) = outcome {
            debug!(
                index = quiz.session.current_index(),
                chosen = %feedback.chosen,
                correct = %feedback.correct,
                "answer locked"
            );
        }
        outcome
    }

    /// Advance the quiz. On completion the score save is dispatched as a
    /// detached task; its failure never reaches the caller.
    pub fn advance(&self, quiz: &mut Quiz) -> QuizAdvance {
        let Some(user_id) = quiz.user.as_ref().map(|u| u.id.clone()) else {
            return QuizAdvance {
                outcome: AdvanceOutcome::Ignored,
                save: None,
            };
        };

        let outcome = quiz.session.advance(self.clock.now());
        let save = match outcome {
            AdvanceOutcome::Completed { score, total } => {
                info!(
                    user_id = %user_id,
                    score,
                    total,
                    started_at = %quiz.session.started_at(),
                    elapsed_secs = quiz.session.elapsed().map(|d| d.num_seconds()),
                    "quiz completed"
                );
                self.dispatch_save(user_id, score)
            }
            AdvanceOutcome::Moved { index } => {
                debug!(index, "advanced");
                None
            }
            AdvanceOutcome::Ignored => None,
        };

        QuizAdvance { outcome, save }
    }

    /// Reshuffle and drop the registered user. An in-flight save is left to finish
    /// on its own.
    pub fn reset(&self, quiz: &mut Quiz) {
        quiz.session.reset(&mut quiz.rng, self.clock.now());
        quiz.user = None;
        debug!("quiz reset");
    }

    fn dispatch_save(&self, user_id: UserId, score: u32) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            warn!(user_id = %user_id, score, "no async runtime; score not saved");
            return None;
        };

        let api = Arc::clone(&self.api);
        Some(runtime.spawn(async move {
            match api.save_score(user_id.clone(), score).await {
                Ok(()) => info!(user_id = %user_id, score, "score saved"),
                Err(err) => warn!(user_id = %user_id, score, error = %err, "failed to save score"),
            }
        }))
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quiz_core::model::Question;
    use quiz_core::time::fixed_clock;

    use crate::error::PersistenceError;

    struct FixedApi;

    #[async_trait]
    impl ScoreApi for FixedApi {
        async fn register_user(&self, _username: &str) -> Result<UserId, RegistrationError> {
            Ok(UserId::new(1))
        }

        async fn save_score(&self, _user_id: UserId, _score: u32) -> Result<(), PersistenceError> {
            Ok(())
        }
    }

    fn build_service(len: usize) -> QuizService {
        let bank: QuestionBank = (0..len)
            .map(|i| {
                Question::from_raw(format!("Q{i}"), ["a", "b", "c", "d"].map(String::from), 1)
                    .unwrap()
            })
            .collect::<Vec<_>>()
            .into();
        QuizService::new(fixed_clock(), Arc::new(FixedApi), bank).with_seed(Some(3))
    }

    #[test]
    fn empty_bank_cannot_start() {
        let err = build_service(0).new_quiz().unwrap_err();
        assert_eq!(err, SessionError::EmptyBank);
    }

    #[test]
    fn seeded_service_replays_order() {
        let service = build_service(12);
        let a = service.new_quiz().unwrap();
        let b = service.new_quiz().unwrap();
        assert_eq!(a.session().sequence(), b.session().sequence());
    }

    #[test]
    fn unregistered_quiz_ignores_input() {
        let service = build_service(3);
        let mut quiz = service.new_quiz().unwrap();
        let one = ChoiceIndex::new(1).unwrap();

        assert_eq!(service.select_answer(&mut quiz, one), SelectOutcome::Ignored);
        let advance = service.advance(&mut quiz);
        assert_eq!(advance.outcome, AdvanceOutcome::Ignored);
        assert!(advance.save.is_none());
        assert!(!quiz.session().is_locked());
    }

    #[test]
    fn completion_without_runtime_still_completes() {
        let service = build_service(1);
        let mut quiz = service.new_quiz().unwrap();
        quiz.user = Some(RegisteredUser {
            id: UserId::new(9),
            username: "offline".into(),
        });

        service.select_answer(&mut quiz, ChoiceIndex::new(1).unwrap());
        let advance = service.advance(&mut quiz);

        assert_eq!(advance.outcome, AdvanceOutcome::Completed { score: 1, total: 1 });
        assert!(advance.save.is_none());
        assert!(quiz.session().is_complete());
        assert_eq!(quiz.session().elapsed().map(|d| d.num_seconds()), Some(0));
    }

    #[tokio::test]
    async fn repeat_registration_returns_same_text_id() {
        struct TextApi;

        #[async_trait]
        impl ScoreApi for TextApi {
            async fn register_user(&self, _username: &str) -> Result<UserId, RegistrationError> {
                Ok(UserId::text("007"))
            }

            async fn save_score(&self, _user_id: UserId, _score: u32) -> Result<(), PersistenceError> {
                Ok(())
            }
        }

        let service = QuizService::new(fixed_clock(), Arc::new(TextApi), build_service(1).bank().clone());
        let mut quiz = service.new_quiz().unwrap();
        let first = service.register(&mut quiz, "ann").await.unwrap();
        let second = service.register(&mut quiz, "bob").await.unwrap();

        assert_eq!(first, UserId::text("007"));
        assert_eq!(second, first);
        assert_eq!(quiz.user().unwrap().username, "ann");
    }

    #[tokio::test]
    async fn blank_username_is_rejected_before_request() {
        let service = build_service(2);
        let mut quiz = service.new_quiz().unwrap();
        let err = service.register(&mut quiz, "   ").await.unwrap_err();
        assert!(matches!(err, RegistrationError::EmptyUsername));
        assert!(!quiz.is_registered());
    }
}
