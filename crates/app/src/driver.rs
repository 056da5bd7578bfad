use std::io;
use std::time::Duration;

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::JoinHandle;
use tracing::warn;

use quiz_core::SelectOutcome;
use quiz_services::{Quiz, QuizService};

use crate::presenter::QuizPresenter;

/// How long pending score saves may run once the user has quit.
pub const SAVE_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Run blocking presenter I/O off the async worker where the runtime allows it.
///
/// `block_in_place` is only available on the multi-thread runtime; elsewhere the
/// call runs inline.
fn blocking<T>(io: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(io)
        }
        _ => io(),
    }
}

/// Keep `save` in flight and forget saves that already finished.
fn track_save(pending: &mut Vec<JoinHandle<()>>, save: Option<JoinHandle<()>>) {
    pending.retain(|handle| !handle.is_finished());
    pending.extend(save);
}

/// Drive `quiz` through `presenter` until the user quits.
///
/// Returns the score saves still in flight; the caller decides whether to wait
/// for them before exiting.
///
/// # Errors
///
/// Returns `io::Error` if the presenter fails to read or write.
pub async fn run_quiz<P: QuizPresenter>(
    service: &QuizService,
    quiz: &mut Quiz,
    presenter: &mut P,
) -> io::Result<Vec<JoinHandle<()>>> {
    let mut pending = Vec::new();

    loop {
        if !quiz.is_registered() {
            let Some(username) = blocking(|| presenter.ask_username())? else {
                break;
            };
            if let Err(err) = service.register(quiz, &username).await {
                warn!(error = %err, "registration failed");
                blocking(|| presenter.show_registration_error(&err))?;
            }
            continue;
        }

        if quiz.session().is_complete() {
            blocking(|| presenter.show_completed(quiz.session().progress()))?;
            if !blocking(|| presenter.ask_reset())? {
                break;
            }
            service.reset(quiz);
            continue;
        }

        let session = quiz.session();
        blocking(|| presenter.show_question(session.current_question(), session.progress()))?;
        let Some(choice) = blocking(|| presenter.read_choice())? else {
            break;
        };

        if let SelectOutcome::Locked(feedback) = service.select_answer(quiz, choice) {
            blocking(|| presenter.show_feedback(quiz.session().current_question(), feedback))?;
        }
        if !blocking(|| presenter.confirm_next())? {
            break;
        }

        let advance = service.advance(quiz);
        track_save(&mut pending, advance.save);
    }

    Ok(pending)
}

/// Give in-flight saves a bounded chance to finish before the process exits.
pub async fn drain_saves(pending: Vec<JoinHandle<()>>, limit: Duration) {
    if pending.is_empty() {
        return;
    }
    let joined = async {
        for handle in pending {
            if let Err(err) = handle.await {
                warn!(error = %err, "score save task failed");
            }
        }
    };
    if tokio::time::timeout(limit, joined).await.is_err() {
        warn!("gave up waiting for score saves");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;

    use quiz_core::model::{Question, QuestionBank, UserId};
    use quiz_core::time::fixed_clock;
    use quiz_services::InMemoryScoreApi;

    use crate::presenter::TerminalPresenter;

    /// Every question's correct answer is choice 1.
    fn build_service(api: &InMemoryScoreApi, len: usize) -> QuizService {
        let bank: QuestionBank = (0..len)
            .map(|i| {
                Question::from_raw(format!("Q{i}"), ["a", "b", "c", "d"].map(String::from), 1)
                    .unwrap()
            })
            .collect::<Vec<_>>()
            .into();
        QuizService::new(fixed_clock(), Arc::new(api.clone()), bank).with_seed(Some(1))
    }

    async fn play(
        service: &QuizService,
        input: &str,
    ) -> (Quiz, String, Vec<JoinHandle<()>>) {
        let mut quiz = service.new_quiz().unwrap();
        let mut presenter = TerminalPresenter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let pending = run_quiz(service, &mut quiz, &mut presenter).await.unwrap();
        let output = String::from_utf8(presenter.into_output()).unwrap();
        (quiz, output, pending)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn scripted_run_completes_and_saves() {
        let api = InMemoryScoreApi::new();
        let service = build_service(&api, 3);

        // Answers: correct, wrong, correct; then decline reset.
        let (quiz, output, pending) = play(&service, "alice\n1\n\n2\n\n1\n\nn\n").await;

        assert!(quiz.session().is_complete());
        assert_eq!(quiz.session().score(), 2);
        assert!(output.contains("Thank you for completing the quiz!"));
        assert!(output.contains("3 of 3"));

        drain_saves(pending, SAVE_DRAIN_TIMEOUT).await;
        assert_eq!(api.scores(), vec![(UserId::new(1), 2)]);
    }

    #[tokio::test]
    async fn registration_failure_reprompts() {
        let api = InMemoryScoreApi::new();
        let service = build_service(&api, 1);

        // Blank name is rejected, then quit at the second prompt.
        let (quiz, output, pending) = play(&service, "\nq\n").await;

        assert!(!quiz.is_registered());
        assert!(output.contains("Error registering user"));
        assert_eq!(output.matches("Enter your username").count(), 2);
        assert!(pending.is_empty());
        assert!(api.users().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reset_returns_to_registration() {
        let api = InMemoryScoreApi::new();
        let service = build_service(&api, 1);

        let (quiz, _output, pending) = play(&service, "alice\n1\n\ny\nbob\nq\n").await;

        assert!(quiz.is_registered());
        assert_eq!(quiz.user().unwrap().username, "bob");
        assert_eq!(quiz.session().score(), 0);
        assert!(!quiz.session().is_complete());

        drain_saves(pending, SAVE_DRAIN_TIMEOUT).await;
        assert_eq!(api.users(), vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(api.scores(), vec![(UserId::new(1), 1)]);
    }

    #[tokio::test]
    async fn finished_saves_are_dropped_from_pending() {
        let done = tokio::spawn(async {});
        while !done.is_finished() {
            tokio::task::yield_now().await;
        }
        let (release, wait) = tokio::sync::oneshot::channel::<()>();
        let running = tokio::spawn(async move {
            let _ = wait.await;
        });

        let mut pending = vec![done];
        track_save(&mut pending, Some(running));
        assert_eq!(pending.len(), 1);
        assert!(!pending[0].is_finished());

        track_save(&mut pending, None);
        assert_eq!(pending.len(), 1);

        release.send(()).unwrap();
        drain_saves(pending, SAVE_DRAIN_TIMEOUT).await;
    }

    #[test]
    fn blocking_runs_inline_without_runtime() {
        assert_eq!(blocking(|| 7), 7);
    }

    #[tokio::test]
    async fn quitting_mid_quiz_saves_nothing() {
        let api = InMemoryScoreApi::new();
        let service = build_service(&api, 4);

        let (quiz, _output, pending) = play(&service, "alice\n1\nq\n").await;

        assert_eq!(quiz.session().score(), 1);
        assert!(!quiz.session().is_complete());
        assert!(pending.is_empty());
    }
}
