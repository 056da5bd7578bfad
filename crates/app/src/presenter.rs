use std::io::{self, BufRead, Write};

use quiz_core::model::{ChoiceIndex, Question};
use quiz_core::{AnswerFeedback, QuizProgress};
use quiz_services::RegistrationError;

/// What the quiz loop needs from a front end: show a question, report which
/// choice was activated, and highlight the chosen and correct choices.
///
/// `Ok(None)` / `Ok(false)` from the reading methods means the user wants out.
pub trait QuizPresenter {
    fn ask_username(&mut self) -> io::Result<Option<String>>;
    fn show_registration_error(&mut self, err: &RegistrationError) -> io::Result<()>;
    fn show_question(&mut self, question: &Question, progress: QuizProgress) -> io::Result<()>;
    fn read_choice(&mut self) -> io::Result<Option<ChoiceIndex>>;
    fn show_feedback(&mut self, question: &Question, feedback: AnswerFeedback) -> io::Result<()>;
    fn confirm_next(&mut self) -> io::Result<bool>;
    fn show_completed(&mut self, progress: QuizProgress) -> io::Result<()>;
    fn ask_reset(&mut self) -> io::Result<bool>;
}

/// Line-oriented presenter over any reader/writer pair.
pub struct TerminalPresenter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPresenter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// `None` on end of input.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }

    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        self.read_line()
    }
}

fn is_quit(line: &str) -> bool {
    line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit")
}

impl<R: BufRead, W: Write> QuizPresenter for TerminalPresenter<R, W> {
    fn ask_username(&mut self) -> io::Result<Option<String>> {
        writeln!(self.output, "Quiz App")?;
        writeln!(self.output, "--------")?;
        match self.prompt("Enter your username to start the quiz: ")? {
            Some(line) if is_quit(&line) => Ok(None),
            other => Ok(other),
        }
    }

    fn show_registration_error(&mut self, err: &RegistrationError) -> io::Result<()> {
        writeln!(self.output, "Error registering user ({err}). Please try again.")
    }

    fn show_question(&mut self, question: &Question, progress: QuizProgress) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "{}. {}", progress.position, question.prompt())?;
        for index in ChoiceIndex::all() {
            writeln!(self.output, "  {index}) {}", question.choice(index))?;
        }
        writeln!(self.output, "{} of {}", progress.position, progress.total)
    }

    fn read_choice(&mut self) -> io::Result<Option<ChoiceIndex>> {
        loop {
            let Some(line) = self.prompt("Your answer (1-4, q to quit): ")? else {
                return Ok(None);
            };
            if is_quit(&line) {
                return Ok(None);
            }
            match line.parse::<u8>().map(ChoiceIndex::new) {
                Ok(Ok(choice)) => return Ok(Some(choice)),
                _ => writeln!(self.output, "Please pick one of 1, 2, 3 or 4.")?,
            }
        }
    }

    fn show_feedback(&mut self, question: &Question, feedback: AnswerFeedback) -> io::Result<()> {
        for index in ChoiceIndex::all() {
            let mark = if index == feedback.correct {
                "correct"
            } else if index == feedback.chosen {
                "wrong"
            } else {
                ""
            };
            if mark.is_empty() {
                writeln!(self.output, "  {index}) {}", question.choice(index))?;
            } else {
                writeln!(self.output, "  {index}) {} [{mark}]", question.choice(index))?;
            }
        }
        Ok(())
    }

    fn confirm_next(&mut self) -> io::Result<bool> {
        match self.prompt("Press Enter for the next question (q to quit): ")? {
            Some(line) => Ok(!is_quit(&line)),
            None => Ok(false),
        }
    }

    fn show_completed(&mut self, _progress: QuizProgress) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "Thank you for completing the quiz!")
    }

    fn ask_reset(&mut self) -> io::Result<bool> {
        match self.prompt("Reset and play again? [y/N]: ")? {
            Some(line) => Ok(matches!(line.to_ascii_lowercase().as_str(), "y" | "yes")),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn presenter(input: &str) -> TerminalPresenter<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalPresenter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output_of(p: TerminalPresenter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(p.into_output()).unwrap()
    }

    fn question() -> Question {
        Question::from_raw("Capital of France?", ["Rome", "Paris", "Oslo", "Bern"].map(String::from), 2)
            .unwrap()
    }

    #[test]
    fn read_choice_rejects_out_of_range_then_accepts() {
        let mut p = presenter("0\nfive\n7\n3\n");
        assert_eq!(p.read_choice().unwrap(), ChoiceIndex::new(3).ok());
        let out = output_of(p);
        assert_eq!(out.matches("Please pick one of").count(), 3);
    }

    #[test]
    fn read_choice_quit_and_eof() {
        assert_eq!(presenter("q\n").read_choice().unwrap(), None);
        assert_eq!(presenter("").read_choice().unwrap(), None);
    }

    #[test]
    fn feedback_marks_correct_and_wrong() {
        let mut p = presenter("");
        let feedback = AnswerFeedback {
            chosen: ChoiceIndex::new(4).unwrap(),
            correct: ChoiceIndex::new(2).unwrap(),
            is_correct: false,
        };
        p.show_feedback(&question(), feedback).unwrap();
        let out = output_of(p);
        assert!(out.contains("2) Paris [correct]"));
        assert!(out.contains("4) Bern [wrong]"));
        assert!(out.contains("1) Rome\n"));
    }

    #[test]
    fn question_shows_position_of_total() {
        let mut p = presenter("");
        let progress = QuizProgress {
            position: 2,
            total: 5,
            score: 1,
            is_complete: false,
        };
        p.show_question(&question(), progress).unwrap();
        let out = output_of(p);
        assert!(out.contains("2. Capital of France?"));
        assert!(out.contains("2 of 5"));
    }

    #[test]
    fn reset_requires_explicit_yes() {
        assert!(presenter("y\n").ask_reset().unwrap());
        assert!(presenter("YES\n").ask_reset().unwrap());
        assert!(!presenter("\n").ask_reset().unwrap());
        assert!(!presenter("").ask_reset().unwrap());
    }
}
