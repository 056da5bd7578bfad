//! Question bank loading.
//!
//! Banks are JSON arrays of `{question, option1..option4, ans}` records, where
//! `ans` is the one-based number of the correct option.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use quiz_core::model::{Question, QuestionBank};

use crate::error::BankError;

const SAMPLE_BANK: &str = include_str!("../data/questions.json");

#[derive(Debug, Deserialize)]
struct QuestionRecord {
    question: String,
    option1: String,
    option2: String,
    option3: String,
    option4: String,
    ans: u8,
}

impl QuestionRecord {
    fn into_question(self, position: usize) -> Result<Question, BankError> {
        Question::from_raw(
            self.question,
            [self.option1, self.option2, self.option3, self.option4],
            self.ans,
        )
        .map_err(|source| BankError::Question { position, source })
    }
}

/// Parse a bank from its JSON text.
///
/// # Errors
///
/// Returns `BankError::Json` for malformed JSON and `BankError::Question` for a
/// record whose `ans` is outside `1..=4` (`position` is one-based).
pub fn parse_bank(json: &str) -> Result<QuestionBank, BankError> {
    let records: Vec<QuestionRecord> = serde_json::from_str(json)?;
    let questions = records
        .into_iter()
        .enumerate()
        .map(|(i, record)| record.into_question(i + 1))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(QuestionBank::new(questions))
}

/// Read and parse a bank from disk.
///
/// # Errors
///
/// Returns `BankError::Io` if the file cannot be read, otherwise as `parse_bank`.
pub fn load_bank(path: &Path) -> Result<QuestionBank, BankError> {
    let json = fs::read_to_string(path).map_err(|source| BankError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bank(&json)
}

/// The bank bundled with the crate, used when no file is configured.
///
/// # Errors
///
/// Returns `BankError` if the bundled data is malformed.
pub fn sample_bank() -> Result<QuestionBank, BankError> {
    parse_bank(SAMPLE_BANK)
}
