//! Question bank editor operations
//!
//! The editor screen re-parses its text on every change to show how many
//! questions were recognised, saves the bank for the game screen and, when
//! reopened, turns the saved bank back into editable text.

use serde::Serialize;
use thiserror::Error;
use web_time::SystemTime;

use crate::{
    parser::{parse_questions, render_questions},
    question::QuestionBank,
    storage::{self, Storage},
};

/// What the editor shows while typing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Preview {
    /// Number of questions recognised
    pub count: usize,
    /// Whether the save button should be enabled
    pub can_save: bool,
}

/// Errors that can occur while saving a bank
#[derive(Error, Debug)]
pub enum Error {
    /// No question was recognised in the text
    #[error("no questions were recognised")]
    NoQuestions,
    /// The bank could not be written
    #[error(transparent)]
    Storage(#[from] storage::Error),
}

/// Counts the questions in `text`
pub fn preview(text: &str) -> Preview {
    let count = parse_questions(text).len();
    Preview {
        count,
        can_save: count > 0,
    }
}

/// Parses `text` and stores it as the question bank
///
/// The bank replaces whatever was saved before; the game screen picks it up
/// the next time it prepares a new game. Returns the number of questions
/// saved.
///
/// # Arguments
///
/// * `text` - Editor text, parsed with [`parse_questions`]
/// * `storage` - Store the bank is written to
/// * `saved_at` - Time recorded in the bank's timestamp
///
/// # Errors
///
/// * `Error::NoQuestions` - The text contains no questions; nothing is written
/// * `Error::Storage` - The bank could not be encoded
pub fn save<S: Storage + ?Sized>(
    text: &str,
    storage: &mut S,
    saved_at: SystemTime,
) -> Result<usize, Error> {
    let questions = parse_questions(text);
    if questions.is_empty() {
        return Err(Error::NoQuestions);
    }

    let bank = QuestionBank::new(questions, saved_at);
    storage::save_bank(storage, &bank)?;

    tracing::info!(count = bank.questions.len(), "question bank saved");

    Ok(bank.questions.len())
}

/// Rebuilds editable text from the saved bank, if there is one
pub fn load_text<S: Storage + ?Sized>(storage: &S) -> Option<String> {
    storage::load_bank(storage).map(|bank| render_questions(&bank.questions))
}
