//! Key-value persistence of the question bank and the game session
//!
//! The host supplies a [`Storage`] (browser local storage, a file, a
//! database row); records are stored as JSON strings. Loading never fails:
//! missing or corrupt records are logged and treated as "nothing saved".

use std::collections::HashMap;

use garde::Validate;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::{
    constants::storage::{QUESTION_BANK_KEY, SESSION_KEY},
    game::Game,
    question::QuestionBank,
};

/// A string-keyed store of string values
///
/// Implemented by the host over whatever persists across reloads. Writes
/// are expected to succeed; the crate only ever reads back what it wrote
/// and treats anything unreadable as absent.
pub trait Storage {
    /// Reads the value stored under `key`
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value
    fn set(&mut self, key: &str, value: String);

    /// Deletes `key`, doing nothing if it is absent
    fn remove(&mut self, key: &str);
}

/// Storage kept in memory for the lifetime of the value
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_owned(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Errors that can occur while writing records
#[derive(Error, Debug)]
pub enum Error {
    /// The record could not be encoded
    #[error("failed to encode {key}")]
    Serialize {
        /// Key the record was meant for
        key: &'static str,
        /// Underlying encoder error
        #[source]
        source: serde_json::Error,
    },
}

fn save<T: Serialize, S: Storage + ?Sized>(
    storage: &mut S,
    key: &'static str,
    value: &T,
) -> Result<(), Error> {
    let encoded = serde_json::to_string(value).map_err(|source| Error::Serialize { key, source })?;
    storage.set(key, encoded);
    Ok(())
}

fn load<T: DeserializeOwned, S: Storage + ?Sized>(storage: &S, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    serde_json::from_str(&raw)
        .inspect_err(|error| tracing::warn!(key, %error, "ignoring unreadable saved record"))
        .ok()
}

/// Writes the game session
///
/// # Errors
///
/// Returns `Error::Serialize` if the session could not be encoded.
pub fn save_session<S: Storage + ?Sized>(storage: &mut S, game: &Game) -> Result<(), Error> {
    save(storage, SESSION_KEY, game)
}

/// Reads the game session, if a readable one was saved
pub fn load_session<S: Storage + ?Sized>(storage: &S) -> Option<Game> {
    load(storage, SESSION_KEY)
}

/// Erases the game session
pub fn clear_session<S: Storage + ?Sized>(storage: &mut S) {
    storage.remove(SESSION_KEY);
}

/// Writes the question bank
///
/// # Errors
///
/// Returns `Error::Serialize` if the bank could not be encoded.
pub fn save_bank<S: Storage + ?Sized>(storage: &mut S, bank: &QuestionBank) -> Result<(), Error> {
    save(storage, QUESTION_BANK_KEY, bank)
}

/// Reads the question bank
///
/// A bank failing validation (no questions, or a question with empty text)
/// is logged and treated as missing.
pub fn load_bank<S: Storage + ?Sized>(storage: &S) -> Option<QuestionBank> {
    load::<QuestionBank, _>(storage, QUESTION_BANK_KEY).filter(|bank| {
        bank.validate()
            .inspect_err(|report| tracing::warn!(%report, "ignoring invalid question bank"))
            .is_ok()
    })
}
