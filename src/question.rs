//! Question records and the saved question bank

use garde::Validate;
use serde::{Deserialize, Serialize};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::media::{Media, strip_url};

/// A single parsed question
///
/// `text` and `answer` never contain the URL of `media`; the parser strips
/// it out when the URL was embedded in either line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Question {
    /// Label of the most recent category line, empty if none was seen
    #[serde(default)]
    #[garde(skip)]
    pub category: String,
    /// The question as shown to the moderator
    #[garde(length(min = 1))]
    pub text: String,
    /// The expected answer, empty until an answer line is seen
    #[serde(default)]
    #[garde(skip)]
    pub answer: String,
    /// At most one piece of media, the first one found wins
    #[serde(default)]
    #[garde(skip)]
    pub media: Option<Media>,
}

impl Question {
    /// Question text with any leftover media URL removed
    ///
    /// Records saved by older editors kept the URL inside the text.
    pub fn display_text(&self) -> String {
        match &self.media {
            Some(media) => strip_url(&self.text, &media.url),
            None => self.text.clone(),
        }
    }

    /// Answer text with any leftover media URL removed
    pub fn display_answer(&self) -> String {
        match &self.media {
            Some(media) => strip_url(&self.answer, &media.url),
            None => self.answer.clone(),
        }
    }
}

/// The question bank handed from the editor to the game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QuestionBank {
    /// Questions in the order they were written
    #[garde(length(min = 1), dive)]
    pub questions: Vec<Question>,
    /// When the bank was saved, in milliseconds since the Unix epoch
    #[garde(skip)]
    pub timestamp: u64,
}

impl QuestionBank {
    /// Creates a bank stamped with `saved_at`
    pub fn new(questions: Vec<Question>, saved_at: SystemTime) -> Self {
        let timestamp = saved_at
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64);
        Self {
            questions,
            timestamp,
        }
    }
}
