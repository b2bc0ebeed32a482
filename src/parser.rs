//! Free-form text to question records
//!
//! The editor accepts loosely structured, line-oriented text:
//!
//! ```text
//! <category>
//! <question containing ? or ؟>  [media URL]
//! <answer>                      [media URL]
//! [bare media URL]
//! ```
//!
//! Lines are classified one at a time while carrying the current category
//! and the question under construction. Input without any question line
//! simply yields no questions; parsing never fails.

use std::sync::LazyLock;

use itertools::Itertools;
use regex::{Captures, Regex};

use crate::{
    media::{extract_media, is_media_url, strip_url},
    question::Question,
};

/// Lines that look like categories but are common one-word answers
const COMMON_ANSWER_WORDS: &[&str] = &[
    "earth", "oxygen", "fahad", "water", "fire", "air", "sun", "moon", "star", "planet",
    "animal", "plant", "tree", "flower", "bird", "fish", "dog", "cat", "horse", "cow", "sheep",
    "goat", "chicken", "duck", "pig", "lion", "tiger", "elephant", "bear", "wolf", "fox",
    "rabbit", "mouse", "snake", "frog", "spider", "ant", "bee", "butterfly", "dragonfly",
    "mosquito", "fly", "beetle", "ladybug", "grasshopper", "cricket", "cicada", "moth", "wasp",
    "hornet", "yellowjacket", "bumblebee", "honeybee", "waxwing", "cardinal", "robin",
    "sparrow", "finch", "wren", "thrush", "mockingbird", "bluebird", "jay", "crow", "raven",
    "magpie", "starling", "blackbird", "warbler", "vireo", "tanager", "grosbeak", "bunting",
    "junco", "towhee",
];

static PICTOGRAPHS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Extended_Pictographic}\x{1F3FB}-\x{1F3FF}\x{FE0E}\x{FE0F}\x{200D}\x{20E3}]")
        .expect("pictograph pattern is valid")
});

static REPEATED_PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\?{2,}|؟{2,}|!{2,}|\.{2,}").expect("punctuation pattern is valid")
});

static EDGE_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\w?؟!.]+|[^\w?؟!.]+$").expect("edge pattern is valid")
});

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://\S+").expect("url pattern is valid"));

/// How a single line contributes to the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    /// Starts a new question
    Question,
    /// Fills the answer of the open question
    Answer,
    /// A bare URL following the open question
    MediaUrl,
    /// Sets the category for the questions that follow
    Category,
    /// Contributes nothing
    Ignored,
}

/// Normalizes one line of editor input
///
/// Pictographs are removed, runs of `?`, `؟`, `!` or `.` collapse to a single
/// mark and stray symbols at either end of the line are trimmed. A bare URL
/// line keeps its last character, which may well be `/` or `=`.
pub fn clean_line(line: &str) -> String {
    let line = PICTOGRAPHS.replace_all(line, "");
    let line = REPEATED_PUNCTUATION.replace_all(&line, |caps: &Captures<'_>| {
        caps[0].chars().take(1).collect::<String>()
    });
    let line = line.trim();
    if is_media_url(line) {
        return line.to_owned();
    }
    EDGE_NOISE.replace_all(line, "").trim().to_owned()
}

/// Normalizes every line of editor input, see [`clean_line`]
pub fn clean_text(raw: &str) -> String {
    raw.lines().map(clean_line).join("\n")
}

/// Whether `line` asks something
///
/// Question marks that are part of a URL query string do not count, so a
/// bare `https://youtu.be/id?t=4` line is never mistaken for a question.
fn is_question_line(line: &str) -> bool {
    URL.replace_all(line, "").contains(['?', '؟'])
}

/// Whether `line` is one of the common answer words that must not become a category
pub fn is_common_answer_word(line: &str) -> bool {
    let lowered = line.to_lowercase();
    COMMON_ANSWER_WORDS.contains(&lowered.as_str())
}

fn classify(line: &str, open: Option<&Question>) -> Line {
    if is_question_line(line) {
        return Line::Question;
    }

    match open {
        Some(question) if question.answer.is_empty() => Line::Answer,
        Some(_) if is_media_url(line) => Line::MediaUrl,
        _ if is_media_url(line) || is_common_answer_word(line) => Line::Ignored,
        _ => Line::Category,
    }
}

fn start_question(category: &str, line: &str) -> Question {
    let media = extract_media(line);
    let text = match &media {
        Some(media) => strip_url(line, &media.url),
        None => line.to_owned(),
    };

    Question {
        category: category.to_owned(),
        text,
        answer: String::new(),
        media,
    }
}

fn fill_answer(question: &mut Question, line: &str) {
    question.answer = line.to_owned();

    if question.media.is_none() {
        if let Some(media) = extract_media(line) {
            question.answer = strip_url(line, &media.url);
            question.media = Some(media);
        }
    }
}

/// Parses editor text into questions
///
/// The text is cleaned line by line first (see [`clean_line`]) and blank
/// lines are skipped. Every remaining line is then checked in this order:
/// question line, answer for the open question, bare media URL for the open
/// question, category. URL lines and common answer words never become a
/// category.
///
/// A media URL inside the question or answer line is removed from that
/// line and attached to the question; the first URL found wins and later
/// ones stay in the text. An empty or question-less input yields an empty
/// vector, which callers treat as "nothing to save".
///
/// # Arguments
///
/// * `raw` - Editor text, any mix of Latin and Arabic script
///
/// # Examples
///
/// ```rust
/// use quickqa::parser::parse_questions;
///
/// let questions = parse_questions("Science\nWhat is H2O?\nWater\n");
/// assert_eq!(questions.len(), 1);
/// assert_eq!(questions[0].category, "Science");
/// assert_eq!(questions[0].answer, "Water");
/// ```
pub fn parse_questions(raw: &str) -> Vec<Question> {
    let cleaned = clean_text(raw);

    let mut questions = Vec::new();
    let mut category = String::new();
    let mut open: Option<Question> = None;

    for line in cleaned.lines().map(str::trim).filter(|line| !line.is_empty()) {
        match classify(line, open.as_ref()) {
            Line::Question => {
                questions.extend(open.replace(start_question(&category, line)));
            }
            Line::Answer => {
                if let Some(question) = open.as_mut() {
                    fill_answer(question, line);
                }
            }
            Line::MediaUrl => {
                if let Some(question) = open.as_mut().filter(|q| q.media.is_none()) {
                    question.media = extract_media(line);
                }
            }
            Line::Category => line.clone_into(&mut category),
            Line::Ignored => {}
        }
    }

    questions.extend(open);

    tracing::debug!(count = questions.len(), "parsed questions");

    questions
}

/// Writes questions back into editable text
///
/// A category line is emitted whenever the category changes. Each question
/// follows on one line with its media URL appended, then its answer and a
/// blank separator.
///
/// Keeping the URL on the question line matters: media found there wins
/// over any URL the answer still contains, so parsing the result yields
/// the same questions.
///
/// # Arguments
///
/// * `questions` - Questions in the order they should appear
pub fn render_questions(questions: &[Question]) -> String {
    let mut text = String::new();
    let mut category = "";

    for question in questions {
        if question.category != category {
            category = &question.category;
            if !category.is_empty() {
                text.push_str(category);
                text.push('\n');
            }
        }

        text.push_str(&question.text);
        if let Some(media) = &question.media {
            text.push(' ');
            text.push_str(&media.url);
        }
        text.push('\n');

        if !question.answer.is_empty() {
            text.push_str(&question.answer);
            text.push('\n');
        }

        text.push('\n');
    }

    text
}
