//! Configuration constants for the quiz
//!
//! This module contains the fixed limits, storage keys and display labels
//! used throughout the crate so that every component agrees on them.

/// Timer configuration constants
pub mod timer {
    /// Default countdown length of a question in seconds
    pub const DEFAULT_DURATION: u64 = 60;
    /// Interval between two countdown ticks in seconds
    pub const TICK_INTERVAL: u64 = 1;
    /// Minimum configurable countdown length in seconds
    pub const MIN_DURATION: u64 = 5;
    /// Maximum configurable countdown length in seconds
    pub const MAX_DURATION: u64 = 240;
}

/// Team configuration constants
pub mod team {
    /// Maximum length of a team name in characters
    pub const MAX_NAME_LENGTH: usize = 30;
}

/// Keys under which records are kept in the key-value store
pub mod storage {
    /// Question bank written by the editor and read by the game
    pub const QUESTION_BANK_KEY: &str = "quickQAGameData";
    /// In-progress game session
    pub const SESSION_KEY: &str = "mobileGameState";
}

/// Fixed display labels
pub mod labels {
    /// Shown in place of both team names when the scores are level
    pub const TIE: &str = "تعادل";
    /// Prefix of the "whose turn" banner
    pub const TURN_PREFIX: &str = "دور";
}

/// YouTube embedding
pub mod youtube {
    /// Base of the embeddable player URL
    pub const EMBED_BASE: &str = "https://www.youtube.com/embed/";
    /// Player parameters appended to every embed URL
    pub const EMBED_PARAMS: &str = "rel=0&modestbranding=1&fs=1&cc_load_policy=1";
}
