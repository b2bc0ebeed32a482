//! Media attached to questions (images, videos, audio and YouTube clips)
//!
//! Media is discovered by scanning question or answer text for an
//! `http(s)://` URL whose extension or domain identifies its kind. The
//! patterns are tried in a fixed priority order, so a `.ogg` URL is always
//! a video even though audio also lists that extension.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::youtube::{EMBED_BASE, EMBED_PARAMS};

/// The kind of media a URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A still image rendered inline
    #[display("image")]
    Image,
    /// A video file played with native controls
    #[display("video")]
    Video,
    /// An audio file played with native controls
    #[display("audio")]
    Audio,
    /// A YouTube clip embedded through the YouTube player
    #[display("youtube")]
    Youtube,
}

/// Media content attached to a question
///
/// Serialized as `{"type": ..., "url": ...}` so records written by earlier
/// versions of the question bank load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// What the URL points at
    #[serde(rename = "type", alias = "kind")]
    pub kind: MediaKind,
    /// The URL exactly as it appeared in the source text
    pub url: String,
}

/// How a piece of media should be embedded by a renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Embed {
    /// Native image element
    Image(String),
    /// Native video element
    Video(String),
    /// Native audio element
    Audio(String),
    /// Iframe pointing at the YouTube player
    YouTube {
        /// Video id, if one could be recognised in the URL
        video_id: Option<String>,
        /// URL to load in the iframe
        embed_url: String,
    },
}

/// Ordered pattern table; earlier entries win
static PATTERNS: LazyLock<[(MediaKind, Regex); 4]> = LazyLock::new(|| {
    let pattern = |source: &str| Regex::new(source).expect("media pattern is valid");
    [
        (
            MediaKind::Image,
            pattern(r"(?i)https?://\S+\.(?:jpg|jpeg|png|gif|webp)"),
        ),
        (
            MediaKind::Video,
            pattern(r"(?i)https?://\S+\.(?:mp4|webm|ogg|avi|mov)"),
        ),
        (
            MediaKind::Audio,
            pattern(r"(?i)https?://\S+\.(?:mp3|wav|ogg|m4a|aac)"),
        ),
        (
            MediaKind::Youtube,
            pattern(r"(?i)https?://(?:www\.)?(?:youtube\.com|youtu\.be)/\S+"),
        ),
    ]
});

/// Finds the first media URL in `text`
///
/// The kinds are tried in the order image, video, audio, YouTube and the
/// first kind with a match wins.
///
/// # Examples
///
/// ```rust
/// use quickqa::media::{extract_media, MediaKind};
///
/// let media = extract_media("look https://x.com/a.png here").unwrap();
/// assert_eq!(media.kind, MediaKind::Image);
/// assert_eq!(media.url, "https://x.com/a.png");
/// ```
pub fn extract_media(text: &str) -> Option<Media> {
    PATTERNS.iter().find_map(|(kind, regex)| {
        regex.find(text).map(|found| Media {
            kind: *kind,
            url: found.as_str().to_owned(),
        })
    })
}

/// Whether a whole line is a bare URL
pub fn is_media_url(line: &str) -> bool {
    line.starts_with("http://") || line.starts_with("https://")
}

/// Removes the first occurrence of `url` from `text` and trims the rest
pub fn strip_url(text: &str, url: &str) -> String {
    text.replacen(url, "", 1).trim().to_owned()
}

impl Media {
    /// Picks the embedding strategy for this media
    pub fn embed(&self) -> Embed {
        match self.kind {
            MediaKind::Image => Embed::Image(self.url.clone()),
            MediaKind::Video => Embed::Video(self.url.clone()),
            MediaKind::Audio => Embed::Audio(self.url.clone()),
            MediaKind::Youtube => {
                let video_id = extract_youtube_id(&self.url).map(str::to_owned);
                let embed_url = video_id.as_ref().map_or_else(
                    || self.url.clone(),
                    |id| format!("{EMBED_BASE}{id}?{EMBED_PARAMS}"),
                );
                Embed::YouTube {
                    video_id,
                    embed_url,
                }
            }
        }
    }
}

/// Extracts the video id from the short, watch or embed URL forms
fn extract_youtube_id(url: &str) -> Option<&str> {
    let id = if let Some((_, rest)) = url.split_once("youtu.be/") {
        rest.split(['?', '&', '#', '/']).next()
    } else if let Some((_, rest)) = url.split_once("/embed/") {
        rest.split(['?', '&', '#', '/']).next()
    } else {
        url.split_once("?v=")
            .or_else(|| url.split_once("&v="))
            .and_then(|(_, rest)| rest.split(['&', '#']).next())
    };

    id.filter(|id| !id.is_empty())
}
