// Transcript acquisition
//
// - Source: collaborator that talks to the caption provider
// - Strategy: one way of asking the source for captions; the fetcher walks
//   ordered tables of them
// - Fetcher: retry loop, backoff and fallbacks
// - YouTube: yt-dlp backed source

pub mod fetcher;
pub mod strategy;
pub mod youtube;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub use fetcher::*;
pub use strategy::*;
pub use youtube::*;

use crate::error::{DubError, Result};
use crate::segment::TranscriptSegment;

/// Length of a YouTube video id
pub const VIDEO_ID_LEN: usize = 11;

/// One caption line in the provider's native millisecond units
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionLine {
    pub text: String,
    pub offset_ms: u64,
    pub duration_ms: u64,
}

impl From<CaptionLine> for TranscriptSegment {
    fn from(line: CaptionLine) -> Self {
        TranscriptSegment {
            text: line.text,
            start_secs: line.offset_ms as f64 / 1000.0,
            duration_secs: line.duration_ms as f64 / 1000.0,
        }
    }
}

/// Which language to ask the source for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageHint {
    Tag(String),
    AutoDetect,
}

impl std::fmt::Display for LanguageHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LanguageHint::Tag(tag) => write!(f, "language {}", tag),
            LanguageHint::AutoDetect => write!(f, "auto-detect language"),
        }
    }
}

/// A caption track advertised by the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrack {
    pub language: String,
    pub name: String,
    pub url: String,
    /// Auto-generated by the provider rather than uploaded
    pub automatic: bool,
}

/// Provider of time-coded captions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Captions for a video reference (id or URL) in the hinted language
    async fn fetch(&self, reference: &str, hint: &LanguageHint) -> Result<Vec<CaptionLine>>;

    /// Every caption track available for a video
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>>;

    /// Captions of one listed track
    async fn fetch_track(&self, video_id: &str, track: &CaptionTrack) -> Result<Vec<CaptionLine>>;
}

/// Accept exactly an 11-character token with no whitespace
pub fn validate_video_id(video_id: &str) -> Result<()> {
    if video_id.chars().count() != VIDEO_ID_LEN || video_id.chars().any(char::is_whitespace) {
        return Err(DubError::InvalidInput(format!(
            "Invalid YouTube video ID format: '{}'", video_id
        )));
    }
    Ok(())
}

fn url_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"(?:youtube\.com/(?:watch\?(?:.*&)?v=|embed/|shorts/|live/|v/)|youtu\.be/)([A-Za-z0-9_-]{11})",
            )
            .ok()
        })
        .as_ref()
}

/// Pull the video id out of a watch, short, embed or shorts URL.
/// Anything that is not a recognised URL is returned trimmed, for validation.
pub fn extract_video_id(input: &str) -> String {
    let input = input.trim();
    url_pattern()
        .and_then(|pattern| pattern.captures(input))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_video_id() {
        assert!(validate_video_id("dQw4w9WgXcQ").is_ok());
        assert!(validate_video_id("dQw4w9WgXc").is_err());
        assert!(validate_video_id("dQw4w9WgXcQQ").is_err());
        assert!(validate_video_id("dQw4 9WgXcQ").is_err());
        assert!(validate_video_id("").is_err());
    }

    #[test]
    fn test_extract_video_id_from_urls() {
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?list=PL1&v=dQw4w9WgXcQ&t=42s"),
            "dQw4w9WgXcQ"
        );
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ?si=abc"), "dQw4w9WgXcQ");
        assert_eq!(extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(extract_video_id("https://youtube.com/shorts/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(extract_video_id("  dQw4w9WgXcQ "), "dQw4w9WgXcQ");
        assert_eq!(extract_video_id("not a url"), "not a url");
    }

    #[test]
    fn test_caption_line_converts_milliseconds() {
        let segment: TranscriptSegment = CaptionLine {
            text: "hello".to_string(),
            offset_ms: 1500,
            duration_ms: 2250,
        }
        .into();
        assert_eq!(segment.start_secs, 1.5);
        assert_eq!(segment.duration_secs, 2.25);
    }
}
