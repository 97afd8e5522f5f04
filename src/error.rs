use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DubError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // shown bare so the provider's wording can be classified
    #[error("{0}")]
    TranscriptSource(String),

    #[error("{} (last error: {last_error})", .reason.explanation())]
    TranscriptUnavailable {
        reason: UnavailableReason,
        last_error: String,
    },

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("No audio clips were generated successfully")]
    NoAudioGenerated,

    #[error("No aligned audio files were created")]
    AlignmentFailed,

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Video acquisition failed: {0}")]
    VideoAcquisitionFailed(String),

    #[error("Merging video and audio failed: {0}")]
    MuxFailed(String),

    #[error("{0} timed out")]
    Timeout(String),

    #[error("Job was cancelled")]
    Cancelled,
}

/// Why a transcript could not be obtained, classified from the source's error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnavailableReason {
    Private,
    Removed,
    AgeRestricted,
    NoCaptions,
    Unknown,
}

impl UnavailableReason {
    /// Classify an underlying error message.
    pub fn classify(message: &str) -> Self {
        let message = message.to_lowercase();
        if message.contains("private video") {
            Self::Private
        } else if message.contains("video unavailable") {
            Self::Removed
        } else if message.contains("age restricted")
            || message.contains("age-restricted")
            || message.contains("confirm your age")
        {
            Self::AgeRestricted
        } else if is_missing_captions(&message) {
            Self::NoCaptions
        } else {
            Self::Unknown
        }
    }

    pub fn explanation(&self) -> &'static str {
        match self {
            Self::Private => "This video is private and its transcript cannot be accessed",
            Self::Removed => "This video is unavailable or has been removed",
            Self::AgeRestricted => {
                "This video is age-restricted and its transcript cannot be accessed"
            }
            Self::NoCaptions => {
                "No transcript/captions found for this video; it needs manual captions, \
                 auto-generated captions, and public accessibility"
            }
            Self::Unknown => {
                "Failed to fetch transcript; the video may not have captions available, \
                 or the captions may be auto-generated only"
            }
        }
    }
}

/// True when an error message belongs to the "no transcript / no captions" class.
pub fn is_missing_captions(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("transcript") || message.contains("captions")
}

impl DubError {
    /// User-facing hints for failures the user can act on.
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            DubError::TranscriptUnavailable { .. } => vec![
                "Try a different video with manual captions",
                "Check if the video has auto-generated captions enabled",
                "Ensure the video is publicly accessible",
                "Try again in a few minutes - YouTube may be rate limiting",
            ],
            DubError::InvalidInput(_) => {
                vec!["Pass a YouTube watch/short URL or the 11-character video id"]
            }
            DubError::VideoAcquisitionFailed(_) => {
                vec!["Ensure yt-dlp or youtube-dl is installed and up to date"]
            }
            DubError::NoAudioGenerated => {
                vec!["Try a different video with spoken content and captions"]
            }
            _ => Vec::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DubError>;
