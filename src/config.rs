use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{DubError, Result};
use crate::retry::RetryPolicy;

/// Environment variable consulted when `translate.api_key` is not set
pub const API_KEY_ENV: &str = "RAPIDAPI_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub jobs: JobsConfig,
    pub transcript: TranscriptConfig,
    pub translate: TranslateConfig,
    pub speech: SpeechConfig,
    pub timeline: TimelineConfig,
    pub media: MediaConfig,
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Directory that holds one sub-directory per job
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Path to the yt-dlp binary used to discover caption tracks
    pub binary_path: String,
    /// Explicit language tags tried in order before auto-detection
    pub languages: Vec<String>,
    /// Deadline for a single metadata or caption request (seconds)
    pub timeout_secs: u64,
    /// Backoff between outer attempts
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Translation API endpoint
    pub endpoint: String,
    /// Value sent as the `x-rapidapi-host` header
    pub host: String,
    /// API credential; falls back to the RAPIDAPI_KEY environment variable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Segments per batch
    pub batch_size: usize,
    /// Pause after each successful call (milliseconds)
    pub item_delay_ms: u64,
    /// Pause after a failed call (milliseconds)
    pub error_delay_ms: u64,
    /// Lower bound of the randomized pause between batches (milliseconds)
    pub batch_delay_min_ms: u64,
    /// Upper bound of the randomized pause between batches (milliseconds)
    pub batch_delay_max_ms: u64,
    /// Deadline for a single translation request (seconds)
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SpeechBackend {
    /// Google Translate TTS through the gtts-cli tool
    Gtts,
    /// Local synthesis through espeak-ng
    Espeak,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    pub backend: SpeechBackend,
    /// Path to the synthesis binary
    pub binary_path: String,
    /// Language code used when the target language has no mapping
    pub default_language: String,
    /// Shortest silence substituted for a failed segment (seconds)
    pub min_silence_secs: f64,
    /// Deadline for one synthesis call (seconds)
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Gaps at or below this length are absorbed without a filler (seconds)
    pub gap_threshold_secs: f64,
    /// Length of the silence track produced when assembly fails and clip timing is unusable (seconds)
    pub fallback_duration_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Path to ffprobe binary
    pub probe_path: String,
    /// Codec used for the dubbed audio stream in the final video
    pub audio_codec: String,
    /// Sample rate shared by generated silence and concatenated audio
    pub sample_rate: u32,
    /// Deadline for one ffmpeg invocation (seconds)
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Downloader binary (e.g. yt-dlp, youtube-dl)
    pub program: String,
    /// Format selectors tried in order
    pub formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Deadline for one download attempt (seconds)
    pub timeout_secs: u64,
    /// Downloaders tried in order
    pub downloaders: Vec<DownloaderConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jobs: JobsConfig {
                root: PathBuf::from("downloads"),
            },
            transcript: TranscriptConfig {
                binary_path: "yt-dlp".to_string(),
                languages: vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()],
                timeout_secs: 60,
                retry: RetryPolicy::default(),
            },
            translate: TranslateConfig {
                endpoint: "https://google-translator9.p.rapidapi.com/v2".to_string(),
                host: "google-translator9.p.rapidapi.com".to_string(),
                api_key: None,
                batch_size: 10,
                item_delay_ms: 200,
                error_delay_ms: 1000,
                batch_delay_min_ms: 3000,
                batch_delay_max_ms: 5000,
                timeout_secs: 30,
            },
            speech: SpeechConfig {
                backend: SpeechBackend::Gtts,
                binary_path: "gtts-cli".to_string(),
                default_language: "en".to_string(),
                min_silence_secs: 0.5,
                timeout_secs: 60,
            },
            timeline: TimelineConfig {
                gap_threshold_secs: 0.1,
                fallback_duration_secs: 10.0,
            },
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
                probe_path: "ffprobe".to_string(),
                audio_codec: "aac".to_string(),
                sample_rate: 22050,
                timeout_secs: 600,
            },
            download: DownloadConfig {
                timeout_secs: 900,
                downloaders: vec![
                    DownloaderConfig {
                        program: "yt-dlp".to_string(),
                        formats: vec![
                            "bestvideo[ext=mp4]".to_string(),
                            "best[ext=mp4]".to_string(),
                        ],
                    },
                    DownloaderConfig {
                        program: "youtube-dl".to_string(),
                        formats: vec!["bestvideo[ext=mp4]".to_string()],
                    },
                ],
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DubError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| DubError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DubError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| DubError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Fill the translation credential from the environment when the file did not set one.
    pub fn resolve_credentials(&mut self) {
        if self.translate.api_key.is_none() {
            self.translate.api_key = std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
    }

    /// Check value ranges once, before any job starts
    pub fn validate(&self) -> Result<()> {
        if self.translate.batch_size == 0 {
            return Err(DubError::Config("translate.batch_size must be at least 1".to_string()));
        }
        if self.translate.batch_delay_min_ms > self.translate.batch_delay_max_ms {
            return Err(DubError::Config(
                "translate.batch_delay_min_ms must not exceed translate.batch_delay_max_ms".to_string(),
            ));
        }
        self.transcript.retry.validate()?;
        if self.timeline.gap_threshold_secs < 0.0 || !self.timeline.gap_threshold_secs.is_finite() {
            return Err(DubError::Config("timeline.gap_threshold_secs must be >= 0".to_string()));
        }
        if self.timeline.fallback_duration_secs <= 0.0 || !self.timeline.fallback_duration_secs.is_finite() {
            return Err(DubError::Config("timeline.fallback_duration_secs must be > 0".to_string()));
        }
        if self.speech.min_silence_secs <= 0.0 || !self.speech.min_silence_secs.is_finite() {
            return Err(DubError::Config("speech.min_silence_secs must be > 0".to_string()));
        }
        if self.download.downloaders.is_empty() {
            return Err(DubError::Config("download.downloaders must list at least one downloader".to_string()));
        }
        if let Some(empty) = self.download.downloaders.iter().find(|d| d.formats.is_empty()) {
            return Err(DubError::Config(format!(
                "downloader '{}' must list at least one format", empty.program
            )));
        }
        Ok(())
    }
}
