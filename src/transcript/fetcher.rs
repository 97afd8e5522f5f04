use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{is_missing_captions, DubError, Result, UnavailableReason};
use crate::pacing::Sleeper;
use crate::retry::RetryPolicy;
use crate::segment::TranscriptSegment;
use super::{
    fallback_strategies, language_strategies, validate_video_id, TranscriptSource, TranscriptStrategy,
};

/// Result of a transcript availability check
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptCheck {
    pub available: bool,
    pub segment_count: usize,
    pub total_duration_secs: f64,
    /// First few lines joined with spaces
    pub preview: String,
    /// Classified failure message when unavailable
    pub error: Option<String>,
}

const PREVIEW_LINES: usize = 3;

/// Retrieves a transcript with retries, backoff and fallback strategies
pub struct TranscriptFetcher {
    source: Arc<dyn TranscriptSource>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    primary: Vec<Box<dyn TranscriptStrategy>>,
    fallback: Vec<Box<dyn TranscriptStrategy>>,
}

impl TranscriptFetcher {
    pub fn new(
        source: Arc<dyn TranscriptSource>,
        languages: &[String],
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            source,
            policy,
            sleeper,
            primary: language_strategies(languages),
            fallback: fallback_strategies(),
        }
    }

    /// Fetch the transcript for a validated video id.
    /// Times are converted from milliseconds to seconds; order is the source's.
    pub async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        validate_video_id(video_id)?;
        info!("Fetching transcript for video {}", video_id);

        let mut last_error: Option<String> = None;
        let attempts = self.policy.max_retries;

        for attempt in 0..attempts {
            debug!("Transcript attempt {}/{}", attempt + 1, attempts);

            for strategy in &self.primary {
                match strategy.fetch(self.source.as_ref(), video_id).await {
                    Ok(lines) if !lines.is_empty() => {
                        info!("Fetched transcript with {} segments ({})", lines.len(), strategy.name());
                        return Ok(lines.into_iter().map(TranscriptSegment::from).collect());
                    }
                    Ok(_) => {
                        debug!("Empty transcript with {}", strategy.name());
                        last_error = Some(format!("Empty transcript with {}", strategy.name()));
                    }
                    Err(e) => {
                        let message = e.to_string();
                        warn!("Failed with {}: {}", strategy.name(), message);
                        let missing = is_missing_captions(&message);
                        last_error = Some(message);
                        if !missing {
                            break;
                        }
                    }
                }
            }

            if attempt + 1 < attempts {
                let delay = self.policy.delay(attempt);
                info!("Waiting {:?} before retrying transcript fetch", delay);
                self.sleeper.sleep(delay).await;
            }
        }

        info!("Trying alternative transcript fetching methods");
        for strategy in &self.fallback {
            match strategy.fetch(self.source.as_ref(), video_id).await {
                Ok(lines) if !lines.is_empty() => {
                    info!("Fetched transcript with {} segments ({})", lines.len(), strategy.name());
                    return Ok(lines.into_iter().map(TranscriptSegment::from).collect());
                }
                Ok(_) => debug!("Empty transcript with {}", strategy.name()),
                Err(e) => {
                    warn!("Alternative {} failed: {}", strategy.name(), e);
                    last_error = Some(e.to_string());
                }
            }
        }

        let last_error = last_error.unwrap_or_else(|| "Unknown error".to_string());
        Err(DubError::TranscriptUnavailable {
            reason: UnavailableReason::classify(&last_error),
            last_error,
        })
    }

    /// Report whether a transcript can be fetched, without creating a job
    pub async fn check(&self, video_id: &str) -> TranscriptCheck {
        match self.fetch(video_id).await {
            Ok(segments) => TranscriptCheck {
                available: true,
                segment_count: segments.len(),
                total_duration_secs: segments.iter().map(TranscriptSegment::end_secs).fold(0.0, f64::max),
                preview: segments
                    .iter()
                    .take(PREVIEW_LINES)
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
                error: None,
            },
            Err(e) => TranscriptCheck {
                available: false,
                segment_count: 0,
                total_duration_secs: 0.0,
                preview: String::new(),
                error: Some(e.to_string()),
            },
        }
    }
}
