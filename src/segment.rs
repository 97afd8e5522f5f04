use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Shortest trimmed text (in characters) worth translating or speaking
pub const MIN_TEXT_CHARS: usize = 2;

/// True when `text` is long enough to send to translation or synthesis
pub fn is_speakable(text: &str) -> bool {
    text.trim().chars().count() >= MIN_TEXT_CHARS
}

/// One time-coded utterance of the source transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start_secs: f64,
    pub duration_secs: f64,
}

impl TranscriptSegment {
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}

/// A transcript segment together with its translation.
/// `translated_text` equals `segment.text` when translation was skipped or failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedSegment {
    #[serde(flatten)]
    pub segment: TranscriptSegment,
    pub translated_text: String,
}

impl TranslatedSegment {
    pub fn verbatim(segment: TranscriptSegment) -> Self {
        let translated_text = segment.text.clone();
        Self { segment, translated_text }
    }

    /// Needed translation but still carries the original text
    pub fn is_untranslated(&self) -> bool {
        is_speakable(&self.segment.text) && self.translated_text == self.segment.text
    }
}

/// Speech or silence audio positioned on the original timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    pub path: PathBuf,
    pub start_secs: f64,
    pub duration_secs: f64,
    pub sequence_index: usize,
}

impl AudioClip {
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}
