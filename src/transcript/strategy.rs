use async_trait::async_trait;

use crate::error::{DubError, Result};
use crate::media::watch_url;
use super::{CaptionLine, LanguageHint, TranscriptSource};

/// One way of asking a transcript source for captions
#[async_trait]
pub trait TranscriptStrategy: Send + Sync {
    /// Short label for logs
    fn name(&self) -> String;

    async fn fetch(&self, source: &dyn TranscriptSource, video_id: &str) -> Result<Vec<CaptionLine>>;
}

/// Ask for the video id in one language (or auto-detect)
pub struct LanguageStrategy {
    hint: LanguageHint,
}

impl LanguageStrategy {
    pub fn new(hint: LanguageHint) -> Self {
        Self { hint }
    }
}

#[async_trait]
impl TranscriptStrategy for LanguageStrategy {
    fn name(&self) -> String {
        self.hint.to_string()
    }

    async fn fetch(&self, source: &dyn TranscriptSource, video_id: &str) -> Result<Vec<CaptionLine>> {
        source.fetch(video_id, &self.hint).await
    }
}

/// Alternative ways of referring to the same video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceForm {
    WatchUrl,
    ShortUrl,
    BareId,
}

impl ReferenceForm {
    pub fn render(&self, video_id: &str) -> String {
        match self {
            ReferenceForm::WatchUrl => watch_url(video_id),
            ReferenceForm::ShortUrl => format!("https://youtu.be/{}", video_id),
            ReferenceForm::BareId => video_id.to_string(),
        }
    }
}

/// Auto-detect against an alternative reference to the video
pub struct ReferenceStrategy {
    form: ReferenceForm,
}

impl ReferenceStrategy {
    pub fn new(form: ReferenceForm) -> Self {
        Self { form }
    }
}

#[async_trait]
impl TranscriptStrategy for ReferenceStrategy {
    fn name(&self) -> String {
        format!("alternative reference {:?}", self.form)
    }

    async fn fetch(&self, source: &dyn TranscriptSource, video_id: &str) -> Result<Vec<CaptionLine>> {
        source.fetch(&self.form.render(video_id), &LanguageHint::AutoDetect).await
    }
}

/// List every advertised track and take the first
pub struct TrackListingStrategy;

#[async_trait]
impl TranscriptStrategy for TrackListingStrategy {
    fn name(&self) -> String {
        "first listed track".to_string()
    }

    async fn fetch(&self, source: &dyn TranscriptSource, video_id: &str) -> Result<Vec<CaptionLine>> {
        let tracks = source.list_tracks(video_id).await?;
        let first = tracks.first().ok_or_else(|| {
            DubError::TranscriptSource("No transcript tracks are listed for this video".to_string())
        })?;
        source.fetch_track(video_id, first).await
    }
}

/// Strategies tried on every attempt: each configured tag, then auto-detect
pub fn language_strategies(languages: &[String]) -> Vec<Box<dyn TranscriptStrategy>> {
    languages
        .iter()
        .map(|tag| LanguageHint::Tag(tag.clone()))
        .chain(std::iter::once(LanguageHint::AutoDetect))
        .map(|hint| Box::new(LanguageStrategy::new(hint)) as Box<dyn TranscriptStrategy>)
        .collect()
}

/// Strategies tried once after every attempt failed
pub fn fallback_strategies() -> Vec<Box<dyn TranscriptStrategy>> {
    vec![
        Box::new(ReferenceStrategy::new(ReferenceForm::WatchUrl)),
        Box::new(ReferenceStrategy::new(ReferenceForm::ShortUrl)),
        Box::new(ReferenceStrategy::new(ReferenceForm::BareId)),
        Box::new(TrackListingStrategy),
    ]
}
