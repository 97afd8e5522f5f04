use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::TranscriptConfig;
use crate::error::{DubError, Result};
use crate::media::{watch_url, MediaCommand};
use super::{CaptionLine, CaptionTrack, LanguageHint, TranscriptSource};

/// Caption format requested from the provider
const CAPTION_FORMAT: &str = "json3";

/// How long a metadata dump is reused; caption URLs in it are signed and expire
const METADATA_TTL: Duration = Duration::from_secs(300);

/// Transcript source that discovers caption tracks with yt-dlp and downloads
/// their json3 rendition over HTTP
pub struct YtDlpTranscriptSource {
    binary_path: String,
    timeout: Duration,
    client: Client,
    /// Last successful dump, keyed by reference. Every language strategy asks
    /// for the same video, so one dump serves a whole retry loop.
    last_metadata: Mutex<Option<CachedMetadata>>,
}

struct CachedMetadata {
    reference: String,
    fetched_at: Instant,
    metadata: Arc<Value>,
}

impl YtDlpTranscriptSource {
    pub fn new(config: &TranscriptConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            binary_path: config.binary_path.clone(),
            timeout,
            client,
            last_metadata: Mutex::new(None),
        })
    }

    fn cached_metadata(&self, reference: &str) -> Option<Arc<Value>> {
        let last = self.last_metadata.lock().ok()?;
        last.as_ref()
            .filter(|c| c.reference == reference && c.fetched_at.elapsed() < METADATA_TTL)
            .map(|c| c.metadata.clone())
    }

    async fn metadata(&self, reference: &str) -> Result<Arc<Value>> {
        if let Some(metadata) = self.cached_metadata(reference) {
            debug!("Reusing metadata for {}", reference);
            return Ok(metadata);
        }

        let stdout = MediaCommand::new(&self.binary_path, "yt-dlp metadata lookup")
            .with_timeout(self.timeout)
            .args(["--dump-single-json", "--skip-download", "--no-warnings", "--no-playlist"])
            .arg(reference)
            .execute_capture()
            .await
            .map_err(|e| match e {
                // keep the tool's own wording for classification
                DubError::Media(message) => DubError::TranscriptSource(message),
                other => other,
            })?;
        let metadata = Arc::new(serde_json::from_str::<Value>(&stdout)?);

        if let Ok(mut last) = self.last_metadata.lock() {
            *last = Some(CachedMetadata {
                reference: reference.to_string(),
                fetched_at: Instant::now(),
                metadata: metadata.clone(),
            });
        }
        Ok(metadata)
    }

    async fn download(&self, track: &CaptionTrack) -> Result<Vec<CaptionLine>> {
        debug!("Downloading {} captions ({})", track.language, track.name);
        let response = self.client.get(&track.url).send().await?;
        if !response.status().is_success() {
            return Err(DubError::TranscriptSource(format!(
                "Caption download for {} returned HTTP {}",
                track.language,
                response.status()
            )));
        }
        let body = response.text().await?;
        parse_json3(&body)
    }
}

#[async_trait]
impl TranscriptSource for YtDlpTranscriptSource {
    async fn fetch(&self, reference: &str, hint: &LanguageHint) -> Result<Vec<CaptionLine>> {
        let metadata = self.metadata(reference).await?;
        let track = select_track(&metadata, hint).ok_or_else(|| {
            DubError::TranscriptSource(format!("No transcript found for {}", hint))
        })?;
        self.download(&track).await
    }

    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>> {
        let metadata = self.metadata(&watch_url(video_id)).await?;
        Ok(tracks_from_metadata(&metadata))
    }

    async fn fetch_track(&self, _video_id: &str, track: &CaptionTrack) -> Result<Vec<CaptionLine>> {
        self.download(track).await
    }
}

/// Uploaded tracks first, then automatic captions
pub fn tracks_from_metadata(metadata: &Value) -> Vec<CaptionTrack> {
    let mut tracks = collect_tracks(metadata.get("subtitles"), false);
    tracks.extend(collect_tracks(metadata.get("automatic_captions"), true));
    tracks
}

fn collect_tracks(section: Option<&Value>, automatic: bool) -> Vec<CaptionTrack> {
    let Some(languages) = section.and_then(Value::as_object) else {
        return Vec::new();
    };

    languages
        .iter()
        .filter_map(|(language, formats)| {
            let rendition = formats
                .as_array()?
                .iter()
                .find(|f| f.get("ext").and_then(Value::as_str) == Some(CAPTION_FORMAT))?;
            Some(CaptionTrack {
                language: language.clone(),
                name: rendition
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or(language)
                    .to_string(),
                url: rendition.get("url").and_then(Value::as_str)?.to_string(),
                automatic,
            })
        })
        .collect()
}

/// Pick the track for a hint; uploaded captions win over automatic ones
pub fn select_track(metadata: &Value, hint: &LanguageHint) -> Option<CaptionTrack> {
    let tracks = tracks_from_metadata(metadata);
    match hint {
        LanguageHint::Tag(tag) => tracks.into_iter().find(|t| t.language.eq_ignore_ascii_case(tag)),
        LanguageHint::AutoDetect => {
            if let Some(manual) = tracks.iter().find(|t| !t.automatic) {
                return Some(manual.clone());
            }
            // automatic captions list every machine translation; prefer the spoken language
            let spoken = metadata.get("language").and_then(Value::as_str);
            tracks
                .iter()
                .find(|t| t.language.ends_with("-orig"))
                .or_else(|| tracks.iter().find(|t| Some(t.language.as_str()) == spoken))
                .or_else(|| tracks.first())
                .cloned()
        }
    }
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    t_start_ms: Option<u64>,
    d_duration_ms: Option<u64>,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse a json3 caption document; events without text or duration are dropped
pub fn parse_json3(body: &str) -> Result<Vec<CaptionLine>> {
    let document: Json3 = serde_json::from_str(body)?;
    Ok(document
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.replace('\n', " ").trim().to_string();
            let duration_ms = event.d_duration_ms.unwrap_or(0);
            if text.is_empty() || duration_ms == 0 {
                return None;
            }
            Some(CaptionLine {
                text,
                offset_ms: event.t_start_ms.unwrap_or(0),
                duration_ms,
            })
        })
        .collect())
}
