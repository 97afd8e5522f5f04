use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::SpeechConfig;
use crate::language::speech_code;
use crate::media::MediaProcessorTrait;
use crate::outcome::{Degradation, StageOutcome};
use crate::error::DubError;
use crate::segment::{is_speakable, AudioClip, TranslatedSegment};
use super::SpeechEngine;

/// What ended up in a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClipKind {
    Speech,
    Silence,
}

/// Turns translated segments into positioned audio clips
pub struct SpeechSynthesizer {
    engine: Arc<dyn SpeechEngine>,
    media: Arc<dyn MediaProcessorTrait>,
    config: SpeechConfig,
    show_progress: bool,
}

impl SpeechSynthesizer {
    pub fn new(engine: Arc<dyn SpeechEngine>, media: Arc<dyn MediaProcessorTrait>, config: SpeechConfig) -> Self {
        Self {
            engine,
            media,
            config,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Synthesize every segment into `work_dir`.
    /// Fails with `NoAudioGenerated` when no clip at all could be produced.
    pub async fn synthesize_all(
        &self,
        segments: &[TranslatedSegment],
        target_language: &str,
        work_dir: &Path,
    ) -> StageOutcome<Vec<AudioClip>> {
        let language_code = speech_code(target_language, &self.config.default_language);
        info!("Synthesizing {} segments with language code {}", segments.len(), language_code);

        let progress = self.progress_bar(segments.len() as u64);
        let mut clips = Vec::new();
        let mut silenced = 0;
        let mut dropped = 0;

        for (index, segment) in segments.iter().enumerate() {
            progress.inc(1);
            if !is_speakable(&segment.translated_text) {
                debug!("Skipping segment {} with no speakable text", index);
                continue;
            }

            match self.synthesize_segment(index, segment, &language_code, work_dir).await {
                Some((clip, ClipKind::Speech)) => clips.push(clip),
                Some((clip, ClipKind::Silence)) => {
                    silenced += 1;
                    clips.push(clip);
                }
                None => dropped += 1,
            }
        }
        progress.finish_and_clear();

        if clips.is_empty() {
            return StageOutcome::Fatal(DubError::NoAudioGenerated);
        }

        info!("Generated {} clips ({} silenced, {} dropped)", clips.len(), silenced, dropped);
        let degradations = if silenced + dropped > 0 {
            vec![Degradation::SynthesisDegraded { silenced, dropped }]
        } else {
            Vec::new()
        };
        StageOutcome::from_parts(clips, degradations)
    }

    async fn synthesize_segment(
        &self,
        index: usize,
        segment: &TranslatedSegment,
        language_code: &str,
        work_dir: &Path,
    ) -> Option<(AudioClip, ClipKind)> {
        let start_secs = segment.segment.start_secs;
        let substitute_secs = segment.segment.duration_secs.max(self.config.min_silence_secs);

        let speech_path = work_dir.join(format!("line_{}.{}", index, self.engine.extension()));
        match self.engine.synthesize(segment.translated_text.trim(), language_code, &speech_path).await {
            Ok(()) => {
                let duration_secs = match self.media.probe_duration(&speech_path).await {
                    Ok(secs) => secs,
                    Err(e) => {
                        debug!("Could not probe {}: {}", speech_path.display(), e);
                        substitute_secs
                    }
                };
                let clip = AudioClip { path: speech_path, start_secs, duration_secs, sequence_index: index };
                return Some((clip, ClipKind::Speech));
            }
            Err(e) => warn!("Speech synthesis failed for segment {}: {}", index, e),
        }

        let silence_path = work_dir.join(format!("silence_{}.wav", index));
        match self.media.generate_silence(substitute_secs, &silence_path).await {
            Ok(()) => {
                let clip = AudioClip {
                    path: silence_path,
                    start_secs,
                    duration_secs: substitute_secs,
                    sequence_index: index,
                };
                Some((clip, ClipKind::Silence))
            }
            Err(e) => {
                warn!("Dropping segment {}: silence substitute failed too: {}", index, e);
                None
            }
        }
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} segments")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}
