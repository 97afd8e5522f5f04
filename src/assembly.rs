use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::Result;
use crate::media::MediaProcessorTrait;
use crate::outcome::{Degradation, StageOutcome};
use crate::segment::AudioClip;

/// Joins the aligned audio files into one continuous track
pub struct AudioAssembler {
    media: Arc<dyn MediaProcessorTrait>,
    fallback_duration_secs: f64,
}

impl AudioAssembler {
    pub fn new(media: Arc<dyn MediaProcessorTrait>, fallback_duration_secs: f64) -> Self {
        Self { media, fallback_duration_secs }
    }

    /// Write the track to `output_path`.
    /// When joining fails the track becomes silence as long as the clips span.
    pub async fn assemble(&self, files: &[PathBuf], clips: &[AudioClip], output_path: &Path) -> StageOutcome<PathBuf> {
        let joined = match files {
            [single] => self.media.copy_audio(single, output_path).await,
            many => self.media.concatenate_audio(many, output_path).await,
        };

        match joined {
            Ok(()) => {
                info!("Assembled {} audio files into {}", files.len(), output_path.display());
                StageOutcome::Success(output_path.to_path_buf())
            }
            Err(e) => {
                warn!("Audio assembly failed, substituting silence: {}", e);
                let reason = e.to_string();
                match self.silence_track(clips, output_path).await {
                    Ok(()) => StageOutcome::Degraded(
                        output_path.to_path_buf(),
                        vec![Degradation::AssemblyDegraded { reason }],
                    ),
                    Err(silence_error) => StageOutcome::Fatal(silence_error),
                }
            }
        }
    }

    async fn silence_track(&self, clips: &[AudioClip], output_path: &Path) -> Result<()> {
        let duration_secs = fallback_duration(clips, self.fallback_duration_secs);
        info!("Generating {:.2}s silence track", duration_secs);
        self.media.generate_silence(duration_secs, output_path).await
    }
}

/// Latest clip end, or `default_secs` when that is not a positive finite number
pub fn fallback_duration(clips: &[AudioClip], default_secs: f64) -> f64 {
    let latest_end = clips.iter().map(AudioClip::end_secs).fold(f64::NAN, f64::max);
    if latest_end.is_finite() && latest_end > 0.0 {
        latest_end
    } else {
        default_secs
    }
}
