use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::DubError;
use crate::media::MediaProcessorTrait;
use crate::outcome::{Degradation, StageOutcome};
use crate::segment::AudioClip;

/// One element of the reconstructed timeline
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEntry {
    Clip(AudioClip),
    /// Silence to insert before the next clip
    Gap { duration_secs: f64 },
}

impl TimelineEntry {
    pub fn duration_secs(&self) -> f64 {
        match self {
            TimelineEntry::Clip(clip) => clip.duration_secs,
            TimelineEntry::Gap { duration_secs } => *duration_secs,
        }
    }
}

/// Order clips by start time and insert gaps that reproduce the original spacing.
/// Gaps no longer than `gap_threshold_secs` are absorbed.
pub fn plan_timeline(clips: &[AudioClip], gap_threshold_secs: f64) -> Vec<TimelineEntry> {
    let mut ordered: Vec<&AudioClip> = clips.iter().collect();
    // stable, so equal starts keep their input order
    ordered.sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));

    let mut plan = Vec::with_capacity(ordered.len() * 2);
    let mut current = 0.0_f64;
    for clip in ordered {
        let gap = clip.start_secs - current;
        if gap > gap_threshold_secs {
            plan.push(TimelineEntry::Gap { duration_secs: gap });
        }
        plan.push(TimelineEntry::Clip(clip.clone()));
        current = clip.end_secs();
    }
    plan
}

/// Materializes a timeline plan into an ordered list of audio files
pub struct TimelineAligner {
    media: Arc<dyn MediaProcessorTrait>,
    gap_threshold_secs: f64,
}

impl TimelineAligner {
    pub fn new(media: Arc<dyn MediaProcessorTrait>, gap_threshold_secs: f64) -> Self {
        Self { media, gap_threshold_secs }
    }

    /// Ordered audio files, clips interleaved with generated `gap_<i>.wav` fillers
    pub async fn align(&self, clips: &[AudioClip], work_dir: &Path) -> StageOutcome<Vec<PathBuf>> {
        let plan = plan_timeline(clips, self.gap_threshold_secs);
        debug!("Timeline plan has {} entries for {} clips", plan.len(), clips.len());

        let mut files = Vec::with_capacity(plan.len());
        let mut skipped = 0;
        for (index, entry) in plan.into_iter().enumerate() {
            match entry {
                TimelineEntry::Clip(clip) => files.push(clip.path),
                TimelineEntry::Gap { duration_secs } => {
                    let gap_path = work_dir.join(format!("gap_{}.wav", index));
                    match self.media.generate_silence(duration_secs, &gap_path).await {
                        Ok(()) => files.push(gap_path),
                        Err(e) => {
                            warn!("Skipping {:.2}s gap filler: {}", duration_secs, e);
                            skipped += 1;
                        }
                    }
                }
            }
        }

        if files.is_empty() {
            return StageOutcome::Fatal(DubError::AlignmentFailed);
        }

        info!("Aligned {} audio files", files.len());
        let degradations = if skipped > 0 {
            vec![Degradation::GapFillerSkipped { count: skipped }]
        } else {
            Vec::new()
        };
        StageOutcome::from_parts(files, degradations)
    }
}
