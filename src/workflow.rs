use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::assembly::AudioAssembler;
use crate::config::Config;
use crate::error::{DubError, Result};
use crate::jobs::{DubbingReport, Job, JobFailure, JobStatus, JobStore, JobSummary, FINAL_AUDIO_FILE};
use crate::media::{
    DownloaderFactory, MediaCommand, MediaMuxer, MediaProcessorFactory, MediaProcessorTrait, VideoDownloader,
};
use crate::pacing::{Sleeper, TokioSleeper};
use crate::speech::{SpeechEngine, SpeechEngineFactory, SpeechSynthesizer};
use crate::timeline::TimelineAligner;
use crate::transcript::{
    extract_video_id, validate_video_id, TranscriptCheck, TranscriptFetcher, TranscriptSource,
    YtDlpTranscriptSource,
};
use crate::translate::{translation_error_count, TranslationBatcher, TranslationClient, TranslationClientFactory};

/// External collaborators the pipeline drives
pub struct PipelineComponents {
    pub transcript_source: Arc<dyn TranscriptSource>,
    pub translation_client: Option<Arc<dyn TranslationClient>>,
    pub speech_engine: Arc<dyn SpeechEngine>,
    pub media: Arc<dyn MediaProcessorTrait>,
    pub downloaders: Vec<Box<dyn VideoDownloader>>,
    pub sleeper: Arc<dyn Sleeper>,
}

/// Availability of one external tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub name: String,
    pub available: bool,
    pub detail: String,
}

pub struct DubbingPipeline {
    jobs: JobStore,
    transcripts: TranscriptFetcher,
    translator: TranslationBatcher,
    synthesizer: SpeechSynthesizer,
    aligner: TimelineAligner,
    assembler: AudioAssembler,
    muxer: MediaMuxer,
}

impl DubbingPipeline {
    /// Build the pipeline from a validated configuration
    pub fn new(config: Config) -> Result<Self> {
        let media = MediaProcessorFactory::create_processor(config.media.clone());

        // Check dependencies
        media.check_availability()?;

        Self::with_media(config, media)
    }

    /// Build without requiring ffmpeg; enough for transcript checks
    pub fn without_tool_check(config: Config) -> Result<Self> {
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        Self::with_media(config, media)
    }

    fn with_media(config: Config, media: Arc<dyn MediaProcessorTrait>) -> Result<Self> {
        let components = PipelineComponents {
            transcript_source: Arc::new(YtDlpTranscriptSource::new(&config.transcript)?),
            translation_client: TranslationClientFactory::create_client(&config.translate)?,
            speech_engine: SpeechEngineFactory::create_engine(&config.speech),
            media,
            downloaders: DownloaderFactory::create_chain(&config.download),
            sleeper: Arc::new(TokioSleeper),
        };
        Ok(Self::with_components(config, components))
    }

    pub fn with_components(config: Config, components: PipelineComponents) -> Self {
        let media = components.media;
        Self {
            jobs: JobStore::new(&config.jobs.root),
            transcripts: TranscriptFetcher::new(
                components.transcript_source,
                &config.transcript.languages,
                config.transcript.retry.clone(),
                components.sleeper.clone(),
            ),
            translator: TranslationBatcher::new(
                components.translation_client,
                config.translate.clone(),
                components.sleeper,
            ),
            synthesizer: SpeechSynthesizer::new(components.speech_engine, media.clone(), config.speech.clone()),
            aligner: TimelineAligner::new(media.clone(), config.timeline.gap_threshold_secs),
            assembler: AudioAssembler::new(media.clone(), config.timeline.fallback_duration_secs),
            muxer: MediaMuxer::new(components.downloaders, media),
        }
    }

    /// Hide the synthesis progress bar (for JSON output)
    pub fn without_progress(mut self) -> Self {
        self.synthesizer = self.synthesizer.with_progress(false);
        self
    }

    /// Dub a video (URL or id) into `target_language`.
    /// The job directory is kept whether or not the job succeeds; a job that
    /// ends without its output gets a failure record.
    pub async fn run_dubbing_job(
        &self,
        video: &str,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<DubbingReport> {
        let video_id = extract_video_id(video);
        validate_video_id(&video_id)?;

        let job = self.jobs.create().await?;
        let span = info_span!("job", id = %job.id, video = %video_id);

        let run = self.run_stages(&job, &video_id, target_language).instrument(span);
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Job {} cancelled", job.id);
                Err(DubError::Cancelled)
            }
            result = run => result,
        };

        if let Err(e) = &result {
            let failure = JobFailure {
                job_id: job.id,
                video_id: video_id.clone(),
                target_language: target_language.to_string(),
                error: e.to_string(),
                cancelled: matches!(e, DubError::Cancelled),
                failed_at: Utc::now(),
            };
            if let Err(write_err) = self.jobs.write_failure(&job, &failure).await {
                warn!("Could not record failure of job {}: {}", job.id, write_err);
            }
        }
        result
    }

    async fn run_stages(&self, job: &Job, video_id: &str, target_language: &str) -> Result<DubbingReport> {
        let started_at = Utc::now();
        let mut degradations = Vec::new();
        info!("Starting dubbing of {} into {}", video_id, target_language);

        // Step 1: Transcript
        let segments = self.transcripts.fetch(video_id).await?;
        if segments.is_empty() {
            return Err(DubError::InvalidInput("The transcript is empty".to_string()));
        }
        let transcript_segment_count = segments.len();

        // Step 2: Translation
        let translated = self.translator
            .translate(&segments, target_language)
            .await
            .absorb(&mut degradations)?;
        let translation_error_count = translation_error_count(&translated);

        // Step 3: Speech
        let clips = self.synthesizer
            .synthesize_all(&translated, target_language, &job.work_dir)
            .await
            .absorb(&mut degradations)?;

        // Step 4: Timeline
        let files = self.aligner
            .align(&clips, &job.work_dir)
            .await
            .absorb(&mut degradations)?;

        // Step 5: Audio track
        let audio_path = self.assembler
            .assemble(&files, &clips, &job.work_dir.join(FINAL_AUDIO_FILE))
            .await
            .absorb(&mut degradations)?;

        // Step 6: Final video
        let output_path = self.muxer.produce(video_id, &audio_path, &job.work_dir).await?;

        let report = DubbingReport {
            job_id: job.id,
            video_id: video_id.to_string(),
            target_language: target_language.to_string(),
            output_path,
            transcript_segment_count,
            translation_error_count,
            clip_count: clips.len(),
            degradations,
            started_at,
            finished_at: Utc::now(),
        };
        self.jobs.write_report(job, &report).await?;

        info!(
            "Dubbing completed: {} segments, {} untranslated, {} degradations",
            report.transcript_segment_count,
            report.translation_error_count,
            report.degradations.len()
        );
        Ok(report)
    }

    pub fn job_status(&self, job_id: &str) -> Result<JobStatus> {
        self.jobs.status(job_id)
    }

    pub fn list_jobs(&self) -> Result<Vec<JobSummary>> {
        self.jobs.list()
    }

    /// Whether a transcript can be fetched for a video (URL or id)
    pub async fn check_transcript(&self, video: &str) -> TranscriptCheck {
        self.transcripts.check(&extract_video_id(video)).await
    }
}

/// Probe every external tool the configuration refers to
pub async fn check_tools(config: &Config) -> Vec<ToolStatus> {
    let mut statuses = Vec::new();

    let media = MediaProcessorFactory::create_processor(config.media.clone());
    statuses.push(match media.get_version_info().await {
        Ok(version) => ToolStatus { name: config.media.binary_path.clone(), available: true, detail: version },
        Err(e) => ToolStatus { name: config.media.binary_path.clone(), available: false, detail: e.to_string() },
    });

    let mut programs = vec![config.media.probe_path.clone(), config.transcript.binary_path.clone()];
    for downloader in &config.download.downloaders {
        if !programs.contains(&downloader.program) {
            programs.push(downloader.program.clone());
        }
    }
    for program in programs {
        let version = MediaCommand::new(&program, format!("{} version check", program))
            .with_timeout(std::time::Duration::from_secs(30))
            .arg("-version")
            .execute_capture()
            .await;
        let version = match version {
            Ok(out) => Ok(out),
            // youtube-dl style tools use the long flag
            Err(_) => MediaCommand::new(&program, format!("{} version check", program))
                .with_timeout(std::time::Duration::from_secs(30))
                .arg("--version")
                .execute_capture()
                .await,
        };
        statuses.push(match version {
            Ok(out) => ToolStatus {
                name: program,
                available: true,
                detail: out.lines().next().unwrap_or_default().trim().to_string(),
            },
            Err(e) => ToolStatus { name: program, available: false, detail: e.to_string() },
        });
    }

    let engine = SpeechEngineFactory::create_engine(&config.speech);
    statuses.push(match engine.check_availability().await {
        Ok(()) => ToolStatus { name: config.speech.binary_path.clone(), available: true, detail: "ok".to_string() },
        Err(e) => ToolStatus { name: config.speech.binary_path.clone(), available: false, detail: e.to_string() },
    });

    statuses.push(ToolStatus {
        name: "translation credential".to_string(),
        available: config.translate.api_key.is_some(),
        detail: match config.translate.api_key {
            Some(_) => "configured".to_string(),
            None => format!("missing; set translate.api_key or {}", crate::config::API_KEY_ENV),
        },
    });

    statuses
}
