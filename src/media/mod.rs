// Media processing
//
// - Commands: external-tool command builder with deadlines
// - Processor: ffmpeg/ffprobe implementation of `MediaProcessorTrait`
// - Download: downloader chain that fetches the video-only stream
// - Muxer: puts the dubbed audio onto the downloaded video

pub mod commands;
pub mod download;
pub mod muxer;
pub mod processor;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use commands::*;
pub use download::*;
pub use muxer::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Write a silent audio file of the given length
    async fn generate_silence(&self, duration_secs: f64, output_path: &Path) -> Result<()>;

    /// Concatenate audio files in order into one file
    async fn concatenate_audio(&self, inputs: &[PathBuf], output_path: &Path) -> Result<()>;

    /// Transcode a single audio file to the output location
    async fn copy_audio(&self, input: &Path, output_path: &Path) -> Result<()>;

    /// Copy the video stream, encode the audio stream, cut to the shorter one
    async fn merge_video_audio(&self, video_path: &Path, audio_path: &Path, output_path: &Path) -> Result<()>;

    /// Length of a media file in seconds
    async fn probe_duration(&self, path: &Path) -> Result<f64>;

    /// Check if media processor is available
    fn check_availability(&self) -> Result<()>;

    /// Get media processor version information
    async fn get_version_info(&self) -> Result<String>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Arc<dyn MediaProcessorTrait> {
        Arc::new(processor::MediaProcessorImpl::new(config))
    }
}
