use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{DubError, Result};
use super::{MediaCommandBuilder, MediaProcessorTrait};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(
            &config.binary_path,
            &config.probe_path,
            Duration::from_secs(config.timeout_secs),
        );

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn generate_silence(&self, duration_secs: f64, output_path: &Path) -> Result<()> {
        // ffmpeg produces an empty file for a zero-length duration
        let duration_secs = duration_secs.max(0.1);
        debug!("Generating {:.3}s of silence -> {}", duration_secs, output_path.display());

        let command = self.command_builder.generate_silence(
            duration_secs,
            self.config.sample_rate,
            output_path,
        );
        command.execute().await
    }

    async fn concatenate_audio(&self, inputs: &[PathBuf], output_path: &Path) -> Result<()> {
        if inputs.is_empty() {
            return Err(DubError::Media("No audio files to concatenate".to_string()));
        }
        info!("Concatenating {} audio files -> {}", inputs.len(), output_path.display());

        let command = self.command_builder.concatenate_audio(
            inputs,
            self.config.sample_rate,
            output_path.to_path_buf(),
        );
        command.execute().await?;

        info!("Audio concatenation completed");
        Ok(())
    }

    async fn copy_audio(&self, input: &Path, output_path: &Path) -> Result<()> {
        info!("Copying audio {} -> {}", input.display(), output_path.display());

        let command = self.command_builder.copy_audio(input, self.config.sample_rate, output_path);
        command.execute().await
    }

    async fn merge_video_audio(&self, video_path: &Path, audio_path: &Path, output_path: &Path) -> Result<()> {
        info!("Merging {} + {} -> {}",
              video_path.display(), audio_path.display(), output_path.display());

        let command = self.command_builder.merge_video_audio(
            video_path,
            audio_path,
            &self.config.audio_codec,
            output_path,
        );
        command.execute().await?;

        info!("Video/audio merge completed successfully");
        Ok(())
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let stdout = self.command_builder.probe_duration(path).execute_capture().await?;
        parse_probe_duration(&stdout)
    }

    /// Check if media processor is available
    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.binary_path)
            .arg("-version")
            .output()
            .map_err(|e| DubError::Media(format!("Media processor not found: {}", e)))?;

        if output.status.success() {
            info!("Media processor is available");
            Ok(())
        } else {
            Err(DubError::Media("Media processor version check failed".to_string()))
        }
    }

    /// Get media processor version information
    async fn get_version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");

        let stdout = self.command_builder.version_check().execute_capture().await?;
        // The first line carries the version
        let first_line = stdout.lines().next().unwrap_or("Unknown version");
        Ok(first_line.to_string())
    }
}

/// Parse ffprobe's bare `format=duration` output
fn parse_probe_duration(stdout: &str) -> Result<f64> {
    let value = stdout.trim();
    match value.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => Ok(seconds),
        _ => Err(DubError::Media(format!("Unusable duration from probe: '{}'", value))),
    }
}
