use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::DownloadConfig;
use crate::error::{DubError, Result};
use super::MediaCommand;

/// Fetches the video-only stream of a video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoDownloader: Send + Sync {
    /// Tool name used in logs and error messages
    fn name(&self) -> String;

    /// Write the video stream for `video_id` to `output_path`
    async fn download(&self, video_id: &str, output_path: &Path) -> Result<()>;
}

/// Downloader driven by a youtube-dl compatible command-line tool.
/// Format selectors are tried in order until one produces the output file.
pub struct CliDownloader {
    program: String,
    formats: Vec<String>,
    timeout: Duration,
}

impl CliDownloader {
    pub fn new<S: Into<String>>(program: S, formats: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            formats,
            timeout,
        }
    }

    fn command(&self, format: &str, video_id: &str, output_path: &Path) -> MediaCommand {
        MediaCommand::new(&self.program, format!("{} download ({})", self.program, format))
            .with_timeout(self.timeout)
            .arg("--no-playlist")
            .arg("-f")
            .arg(format)
            .arg("-o")
            .output(output_path)
            .arg(watch_url(video_id))
    }
}

#[async_trait]
impl VideoDownloader for CliDownloader {
    fn name(&self) -> String {
        self.program.clone()
    }

    async fn download(&self, video_id: &str, output_path: &Path) -> Result<()> {
        let mut failures = Vec::new();

        for format in &self.formats {
            // a leftover file from an earlier attempt must not count as success
            remove_if_exists(output_path).await?;

            info!("Downloading {} with {} (format {})", video_id, self.program, format);
            match self.command(format, video_id, output_path).execute().await {
                Ok(()) if output_path.exists() => {
                    info!("Video downloaded to {}", output_path.display());
                    return Ok(());
                }
                Ok(()) => {
                    warn!("{} reported success but {} was not created", self.program, output_path.display());
                    failures.push(format!("{}: video file was not created", format));
                }
                Err(e) => {
                    warn!("{} failed with format {}: {}", self.program, format, e);
                    failures.push(format!("{}: {}", format, e));
                }
            }
        }

        Err(DubError::Media(format!("{} failed: {}", self.program, failures.join("; "))))
    }
}

/// Canonical watch URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Factory for the ordered downloader chain
pub struct DownloaderFactory;

impl DownloaderFactory {
    pub fn create_chain(config: &DownloadConfig) -> Vec<Box<dyn VideoDownloader>> {
        let timeout = Duration::from_secs(config.timeout_secs);
        config
            .downloaders
            .iter()
            .map(|d| {
                Box::new(CliDownloader::new(&d.program, d.formats.clone(), timeout)) as Box<dyn VideoDownloader>
            })
            .collect()
    }
}

/// Try each downloader in order; the first that succeeds wins.
/// Returns the name of the downloader that produced the file.
pub async fn acquire_video(
    downloaders: &[Box<dyn VideoDownloader>],
    video_id: &str,
    output_path: &Path,
) -> Result<String> {
    let mut failures = Vec::new();

    for downloader in downloaders {
        match downloader.download(video_id, output_path).await {
            Ok(()) => return Ok(downloader.name()),
            Err(e) => {
                warn!("Downloader {} failed, trying next: {}", downloader.name(), e);
                failures.push(format!("{}: {}", downloader.name(), e));
            }
        }
    }

    if failures.is_empty() {
        failures.push("no downloaders configured".to_string());
    }
    Err(DubError::VideoAcquisitionFailed(failures.join(" | ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use crate::media::testing::{fake_tool, picky_downloader};
    use mockall::predicate::*;

    #[test]
    fn test_command_line_for_format() {
        let downloader = CliDownloader::new("yt-dlp", vec!["bestvideo[ext=mp4]".to_string()], Duration::from_secs(1));
        let cmd = downloader.command("bestvideo[ext=mp4]", "dQw4w9WgXcQ", Path::new("/jobs/x/video.mp4"));
        assert_eq!(cmd.binary_path, "yt-dlp");
        assert_eq!(
            cmd.args,
            vec![
                "--no-playlist",
                "-f",
                "bestvideo[ext=mp4]",
                "-o",
                "/jobs/x/video.mp4",
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            ]
        );
    }

    #[tokio::test]
    async fn test_chain_falls_back_to_second_downloader() {
        let mut primary = MockVideoDownloader::new();
        primary.expect_name().return_const("yt-dlp".to_string());
        primary
            .expect_download()
            .times(1)
            .returning(|_, _| Err(DubError::Media("HTTP Error 403".to_string())));

        let mut secondary = MockVideoDownloader::new();
        secondary.expect_name().return_const("youtube-dl".to_string());
        secondary
            .expect_download()
            .with(eq("dQw4w9WgXcQ"), always())
            .times(1)
            .returning(|_, _| Ok(()));

        let chain: Vec<Box<dyn VideoDownloader>> = vec![Box::new(primary), Box::new(secondary)];
        let used = acquire_video(&chain, "dQw4w9WgXcQ", Path::new("video.mp4")).await.unwrap();
        assert_eq!(used, "youtube-dl");
    }

    #[tokio::test]
    async fn test_chain_exhaustion_lists_every_failure() {
        let mut only = MockVideoDownloader::new();
        only.expect_name().return_const("yt-dlp".to_string());
        only.expect_download()
            .returning(|_, _| Err(DubError::Media("not installed".to_string())));

        let chain: Vec<Box<dyn VideoDownloader>> = vec![Box::new(only)];
        let err = acquire_video(&chain, "dQw4w9WgXcQ", Path::new("video.mp4")).await.unwrap_err();
        match err {
            DubError::VideoAcquisitionFailed(message) => {
                assert!(message.contains("yt-dlp"));
                assert!(message.contains("not installed"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = acquire_video(&[], "dQw4w9WgXcQ", Path::new("video.mp4")).await.unwrap_err();
        assert!(matches!(err, DubError::VideoAcquisitionFailed(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_second_format_succeeds_after_first_fails() {
        let dir = assert_fs::TempDir::new().unwrap();
        let tool = picky_downloader(dir.path());
        let output = dir.path().join("video.mp4");
        std::fs::write(&output, b"stale").unwrap();

        let downloader = CliDownloader::new(
            tool.to_string_lossy(),
            vec!["bad".to_string(), "good".to_string()],
            Duration::from_secs(10),
        );
        downloader.download("dQw4w9WgXcQ", &output).await.unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "video");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_without_output_file_is_a_failure() {
        let dir = assert_fs::TempDir::new().unwrap();
        let tool = fake_tool(dir.path(), "silent-dl", "exit 0");
        let output = dir.path().join("video.mp4");

        let downloader = CliDownloader::new(tool.to_string_lossy(), vec!["best".to_string()], Duration::from_secs(10));
        let err = downloader.download("dQw4w9WgXcQ", &output).await.unwrap_err();
        assert!(err.to_string().contains("video file was not created"));
    }

    #[tokio::test]
    async fn test_missing_tool_tries_every_format() {
        let dir = assert_fs::TempDir::new().unwrap();
        let output = dir.path().join("video.mp4");
        let downloader = CliDownloader::new(
            "definitely-not-a-real-downloader",
            vec!["bestvideo[ext=mp4]".to_string(), "best[ext=mp4]".to_string()],
            Duration::from_secs(5),
        );

        let err = downloader.download("dQw4w9WgXcQ", &output).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bestvideo[ext=mp4]"));
        assert!(message.contains("best[ext=mp4]:"));
    }
}
