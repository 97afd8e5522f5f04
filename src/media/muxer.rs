use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::error::{DubError, Result};
use crate::jobs::{DUBBED_VIDEO_FILE, VIDEO_FILE};
use super::{acquire_video, MediaProcessorTrait, VideoDownloader};

/// Produces the final dubbed video from the downloaded stream and the assembled track
pub struct MediaMuxer {
    downloaders: Vec<Box<dyn VideoDownloader>>,
    media: Arc<dyn MediaProcessorTrait>,
}

impl MediaMuxer {
    pub fn new(downloaders: Vec<Box<dyn VideoDownloader>>, media: Arc<dyn MediaProcessorTrait>) -> Self {
        Self { downloaders, media }
    }

    /// Download the video stream into `work_dir` and merge `audio_path` onto it.
    /// Returns the path of `dubbed_video.mp4`.
    pub async fn produce(&self, video_id: &str, audio_path: &Path, work_dir: &Path) -> Result<PathBuf> {
        let video_path = work_dir.join(VIDEO_FILE);
        let used = acquire_video(&self.downloaders, video_id, &video_path).await?;
        info!("Video stream acquired with {}", used);

        let output_path = work_dir.join(DUBBED_VIDEO_FILE);
        // status polling keys on the final name, so it must only appear once complete
        let partial_path = work_dir.join(format!("partial_{}", DUBBED_VIDEO_FILE));

        self.media
            .merge_video_audio(&video_path, audio_path, &partial_path)
            .await
            .map_err(|e| DubError::MuxFailed(e.to_string()))?;

        if !partial_path.exists() {
            return Err(DubError::MuxFailed("merged video was not created".to_string()));
        }
        tokio::fs::rename(&partial_path, &output_path)
            .await
            .map_err(|e| DubError::MuxFailed(format!("Failed to finalize output: {}", e)))?;

        info!("Dubbed video written to {}", output_path.display());
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::testing::FakeMedia;
    #[cfg(unix)]
    use crate::media::testing::picky_downloader;
    use crate::media::{CliDownloader, MockVideoDownloader};
    use std::time::Duration;

    fn downloader(name: &str, succeed: bool) -> Box<dyn VideoDownloader> {
        let mut mock = MockVideoDownloader::new();
        mock.expect_name().return_const(name.to_string());
        mock.expect_download().returning(move |_, output| {
            if succeed {
                std::fs::write(output, b"video")?;
                Ok(())
            } else {
                Err(DubError::Media("requested format is not available".to_string()))
            }
        });
        Box::new(mock)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_primary_format_failure_still_merges() {
        let dir = assert_fs::TempDir::new().unwrap();
        let tool = picky_downloader(dir.path());
        let chain: Vec<Box<dyn VideoDownloader>> = vec![Box::new(CliDownloader::new(
            tool.to_string_lossy(),
            vec!["bad".to_string(), "good".to_string()],
            Duration::from_secs(10),
        ))];
        let media = Arc::new(FakeMedia::default());
        let muxer = MediaMuxer::new(chain, media.clone());

        let audio = dir.path().join("final_audio.wav");
        std::fs::write(&audio, b"audio").unwrap();

        let output = muxer.produce("dQw4w9WgXcQ", &audio, dir.path()).await.unwrap();
        assert_eq!(output, dir.path().join(DUBBED_VIDEO_FILE));
        assert!(output.exists());
        assert_eq!(std::fs::read_to_string(dir.path().join(VIDEO_FILE)).unwrap(), "video");
        assert_eq!(media.merged.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_secondary_downloader_success_produces_output() {
        let dir = assert_fs::TempDir::new().unwrap();
        let media = Arc::new(FakeMedia::default());
        let muxer = MediaMuxer::new(
            vec![downloader("yt-dlp", false), downloader("youtube-dl", true)],
            media.clone(),
        );

        let audio = dir.path().join("final_audio.wav");
        std::fs::write(&audio, b"audio").unwrap();

        let output = muxer.produce("dQw4w9WgXcQ", &audio, dir.path()).await.unwrap();
        assert_eq!(output, dir.path().join(DUBBED_VIDEO_FILE));
        assert!(output.exists());
        assert!(!dir.path().join(format!("partial_{}", DUBBED_VIDEO_FILE)).exists());

        let merged = media.merged.lock().unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].0, dir.path().join(VIDEO_FILE));
        assert_eq!(merged[0].1, audio);
    }

    #[tokio::test]
    async fn test_merge_failure_is_mux_failed_without_output() {
        let dir = assert_fs::TempDir::new().unwrap();
        let media = Arc::new(FakeMedia { fail_merge: true, ..Default::default() });
        let muxer = MediaMuxer::new(vec![downloader("yt-dlp", true)], media);

        let err = muxer
            .produce("dQw4w9WgXcQ", &dir.path().join("final_audio.wav"), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, DubError::MuxFailed(_)));
        assert!(!dir.path().join(DUBBED_VIDEO_FILE).exists());
    }

    #[tokio::test]
    async fn test_no_downloader_succeeds() {
        let dir = assert_fs::TempDir::new().unwrap();
        let muxer = MediaMuxer::new(
            vec![downloader("yt-dlp", false), downloader("youtube-dl", false)],
            Arc::new(FakeMedia::default()),
        );

        let err = muxer
            .produce("dQw4w9WgXcQ", &dir.path().join("final_audio.wav"), dir.path())
            .await
            .unwrap_err();
        match err {
            DubError::VideoAcquisitionFailed(message) => {
                assert!(message.contains("yt-dlp"));
                assert!(message.contains("youtube-dl"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
