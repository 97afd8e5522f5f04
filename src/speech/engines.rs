use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::{DubError, Result};
use crate::media::MediaCommand;
use super::SpeechEngine;

fn synthesis_error(e: DubError) -> DubError {
    match e {
        DubError::Media(message) => DubError::Synthesis(message),
        other => other,
    }
}

/// Google Translate TTS through `gtts-cli`; writes MP3
pub struct GttsEngine {
    binary_path: String,
    timeout: Duration,
}

impl GttsEngine {
    pub fn new<S: Into<String>>(binary_path: S, timeout: Duration) -> Self {
        Self { binary_path: binary_path.into(), timeout }
    }

    fn command(&self, text: &str, language_code: &str, output_path: &Path) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "gTTS synthesis")
            .with_timeout(self.timeout)
            .args(["--lang", language_code])
            .arg("--output")
            .output(output_path)
            // text may start with a dash
            .arg("--")
            .arg(text)
    }
}

#[async_trait]
impl SpeechEngine for GttsEngine {
    fn extension(&self) -> &'static str {
        "mp3"
    }

    async fn synthesize(&self, text: &str, language_code: &str, output_path: &Path) -> Result<()> {
        debug!("gTTS [{}]: {}", language_code, text);
        self.command(text, language_code, output_path)
            .execute()
            .await
            .map_err(synthesis_error)
    }

    async fn check_availability(&self) -> Result<()> {
        MediaCommand::new(&self.binary_path, "gTTS version check")
            .with_timeout(self.timeout)
            .arg("--version")
            .execute()
            .await
            .map_err(synthesis_error)
    }
}

/// Local synthesis through `espeak-ng`; writes WAV
pub struct EspeakEngine {
    binary_path: String,
    timeout: Duration,
}

impl EspeakEngine {
    pub fn new<S: Into<String>>(binary_path: S, timeout: Duration) -> Self {
        Self { binary_path: binary_path.into(), timeout }
    }

    fn command(&self, text: &str, language_code: &str, output_path: &Path) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "espeak-ng synthesis")
            .with_timeout(self.timeout)
            .args(["-v", language_code])
            .arg("-w")
            .output(output_path)
            .arg("--")
            .arg(text)
    }
}

#[async_trait]
impl SpeechEngine for EspeakEngine {
    fn extension(&self) -> &'static str {
        "wav"
    }

    async fn synthesize(&self, text: &str, language_code: &str, output_path: &Path) -> Result<()> {
        debug!("espeak-ng [{}]: {}", language_code, text);
        self.command(text, language_code, output_path)
            .execute()
            .await
            .map_err(synthesis_error)
    }

    async fn check_availability(&self) -> Result<()> {
        MediaCommand::new(&self.binary_path, "espeak-ng version check")
            .with_timeout(self.timeout)
            .arg("--version")
            .execute()
            .await
            .map_err(synthesis_error)
    }
}
