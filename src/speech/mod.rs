// Speech synthesis
//
// - Engines: command-line text-to-speech backends
// - Synthesizer: per-segment synthesis with silence substitution

pub mod engines;
pub mod synthesizer;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub use engines::*;
pub use synthesizer::*;

use crate::config::{SpeechBackend, SpeechConfig};
use crate::error::Result;

/// Text-to-speech backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// File extension of the audio this engine writes
    fn extension(&self) -> &'static str;

    /// Speak `text` in `language_code` into `output_path`
    async fn synthesize(&self, text: &str, language_code: &str, output_path: &Path) -> Result<()>;

    /// Check that the backend can be started
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating speech engines
pub struct SpeechEngineFactory;

impl SpeechEngineFactory {
    /// Create the engine selected by the configuration
    pub fn create_engine(config: &SpeechConfig) -> Arc<dyn SpeechEngine> {
        let timeout = Duration::from_secs(config.timeout_secs);
        match config.backend {
            SpeechBackend::Gtts => Arc::new(GttsEngine::new(&config.binary_path, timeout)),
            SpeechBackend::Espeak => Arc::new(EspeakEngine::new(&config.binary_path, timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_factory_follows_backend() {
        let mut config = Config::default().speech;
        assert_eq!(SpeechEngineFactory::create_engine(&config).extension(), "mp3");

        config.backend = SpeechBackend::Espeak;
        config.binary_path = "espeak-ng".to_string();
        assert_eq!(SpeechEngineFactory::create_engine(&config).extension(), "wav");
    }
}
