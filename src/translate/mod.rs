// Translation
//
// - RapidAPI: Google Translator v2 client
// - Batcher: sequential, paced translation of transcript segments

pub mod batcher;
pub mod rapidapi;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

pub use batcher::*;
pub use rapidapi::*;

use crate::config::TranslateConfig;
use crate::error::Result;

/// Translates one piece of text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationClient: Send + Sync {
    /// Translated text, or `None` when the response carried no usable translation
    async fn translate(&self, text: &str, target_code: &str) -> Result<Option<String>>;
}

/// Factory for creating translation clients
pub struct TranslationClientFactory;

impl TranslationClientFactory {
    /// The configured client, or `None` when no credential is available
    pub fn create_client(config: &TranslateConfig) -> Result<Option<Arc<dyn TranslationClient>>> {
        match config.api_key.as_deref() {
            Some(key) => Ok(Some(Arc::new(RapidApiTranslator::new(config, key)?))),
            None => {
                warn!("No translation API key configured; segments will keep their original text");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_factory_needs_credential() {
        let mut config = Config::default().translate;
        config.api_key = None;
        assert!(TranslationClientFactory::create_client(&config).unwrap().is_none());

        config.api_key = Some("secret".to_string());
        assert!(TranslationClientFactory::create_client(&config).unwrap().is_some());
    }
}
