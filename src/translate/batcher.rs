use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::TranslateConfig;
use crate::language::translation_code;
use crate::outcome::{Degradation, StageOutcome};
use crate::pacing::{jitter, RequestPacer, Sleeper};
use crate::segment::{is_speakable, TranscriptSegment, TranslatedSegment};
use super::TranslationClient;

/// Translates transcript segments in sequential, paced batches.
///
/// A segment whose translation fails keeps its original text; the batch never fails.
pub struct TranslationBatcher {
    client: Option<Arc<dyn TranslationClient>>,
    config: TranslateConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl TranslationBatcher {
    pub fn new(
        client: Option<Arc<dyn TranslationClient>>,
        config: TranslateConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self { client, config, sleeper }
    }

    /// One output per input segment, in the same order
    pub async fn translate(
        &self,
        segments: &[TranscriptSegment],
        target_language: &str,
    ) -> StageOutcome<Vec<TranslatedSegment>> {
        let Some(client) = &self.client else {
            let translated: Vec<TranslatedSegment> =
                segments.iter().cloned().map(TranslatedSegment::verbatim).collect();
            let untranslated = translation_error_count(&translated);
            warn!("Translation unavailable; keeping original text for {} segments", untranslated);
            return StageOutcome::from_parts(translated, vec![Degradation::TranslationDegraded {
                untranslated,
                reason: "no translation credential configured".to_string(),
            }]);
        };

        let target_code = translation_code(target_language);
        let batch_size = self.config.batch_size.max(1);
        let batch_count = segments.len().div_ceil(batch_size);
        info!("Translating {} segments to {} in {} batches", segments.len(), target_code, batch_count);

        let mut pacer = RequestPacer::new(self.sleeper.clone());
        let mut translated = Vec::with_capacity(segments.len());
        let mut last_error: Option<String> = None;

        for (batch_index, batch) in segments.chunks(batch_size).enumerate() {
            debug!("Translation batch {}/{}", batch_index + 1, batch_count);

            for segment in batch {
                if !is_speakable(&segment.text) {
                    translated.push(TranslatedSegment::verbatim(segment.clone()));
                    continue;
                }

                pacer.ready().await;
                match client.translate(segment.text.trim(), &target_code).await {
                    Ok(text) => {
                        let translated_text = text.unwrap_or_else(|| segment.text.clone());
                        translated.push(TranslatedSegment { segment: segment.clone(), translated_text });
                        pacer.defer(Duration::from_millis(self.config.item_delay_ms));
                    }
                    Err(e) => {
                        warn!("Translation failed for segment at {:.2}s: {}", segment.start_secs, e);
                        last_error = Some(e.to_string());
                        translated.push(TranslatedSegment::verbatim(segment.clone()));
                        pacer.defer(Duration::from_millis(self.config.error_delay_ms));
                    }
                }
            }

            if batch_index + 1 < batch_count {
                pacer.defer(jitter(self.config.batch_delay_min_ms, self.config.batch_delay_max_ms));
            }
        }

        let untranslated = translation_error_count(&translated);
        info!("Translation finished: {} of {} segments kept original text", untranslated, translated.len());

        let degradations = match last_error {
            Some(reason) => vec![Degradation::TranslationDegraded { untranslated, reason }],
            None => Vec::new(),
        };
        StageOutcome::from_parts(translated, degradations)
    }
}

/// Segments that needed translation but still carry their original text
pub fn translation_error_count(segments: &[TranslatedSegment]) -> usize {
    segments.iter().filter(|s| s.is_untranslated()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::DubError;
    use crate::pacing::testing::RecordingSleeper;
    use crate::translate::MockTranslationClient;
    use mockall::predicate::*;

    fn config() -> TranslateConfig {
        let mut config = Config::default().translate;
        config.batch_size = 2;
        config.batch_delay_min_ms = 3000;
        config.batch_delay_max_ms = 3000;
        config
    }

    fn segment(text: &str, start_secs: f64) -> TranscriptSegment {
        TranscriptSegment { text: text.to_string(), start_secs, duration_secs: 1.0 }
    }

    fn unwrap_value(outcome: StageOutcome<Vec<TranslatedSegment>>) -> (Vec<TranslatedSegment>, Vec<Degradation>) {
        let mut degradations = Vec::new();
        let value = outcome.absorb(&mut degradations).unwrap();
        (value, degradations)
    }

    #[tokio::test]
    async fn test_pacing_schedule_has_no_trailing_wait() {
        let mut client = MockTranslationClient::new();
        client
            .expect_translate()
            .with(always(), eq("es"))
            .times(3)
            .returning(|text, _| Ok(Some(format!("es:{}", text))));

        let sleeper = RecordingSleeper::new();
        let batcher = TranslationBatcher::new(Some(Arc::new(client)), config(), sleeper.clone());
        let segments = vec![segment("one", 0.0), segment("two", 1.0), segment("three", 2.0)];

        let (translated, degradations) = unwrap_value(batcher.translate(&segments, "Spanish").await);
        assert!(degradations.is_empty());
        assert_eq!(translated[2].translated_text, "es:three");
        assert_eq!(
            sleeper.slept(),
            vec![Duration::from_millis(200), Duration::from_millis(3200)]
        );
    }

    #[tokio::test]
    async fn test_short_text_never_reaches_client() {
        let mut client = MockTranslationClient::new();
        client
            .expect_translate()
            .with(eq("hello"), always())
            .times(1)
            .returning(|_, _| Ok(Some("hola".to_string())));

        let batcher = TranslationBatcher::new(Some(Arc::new(client)), config(), RecordingSleeper::new());
        let segments = vec![segment(" a ", 0.0), segment("  hello ", 1.0), segment("", 2.0)];

        let (translated, _) = unwrap_value(batcher.translate(&segments, "spanish").await);
        assert_eq!(translated.len(), 3);
        assert_eq!(translated[0].translated_text, " a ");
        assert_eq!(translated[1].translated_text, "hola");
        assert_eq!(translation_error_count(&translated), 0);
    }

    #[tokio::test]
    async fn test_rate_limited_everywhere_keeps_originals() {
        let mut client = MockTranslationClient::new();
        client
            .expect_translate()
            .times(3)
            .returning(|_, _| Err(DubError::Translation("Translation rate limit exceeded".to_string())));

        let sleeper = RecordingSleeper::new();
        let batcher = TranslationBatcher::new(Some(Arc::new(client)), config(), sleeper.clone());
        let segments = vec![segment("one", 0.0), segment("x", 0.5), segment("two", 1.0), segment("three", 2.0)];

        let outcome = batcher.translate(&segments, "spanish").await;
        assert!(outcome.is_degraded());
        let (translated, degradations) = unwrap_value(outcome);

        assert_eq!(translation_error_count(&translated), 3);
        assert!(translated.iter().all(|s| s.translated_text == s.segment.text));
        assert!(matches!(
            &degradations[0],
            Degradation::TranslationDegraded { untranslated: 3, reason } if reason.contains("rate limit")
        ));
        assert_eq!(
            sleeper.slept(),
            vec![Duration::from_millis(4000), Duration::from_millis(1000)]
        );
    }

    #[tokio::test]
    async fn test_empty_response_falls_back_to_original() {
        let mut client = MockTranslationClient::new();
        client.expect_translate().returning(|_, _| Ok(None));

        let batcher = TranslationBatcher::new(Some(Arc::new(client)), config(), RecordingSleeper::new());
        let (translated, degradations) =
            unwrap_value(batcher.translate(&[segment("hello", 0.0)], "german").await);
        assert_eq!(translated[0].translated_text, "hello");
        assert_eq!(translation_error_count(&translated), 1);
        assert!(degradations.is_empty());
    }

    #[tokio::test]
    async fn test_missing_client_degrades_whole_job() {
        let sleeper = RecordingSleeper::new();
        let batcher = TranslationBatcher::new(None, config(), sleeper.clone());
        let segments = vec![segment("one", 0.0), segment("?", 1.0)];

        let (translated, degradations) = unwrap_value(batcher.translate(&segments, "french").await);
        assert_eq!(translated.len(), 2);
        assert_eq!(
            degradations,
            vec![Degradation::TranslationDegraded {
                untranslated: 1,
                reason: "no translation credential configured".to_string(),
            }]
        );
        assert!(sleeper.slept().is_empty());
    }
}
