use serde::{Deserialize, Serialize};

use crate::error::{DubError, Result};

/// A stage substituted a lower-quality but valid result instead of failing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// Segments that kept their original text
    TranslationDegraded { untranslated: usize, reason: String },
    /// Segments that became silence or were dropped after synthesis failed
    SynthesisDegraded { silenced: usize, dropped: usize },
    /// Timing gaps left unfilled because silence generation failed
    GapFillerSkipped { count: usize },
    /// Concatenation failed and the track was replaced by silence
    AssemblyDegraded { reason: String },
}

/// Result of one pipeline stage
#[derive(Debug)]
pub enum StageOutcome<T> {
    Success(T),
    Degraded(T, Vec<Degradation>),
    Fatal(DubError),
}

impl<T> StageOutcome<T> {
    /// Success when `degradations` is empty, otherwise Degraded
    pub fn from_parts(value: T, degradations: Vec<Degradation>) -> Self {
        if degradations.is_empty() {
            Self::Success(value)
        } else {
            Self::Degraded(value, degradations)
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(..))
    }

    /// Move degradations into `report` and yield the value, or the fatal error
    pub fn absorb(self, report: &mut Vec<Degradation>) -> Result<T> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Degraded(value, degradations) => {
                report.extend(degradations);
                Ok(value)
            }
            Self::Fatal(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_collects_degradations() {
        let mut report = Vec::new();

        let value = StageOutcome::from_parts(1, Vec::new()).absorb(&mut report).unwrap();
        assert_eq!(value, 1);
        assert!(report.is_empty());

        let outcome = StageOutcome::from_parts(2, vec![Degradation::GapFillerSkipped { count: 3 }]);
        assert!(outcome.is_degraded());
        assert_eq!(outcome.absorb(&mut report).unwrap(), 2);
        assert_eq!(report, vec![Degradation::GapFillerSkipped { count: 3 }]);

        let fatal: StageOutcome<i32> = StageOutcome::Fatal(DubError::AlignmentFailed);
        assert!(matches!(fatal.absorb(&mut report), Err(DubError::AlignmentFailed)));
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_degradation_serializes_with_kind_tag() {
        let json = serde_json::to_string(&Degradation::AssemblyDegraded {
            reason: "concat failed".to_string(),
        })
        .unwrap();
        assert!(json.contains("\"kind\":\"assembly_degraded\""));
    }
}
