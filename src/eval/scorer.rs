//! Human-agreement accuracy for a single question.
//!
//! Each reference answer is left out in turn; the prediction earns
//! `min(matches / threshold, 1)` against the remaining references, and the
//! final score is the mean over all leave-one-out rounds.

use super::normalize::normalize;
use crate::config::EvalConfig;

/// Partial-credit scorer against a set of human reference answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgreementScorer {
    /// Agreeing references needed for full credit in one round.
    pub agreement_threshold: usize,
    /// Reference count every question is expected to carry.
    ///
    /// Other counts are still scored over the references present, so the
    /// implicit averaging divisor follows the actual count.
    pub expected_references: usize,
}

impl Default for AgreementScorer {
    fn default() -> Self {
        Self {
            agreement_threshold: 3,
            expected_references: 10,
        }
    }
}

impl AgreementScorer {
    pub fn from_config(config: &EvalConfig) -> Self {
        Self {
            agreement_threshold: config.agreement_threshold,
            expected_references: config.expected_references,
        }
    }

    /// Score a raw prediction against raw references, normalizing both.
    pub fn score<S: AsRef<str>>(&self, prediction: &str, references: &[S]) -> f64 {
        let prediction = normalize(prediction);
        let references: Vec<String> = references.iter().map(|r| normalize(r.as_ref())).collect();
        self.score_normalized(&prediction, &references)
    }

    /// Score an already normalized prediction against normalized references.
    ///
    /// Returns a value in `[0, 1]`. An empty reference set scores 0.
    pub fn score_normalized<S: AsRef<str>>(&self, prediction: &str, references: &[S]) -> f64 {
        if references.is_empty() {
            return 0.0;
        }

        let threshold = self.agreement_threshold.max(1) as f64;
        let total_matches = references
            .iter()
            .filter(|r| r.as_ref() == prediction)
            .count();

        let sum: f64 = references
            .iter()
            .map(|left_out| {
                let matches = if left_out.as_ref() == prediction {
                    total_matches - 1
                } else {
                    total_matches
                };
                (matches as f64 / threshold).min(1.0)
            })
            .sum();

        sum / references.len() as f64
    }

    /// Whether a reference set deviates from the expected size.
    pub fn is_irregular(&self, reference_count: usize) -> bool {
        reference_count != self.expected_references
    }
}
