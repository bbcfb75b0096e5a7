//! Matching engine: scores every dataset entry against an input string and
//! picks the closest one. Pure and read-only over the dataset, so queries
//! can run concurrently against a shared `Arc<Dataset>`.

pub mod sequence;

use serde::Serialize;
use tracing::debug;

use crate::dataset::Dataset;

pub use sequence::{SequenceMatcher, SequenceRatio};

/// Normalized text similarity in [0, 1]. 1.0 = identical, 0.0 = nothing shared.
pub trait Similarity: Send + Sync {
    fn ratio(&self, a: &str, b: &str) -> f64;
}

/// A scored dataset entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub question_text: String,
    pub confidence: f64,
    pub answer: bool,
    pub explanation: Option<String>,
}

/// Score every entry and sort by descending confidence.
/// The sort is stable: equal scores keep dataset order.
pub fn rank(input: &str, dataset: &Dataset, similarity: &dyn Similarity) -> Vec<MatchResult> {
    let mut scored: Vec<MatchResult> = dataset
        .iter()
        .map(|(question, record)| MatchResult {
            question_text: question.to_string(),
            confidence: unit_score(similarity.ratio(question, input)),
            answer: record.answer,
            explanation: record.explanation.clone(),
        })
        .collect();

    scored.sort_by(|x, y| y.confidence.total_cmp(&x.confidence));
    scored
}

/// Pin a similarity score into [0, 1]. NaN and negative zero become 0.0 so
/// the total order used for ranking stays consistent with `==`.
fn unit_score(ratio: f64) -> f64 {
    if ratio.is_nan() || ratio <= 0.0 {
        0.0
    } else {
        ratio.min(1.0)
    }
}

/// Closest entry to `input`, or `None` when the dataset is empty.
pub fn best_match(
    input: &str,
    dataset: &Dataset,
    similarity: &dyn Similarity,
) -> Option<MatchResult> {
    let best = rank(input, dataset, similarity).into_iter().next();
    if let Some(ref m) = best {
        debug!(confidence = m.confidence, question = %m.question_text, "best match");
    }
    best
}

/// Optional minimum-confidence filter applied after matching.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThresholdPolicy {
    /// Ratio in [0, 1]; `None` accepts everything.
    pub min_confidence: Option<f64>,
}

impl ThresholdPolicy {
    pub fn new(min_confidence: Option<f64>) -> Self {
        Self { min_confidence }
    }

    /// Build from a percentage (0–100) as shown to users.
    pub fn from_percent(percent: f64) -> Self {
        Self {
            min_confidence: Some((percent / 100.0).clamp(0.0, 1.0)),
        }
    }

    pub fn accepts(&self, m: &MatchResult) -> bool {
        match self.min_confidence {
            Some(min) => m.confidence >= min,
            None => true,
        }
    }

    /// Drop a match scoring strictly below the threshold.
    pub fn apply(&self, m: Option<MatchResult>) -> Option<MatchResult> {
        m.filter(|m| self.accepts(m))
    }
}
