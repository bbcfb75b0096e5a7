//! Solve pipeline: extract text → match → format.
//! Text queries run synchronously. Image queries run OCR on the blocking
//! pool, stream progress over a channel, and drop results superseded by a
//! newer image run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::{info, warn};

use crate::cancellation::RunGeneration;
use crate::dataset::Dataset;
use crate::format::{self, Emphasis, FormattedOutput};
use crate::matcher::{self, MatchResult, SequenceRatio, Similarity, ThresholdPolicy};
use crate::metrics::{MetricsRegistry, Stage};
use crate::ocr::{OcrEngine, OcrError, OcrProgress};

/// Query handle over one dataset snapshot.
pub struct Solver {
    dataset: Arc<Dataset>,
    similarity: Arc<dyn Similarity>,
    threshold: ThresholdPolicy,
    emphasis: Emphasis,
    engine: Option<Arc<dyn OcrEngine>>,
    runs: RunGeneration,
    metrics: Arc<MetricsRegistry>,
}

impl Solver {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self {
            dataset,
            similarity: Arc::new(SequenceRatio::default()),
            threshold: ThresholdPolicy::default(),
            emphasis: Emphasis::default(),
            engine: None,
            runs: RunGeneration::new(),
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    pub fn with_similarity(mut self, similarity: Arc<dyn Similarity>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn with_threshold(mut self, threshold: ThresholdPolicy) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_emphasis(mut self, emphasis: Emphasis) -> Self {
        self.emphasis = emphasis;
        self
    }

    pub fn with_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Best match for `text` after the threshold policy.
    pub fn lookup(&self, text: &str) -> Option<MatchResult> {
        let span = self.metrics.span(Stage::Match);
        let best = matcher::best_match(text, &self.dataset, self.similarity.as_ref());
        span.finish();
        self.threshold.apply(best)
    }

    /// Top `limit` entries for `text`, best first. Not thresholded.
    pub fn rank(&self, text: &str, limit: usize) -> Vec<MatchResult> {
        let mut ranked = matcher::rank(text, &self.dataset, self.similarity.as_ref());
        ranked.truncate(limit);
        ranked
    }

    /// Match and format typed or recognized text. Blank input short-circuits
    /// to the all-missing output.
    pub fn solve_text(&self, text: &str) -> FormattedOutput {
        let text = text.trim();
        if text.is_empty() {
            return FormattedOutput::blank();
        }
        let best = self.lookup(text);
        let span = self.metrics.span(Stage::Format);
        let out = format::format(text, best.as_ref(), self.emphasis);
        span.finish();
        out
    }

    /// OCR `image`, then [`solve_text`](Self::solve_text) the result.
    /// Returns `Ok(None)` when the run was cancelled or a newer image run
    /// started meanwhile; the OCR engine is told to stop in both cases.
    pub async fn solve_image(
        &self,
        image: &Path,
        progress: Sender<OcrProgress>,
    ) -> Result<Option<FormattedOutput>, OcrError> {
        let engine = self
            .engine
            .clone()
            .ok_or_else(|| OcrError::NotInstalled("no OCR engine configured".into()))?;

        let guard = self.runs.begin();
        let request_id = uuid::Uuid::new_v4().to_string();
        info!(%request_id, generation = guard.generation(), image = %image.display(), "image solve started");

        let solve_span = self.metrics.span(Stage::Solve);
        let ocr_span = self.metrics.span(Stage::Ocr);
        let path: PathBuf = image.to_path_buf();
        let cancel = guard.token().clone();
        // a dropped or finished solve stops its OCR run too
        let _stop_ocr = guard.token().clone().drop_guard();
        let ocr =
            tokio::task::spawn_blocking(move || engine.recognize(&path, &progress, &cancel));

        let recognized = tokio::select! {
            joined = ocr => joined
                .map_err(|e| OcrError::ProcessingFailed(format!("OCR task failed: {e}")))?,
            _ = guard.token().cancelled() => {
                info!(%request_id, "image solve superseded during OCR");
                return Ok(None);
            }
        };
        let text = match recognized {
            Ok(text) => text,
            Err(OcrError::Cancelled) => {
                info!(%request_id, "image solve cancelled during OCR");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        ocr_span.finish();

        if !guard.should_continue() {
            info!(%request_id, "image solve superseded");
            return Ok(None);
        }

        let out = self.solve_text(&text);
        solve_span.finish();
        if out == FormattedOutput::blank() {
            warn!(%request_id, "no text recognized");
        }
        Ok(Some(out))
    }

    /// Cancel the in-flight image run, if any, stopping its OCR engine.
    pub fn cancel_image(&self) {
        self.runs.cancel_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::QuestionRecord;
    use crate::format::MISSING_MESSAGE;

    fn solver() -> Solver {
        Solver::new(Arc::new(Dataset::from_entries([
            (
                "¿Es la Tierra redonda?",
                QuestionRecord {
                    answer: true,
                    explanation: Some("Confirmado por observación satelital".into()),
                },
            ),
            (
                "¿El agua hierve a 50 grados?",
                QuestionRecord { answer: false, explanation: None },
            ),
        ])))
        .with_emphasis(Emphasis::Plain)
    }

    #[test]
    fn text_is_trimmed_before_matching() {
        let out = solver().solve_text("  Es la tierra redonda \n");
        assert_eq!(out.text, "Es la tierra redonda");
        assert_eq!(out.matched, "¿Es la Tierra redonda?");
        assert_eq!(out.answer, "Verdadero");
    }

    #[test]
    fn blank_text_is_all_missing() {
        assert_eq!(solver().solve_text(" \n\t "), FormattedOutput::blank());
    }

    #[test]
    fn threshold_turns_weak_match_into_missing() {
        let s = solver().with_threshold(ThresholdPolicy::from_percent(90.0));
        let out = s.solve_text("xyz completamente distinto");
        assert_eq!(out.text, "xyz completamente distinto");
        assert_eq!(out.matched, MISSING_MESSAGE);

        let out = s.solve_text("¿Es la Tierra redonda?");
        assert_eq!(out.confidence, "100%");
    }

    #[test]
    fn rank_is_limited() {
        let s = solver();
        assert_eq!(s.rank("agua", 1).len(), 1);
        assert_eq!(s.rank("agua", 10).len(), 2);
        assert_eq!(s.rank("agua", 1)[0].question_text, "¿El agua hierve a 50 grados?");
    }

    #[test]
    fn stages_are_timed() {
        let s = solver();
        s.solve_text("Es la tierra redonda");
        let summary = s.metrics().summary();
        assert_eq!(summary["t_match_done"].count, 1);
        assert_eq!(summary["t_format_done"].count, 1);
    }

    #[tokio::test]
    async fn image_without_engine_fails() {
        let (tx, _rx) = crossbeam_channel::unbounded();
        let err = solver()
            .solve_image(Path::new("question.png"), tx)
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::NotInstalled(_)));
    }
}
