//! quizmatch: answers a typed or OCR-extracted question by finding the most
//! similar entry in a question/answer dataset.
//!
//! Flow: input text (typed, or recognized by an [`ocr::OcrEngine`]) →
//! [`matcher::best_match`] over a shared [`dataset::Dataset`] →
//! [`format::format`] into display strings.

pub mod cancellation;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod format;
pub mod help;
pub mod matcher;
pub mod metrics;
pub mod ocr;
pub mod pipeline;

pub use dataset::{Dataset, QuestionRecord};
pub use format::{format, Emphasis, FormattedOutput, MISSING_MESSAGE};
pub use matcher::{best_match, rank, MatchResult, SequenceRatio, Similarity, ThresholdPolicy};
pub use ocr::translate_status;
pub use pipeline::Solver;
