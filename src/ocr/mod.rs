//! OCR collaboration: engine interface, progress events and their display text.
//! Recognition itself happens in an external engine; this module only
//! translates its status strings and hands the final text to the matcher.

pub mod tesseract;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

pub use tesseract::TesseractEngine;

/// Engine status → display text. Lookup is exact.
const STATUS_TRANSLATIONS: &[(&str, &str)] = &[
    ("loading tesseract core", "Cargando núcleo de Tesseract"),
    ("initializing tesseract", "Inicializando Tesseract"),
    ("initialized tesseract", "Tesseract inicializado"),
    ("loading language traineddata", "Cargando datos de entrenamiento de idioma"),
    (
        "loading language traineddata (from cache)",
        "Cargando datos de entrenamiento de idioma (desde caché)",
    ),
    ("loaded language traineddata", "Datos de entrenamiento de idioma cargados"),
    ("initializing api", "Inicializando API"),
    ("initialized api", "API inicializada"),
    ("recognizing text", "Reconociendo texto"),
];

pub const STATUS_RECOGNIZING: &str = "recognizing text";
pub const RECOGNITION_COMPLETE: &str = "Reconocimiento de texto completado";

/// Display text for an engine status. Unknown statuses pass through unchanged.
pub fn translate_status(raw: &str) -> &str {
    STATUS_TRANSLATIONS
        .iter()
        .find(|(key, _)| *key == raw)
        .map(|(_, label)| *label)
        .unwrap_or(raw)
}

/// One progress event from a recognition run. `progress` is in [0, 1]
/// and does not decrease within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrProgress {
    pub status: String,
    pub progress: f64,
}

impl OcrProgress {
    pub fn new(status: &str, progress: f64) -> Self {
        Self {
            status: status.to_string(),
            progress: progress.clamp(0.0, 1.0),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == STATUS_RECOGNIZING && self.progress >= 1.0
    }
}

/// Progress event rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressView {
    pub status: String,
    /// ` (xx.xx%)`, empty once recognition has finished.
    pub percent: String,
}

impl From<&OcrProgress> for ProgressView {
    fn from(event: &OcrProgress) -> Self {
        if event.is_complete() {
            return Self {
                status: RECOGNITION_COMPLETE.to_string(),
                percent: String::new(),
            };
        }
        let rounded = (event.progress * 10000.0).round() / 100.0;
        Self {
            status: translate_status(&event.status).to_string(),
            percent: format!(" ({rounded}%)"),
        }
    }
}

/// Text recognition engine (platform adapter).
pub trait OcrEngine: Send + Sync {
    /// Recognize the text in `image`, reporting progress on `progress`.
    /// A disconnected progress receiver must not fail the run. Once `cancel`
    /// fires the engine stops its work, sends no further progress and
    /// returns [`OcrError::Cancelled`].
    fn recognize(
        &self,
        image: &Path,
        progress: &crossbeam_channel::Sender<OcrProgress>,
        cancel: &CancellationToken,
    ) -> Result<String, OcrError>;

    fn is_available(&self) -> bool;
}

#[derive(Debug)]
pub enum OcrError {
    NotInstalled(String),
    ImageNotFound(String),
    ProcessingFailed(String),
    Cancelled,
}

impl std::fmt::Display for OcrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcrError::NotInstalled(bin) => write!(f, "OCR engine not installed: {bin}"),
            OcrError::ImageNotFound(path) => write!(f, "image not found: {path}"),
            OcrError::ProcessingFailed(msg) => write!(f, "OCR processing failed: {msg}"),
            OcrError::Cancelled => write!(f, "OCR cancelled"),
        }
    }
}

impl std::error::Error for OcrError {}
