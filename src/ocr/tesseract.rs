//! Tesseract CLI engine.
//! Runs `tesseract <image> stdout -l <lang>` as a child process and returns
//! its stdout. The CLI reports no progress of its own, so stage boundaries
//! are emitted as progress events around the process lifecycle.
//! A cancelled run kills the child.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{OcrEngine, OcrError, OcrProgress, STATUS_RECOGNIZING};

/// How often a running child is checked for exit or cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub struct TesseractEngine {
    binary: PathBuf,
    language: String,
    available: AtomicBool,
}

/// Running tesseract process. Killed on drop if still alive.
struct TesseractProcess {
    child: Child,
}

impl TesseractProcess {
    /// Block until exit, killing the child as soon as `cancel` fires.
    fn wait(&mut self, cancel: &CancellationToken) -> Result<std::process::ExitStatus, OcrError> {
        loop {
            if cancel.is_cancelled() {
                self.kill();
                return Err(OcrError::Cancelled);
            }
            match self.child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(OcrError::ProcessingFailed(format!("wait: {e}"))),
            }
        }
    }

    fn kill(&mut self) {
        if matches!(self.child.try_wait(), Ok(None)) {
            let _ = self.child.kill();
            let _ = self.child.wait();
            debug!(pid = self.child.id(), "tesseract process killed");
        }
    }
}

impl Drop for TesseractProcess {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Drain a child pipe on its own thread so a full pipe never stalls the child.
fn drain<R: Read + Send + 'static>(name: &str, mut pipe: R) -> Result<JoinHandle<Vec<u8>>, OcrError> {
    std::thread::Builder::new()
        .name(format!("tesseract-{name}"))
        .spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
        .map_err(|e| OcrError::ProcessingFailed(format!("spawn {name} reader: {e}")))
}

fn collect(reader: JoinHandle<Vec<u8>>) -> Result<Vec<u8>, OcrError> {
    reader
        .join()
        .map_err(|_| OcrError::ProcessingFailed("pipe reader panicked".into()))
}

impl TesseractEngine {
    /// `binary`: tesseract executable (e.g. "tesseract" on PATH).
    /// `language`: traineddata code, e.g. "spa".
    pub fn new(binary: impl Into<PathBuf>, language: &str) -> Self {
        let engine = Self {
            binary: binary.into(),
            language: language.to_string(),
            available: AtomicBool::new(false),
        };
        engine.probe();
        engine
    }

    /// Probe for the binary once (`tesseract --version`).
    fn probe(&self) {
        let ok = Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        if ok {
            info!(binary = %self.binary.display(), lang = %self.language, "tesseract available");
        } else {
            warn!(binary = %self.binary.display(), "tesseract not found, image input disabled");
        }
        self.available.store(ok, Ordering::SeqCst);
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    fn spawn(&self, image: &Path) -> Result<TesseractProcess, OcrError> {
        let child = Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    self.available.store(false, Ordering::SeqCst);
                    OcrError::NotInstalled(self.binary.display().to_string())
                } else {
                    OcrError::ProcessingFailed(format!("spawn: {e}"))
                }
            })?;
        Ok(TesseractProcess { child })
    }
}

fn emit(progress: &Sender<OcrProgress>, status: &str, value: f64) {
    // receiver may have gone away; recognition continues regardless
    let _ = progress.send(OcrProgress::new(status, value));
}

impl OcrEngine for TesseractEngine {
    fn recognize(
        &self,
        image: &Path,
        progress: &Sender<OcrProgress>,
        cancel: &CancellationToken,
    ) -> Result<String, OcrError> {
        if !image.is_file() {
            return Err(OcrError::ImageNotFound(image.display().to_string()));
        }
        if cancel.is_cancelled() {
            return Err(OcrError::Cancelled);
        }

        emit(progress, "initializing tesseract", 0.0);
        let start = Instant::now();

        let mut process = self.spawn(image)?;
        let stdout = process
            .child
            .stdout
            .take()
            .ok_or_else(|| OcrError::ProcessingFailed("failed to get tesseract stdout".into()))?;
        let stderr = process
            .child
            .stderr
            .take()
            .ok_or_else(|| OcrError::ProcessingFailed("failed to get tesseract stderr".into()))?;
        let stdout = drain("stdout", stdout)?;
        let stderr = drain("stderr", stderr)?;

        emit(progress, "initialized tesseract", 1.0);
        emit(progress, STATUS_RECOGNIZING, 0.0);

        let status = match process.wait(cancel) {
            Ok(status) => status,
            Err(OcrError::Cancelled) => {
                info!(elapsed_ms = start.elapsed().as_millis() as u64, "tesseract run cancelled");
                return Err(OcrError::Cancelled);
            }
            Err(e) => return Err(e),
        };

        let stdout = collect(stdout)?;
        let stderr = collect(stderr)?;
        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(OcrError::ProcessingFailed(format!(
                "exit {}: {}",
                status,
                stderr.trim()
            )));
        }

        emit(progress, STATUS_RECOGNIZING, 1.0);

        let text = String::from_utf8_lossy(&stdout).into_owned();
        debug!(
            chars = text.chars().count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "tesseract finished"
        );
        Ok(text)
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
