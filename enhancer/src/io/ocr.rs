//! Screen capture and text recognition for the chat area.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use crate::io::automation::CaptureRegion;
use crate::io::process::run_command_with_timeout;

const CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);
const RECOGNIZE_TIMEOUT: Duration = Duration::from_secs(30);
const RECOGNIZER_OUTPUT_LIMIT: usize = 1024 * 1024;

/// Text recognition over a screen region.
pub trait OcrService {
    /// Capture `region` and recognize its text as an ordered fragment list.
    fn observe(&self, region: &CaptureRegion) -> Result<Vec<String>>;
}

/// Observe, degrading to an empty observation on failure.
///
/// A torn capture or recognizer hiccup must read as "nothing new yet"
/// rather than abort the round; the poll loop simply tries again.
pub fn observe_or_empty<O: OcrService>(ocr: &O, region: &CaptureRegion) -> Vec<String> {
    match ocr.observe(region) {
        Ok(fragments) => fragments,
        Err(err) => {
            warn!(err = %err, "observation failed, treating as empty");
            Vec::new()
        }
    }
}

/// [`OcrService`] that captures with `screencapture` and recognizes via a
/// configured external command.
///
/// The recognizer is invoked with the captured image path appended as its
/// last argument and must print one recognized fragment per stdout line.
#[derive(Debug, Clone)]
pub struct CaptureOcr {
    recognizer: Vec<String>,
    image_path: PathBuf,
}

impl CaptureOcr {
    pub fn new(recognizer: Vec<String>) -> Result<Self> {
        if recognizer.is_empty() || recognizer[0].trim().is_empty() {
            bail!("recognizer command must not be empty");
        }
        let image_path =
            std::env::temp_dir().join(format!("enhancer-{}.png", std::process::id()));
        Ok(Self {
            recognizer,
            image_path,
        })
    }

    fn capture(&self, region: &CaptureRegion) -> Result<()> {
        let mut cmd = Command::new("screencapture");
        cmd.arg("-x").arg(region_flag(region)).arg(&self.image_path);
        let output =
            run_command_with_timeout(cmd, None, CAPTURE_TIMEOUT, RECOGNIZER_OUTPUT_LIMIT)
                .context("run screencapture")?;
        if output.timed_out {
            bail!("screencapture timed out");
        }
        if !output.status.success() {
            bail!("screencapture failed: {}", output.stderr_text().trim());
        }
        Ok(())
    }

    fn recognize(&self) -> Result<Vec<String>> {
        let mut cmd = Command::new(&self.recognizer[0]);
        cmd.args(&self.recognizer[1..]).arg(&self.image_path);
        let output =
            run_command_with_timeout(cmd, None, RECOGNIZE_TIMEOUT, RECOGNIZER_OUTPUT_LIMIT)
                .with_context(|| format!("run recognizer {}", self.recognizer[0]))?;
        if output.timed_out {
            bail!("recognizer timed out");
        }
        if !output.status.success() {
            bail!("recognizer failed: {}", output.stderr_text().trim());
        }
        Ok(fragments_from_stdout(&output.stdout_text()))
    }
}

impl OcrService for CaptureOcr {
    fn observe(&self, region: &CaptureRegion) -> Result<Vec<String>> {
        self.capture(region)?;
        let fragments = self.recognize()?;
        debug!(count = fragments.len(), "observed chat fragments");
        Ok(fragments)
    }
}

fn region_flag(region: &CaptureRegion) -> String {
    format!(
        "-R{},{},{},{}",
        region.left, region.top, region.width, region.height
    )
}

/// One fragment per non-empty stdout line, whitespace-trimmed.
fn fragments_from_stdout(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}
