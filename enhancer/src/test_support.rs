//! Scripted collaborators and helpers for tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use anyhow::{Result, anyhow};

use crate::io::automation::{AutomationBackend, CaptureRegion, WindowBounds, WindowHandle};
use crate::io::ocr::OcrService;
use crate::io::stats_store::StatsStore;

/// Observation frame from string literals.
pub fn frame(fragments: &[&str]) -> Vec<String> {
    fragments.iter().map(ToString::to_string).collect()
}

/// Stats store in a fresh temp directory; keep the guard alive for the test.
pub fn test_store() -> (StatsStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = StatsStore::new(dir.path().join("enhance_stats.json"));
    (store, dir)
}

fn default_bounds() -> WindowBounds {
    WindowBounds {
        left: 100,
        top: 100,
        width: 800,
        height: 600,
    }
}

/// Automation double: always finds the window, reports scripted bounds,
/// records sent text instead of touching a desktop.
pub struct ScriptedBackend {
    bounds_script: RefCell<VecDeque<Option<WindowBounds>>>,
    sent: RefCell<Vec<String>>,
}

impl ScriptedBackend {
    /// Window always present with a fixed frame.
    pub fn new() -> Self {
        Self::with_bounds(Vec::new())
    }

    /// Bounds replies consumed in order; once exhausted, the default frame
    /// keeps being reported.
    pub fn with_bounds(script: Vec<Option<WindowBounds>>) -> Self {
        Self {
            bounds_script: RefCell::new(script.into()),
            sent: RefCell::new(Vec::new()),
        }
    }

    /// Text sent so far, in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.borrow().clone()
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomationBackend for ScriptedBackend {
    fn locate(&self, room: &str) -> Result<Option<WindowHandle>> {
        Ok(Some(WindowHandle::new(room)))
    }

    fn activate(&self, _window: &WindowHandle) -> Result<()> {
        Ok(())
    }

    fn bounds(&self, _window: &WindowHandle) -> Result<Option<WindowBounds>> {
        let next = self.bounds_script.borrow_mut().pop_front();
        Ok(next.unwrap_or_else(|| Some(default_bounds())))
    }

    fn send_text(&self, _window: &WindowHandle, text: &str) -> Result<()> {
        self.sent.borrow_mut().push(text.to_string());
        Ok(())
    }
}

/// OCR double replaying scripted frames in order.
///
/// When the script runs dry the last frame repeats, mimicking an unchanged
/// screen; an empty script observes an empty screen.
pub struct ScriptedOcr {
    frames: RefCell<VecDeque<Vec<String>>>,
    last: RefCell<Vec<String>>,
    failures_left: Cell<u32>,
}

impl ScriptedOcr {
    pub fn new(frames: Vec<Vec<String>>) -> Self {
        Self {
            frames: RefCell::new(frames.into()),
            last: RefCell::new(Vec::new()),
            failures_left: Cell::new(0),
        }
    }

    /// Fail the first observation, then replay `frames` normally.
    pub fn failing_then(frames: Vec<Vec<String>>) -> Self {
        let ocr = Self::new(frames);
        ocr.failures_left.set(1);
        ocr
    }
}

impl OcrService for ScriptedOcr {
    fn observe(&self, _region: &CaptureRegion) -> Result<Vec<String>> {
        let failures = self.failures_left.get();
        if failures > 0 {
            self.failures_left.set(failures - 1);
            return Err(anyhow!("scripted recognizer failure"));
        }
        if let Some(next) = self.frames.borrow_mut().pop_front() {
            *self.last.borrow_mut() = next.clone();
            return Ok(next);
        }
        Ok(self.last.borrow().clone())
    }
}
