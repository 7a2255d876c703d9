//! Messenger window automation via `osascript`.
//!
//! Every interaction with the chat client goes through small AppleScript
//! programs fed to `osascript` on stdin: locating the chat window by title,
//! raising it, measuring its frame, and submitting text through its input
//! field. The [`AutomationBackend`] trait is the seam that lets the round
//! and session loops run against a scripted double in tests.

use std::process::Command;
use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::debug;

use crate::io::process::run_command_with_timeout;

/// Process name the messenger runs under in System Events.
pub const DEFAULT_PROCESS: &str = "KakaoTalk";

const OSASCRIPT_TIMEOUT: Duration = Duration::from_secs(10);
const OSASCRIPT_OUTPUT_LIMIT: usize = 64 * 1024;

/// A located chat window, identified by its full title.
///
/// Later calls match the title with `contains`, the same test the lookup
/// used, so the handle stays valid across unread-count suffix changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowHandle {
    pub title: String,
}

impl WindowHandle {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// Screen frame of the chat window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl WindowBounds {
    /// Capture rectangle for the chat transcript: inset to keep the title
    /// bar, toolbar and input box out of the recognizer's view.
    pub fn chat_region(&self) -> CaptureRegion {
        CaptureRegion {
            left: self.left + 10,
            top: self.top + 80,
            width: (self.width - 20).max(0),
            height: (self.height - 180).max(0),
        }
    }
}

/// Rectangle handed to the screen capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

/// Window operations the session needs from the host desktop.
pub trait AutomationBackend {
    /// Find the chat window whose title contains `room`.
    fn locate(&self, room: &str) -> Result<Option<WindowHandle>>;

    /// Raise the window and give it focus.
    fn activate(&self, window: &WindowHandle) -> Result<()>;

    /// Current window frame, or `None` once the window is gone.
    fn bounds(&self, window: &WindowHandle) -> Result<Option<WindowBounds>>;

    /// Put `text` into the window's input field and submit it.
    fn send_text(&self, window: &WindowHandle, text: &str) -> Result<()>;
}

/// [`AutomationBackend`] driving the real messenger through System Events.
#[derive(Debug, Clone)]
pub struct OsaScriptBackend {
    process: String,
}

impl OsaScriptBackend {
    pub fn new(process: impl Into<String>) -> Self {
        Self {
            process: process.into(),
        }
    }

    fn run_script(&self, script: &str) -> Result<String> {
        let mut cmd = Command::new("osascript");
        cmd.arg("-");
        let output = run_command_with_timeout(
            cmd,
            Some(script.as_bytes()),
            OSASCRIPT_TIMEOUT,
            OSASCRIPT_OUTPUT_LIMIT,
        )?;
        if output.timed_out {
            bail!("osascript timed out");
        }
        if !output.status.success() {
            bail!("osascript failed: {}", output.stderr_text().trim());
        }
        Ok(output.stdout_text().trim().to_string())
    }
}

impl Default for OsaScriptBackend {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESS)
    }
}

impl AutomationBackend for OsaScriptBackend {
    fn locate(&self, room: &str) -> Result<Option<WindowHandle>> {
        let reply = self.run_script(&locate_script(&self.process, room))?;
        debug!(room, title = %reply, "window lookup");
        if reply.is_empty() {
            return Ok(None);
        }
        Ok(Some(WindowHandle::new(reply)))
    }

    fn activate(&self, window: &WindowHandle) -> Result<()> {
        self.run_script(&activate_script(&self.process, &window.title))?;
        // Give the window server a moment to finish raising.
        thread::sleep(Duration::from_millis(150));
        Ok(())
    }

    fn bounds(&self, window: &WindowHandle) -> Result<Option<WindowBounds>> {
        let reply = self.run_script(&bounds_script(&self.process, &window.title))?;
        Ok(parse_bounds(&reply))
    }

    fn send_text(&self, window: &WindowHandle, text: &str) -> Result<()> {
        debug!(text, "submitting text to chat input");
        self.run_script(&send_text_script(&self.process, &window.title, text))?;
        Ok(())
    }
}

/// Escape a value for interpolation into an AppleScript string literal.
fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn locate_script(process: &str, room: &str) -> String {
    format!(
        r#"tell application "System Events"
    tell process "{process}"
        set winNames to name of every window
        repeat with wName in winNames
            if wName contains "{room}" then
                return wName as text
            end if
        end repeat
    end tell
end tell
return """#,
        process = quote(process),
        room = quote(room),
    )
}

fn activate_script(process: &str, title: &str) -> String {
    format!(
        r#"tell application "System Events"
    tell process "{process}"
        set frontmost to true
        set wins to every window
        repeat with w in wins
            if name of w contains "{title}" then
                perform action "AXRaise" of w
                return true
            end if
        end repeat
    end tell
end tell
return false"#,
        process = quote(process),
        title = quote(title),
    )
}

fn bounds_script(process: &str, title: &str) -> String {
    format!(
        r#"tell application "System Events"
    tell process "{process}"
        set wins to every window
        repeat with w in wins
            if name of w contains "{title}" then
                set pos to position of w
                set sz to size of w
                return (item 1 of pos as string) & "," & (item 2 of pos as string) & "," & (item 1 of sz as string) & "," & (item 2 of sz as string)
            end if
        end repeat
    end tell
end tell
return """#,
        process = quote(process),
        title = quote(title),
    )
}

/// Text submission with a two-stage Return: the first one accepts the
/// client's command autocomplete popup, the second actually sends.
/// The input field sits under the window's 11th UI element in the current
/// client layout.
fn send_text_script(process: &str, title: &str, text: &str) -> String {
    format!(
        r#"tell application "System Events"
    tell process "{process}"
        set frontmost to true
        set wins to every window
        repeat with w in wins
            if name of w contains "{title}" then
                perform action "AXRaise" of w
                delay 0.2
                set inputScroll to UI element 11 of w
                set tf to UI element 1 of inputScroll
                set value of tf to "{text}"
                set focused of tf to true
                delay 0.6
                key code 36
                delay 0.3
                key code 36
                exit repeat
            end if
        end repeat
    end tell
end tell"#,
        process = quote(process),
        title = quote(title),
        text = quote(text),
    )
}

/// Parse the `left,top,width,height` reply from the bounds script.
///
/// System Events reports coordinates that may render as floats; they are
/// truncated toward zero. An empty or malformed reply means the window is
/// gone.
fn parse_bounds(reply: &str) -> Option<WindowBounds> {
    let parts: Vec<&str> = reply.split(',').collect();
    if parts.len() != 4 {
        return None;
    }
    let mut values = [0i32; 4];
    for (slot, part) in values.iter_mut().zip(&parts) {
        let parsed: f64 = part.trim().parse().ok()?;
        *slot = parsed as i32;
    }
    Some(WindowBounds {
        left: values[0],
        top: values[1],
        width: values[2],
        height: values[3],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bounds_accepts_integers_and_floats() {
        assert_eq!(
            parse_bounds("100,200,800,600"),
            Some(WindowBounds {
                left: 100,
                top: 200,
                width: 800,
                height: 600
            })
        );
        assert_eq!(
            parse_bounds("10.0, 20.5, 300.9, 400.1"),
            Some(WindowBounds {
                left: 10,
                top: 20,
                width: 300,
                height: 400
            })
        );
    }

    #[test]
    fn parse_bounds_rejects_empty_and_malformed_replies() {
        assert_eq!(parse_bounds(""), None);
        assert_eq!(parse_bounds("100,200,800"), None);
        assert_eq!(parse_bounds("a,b,c,d"), None);
    }

    #[test]
    fn chat_region_insets_the_frame() {
        let bounds = WindowBounds {
            left: 100,
            top: 200,
            width: 800,
            height: 600,
        };
        assert_eq!(
            bounds.chat_region(),
            CaptureRegion {
                left: 110,
                top: 280,
                width: 780,
                height: 420
            }
        );
    }

    #[test]
    fn chat_region_clamps_tiny_windows() {
        let bounds = WindowBounds {
            left: 0,
            top: 0,
            width: 15,
            height: 100,
        };
        let region = bounds.chat_region();
        assert_eq!(region.width, 0);
        assert_eq!(region.height, 0);
    }

    #[test]
    fn scripts_escape_embedded_quotes() {
        let script = locate_script("KakaoTalk", r#"my "fancy" room"#);
        assert!(script.contains(r#"contains "my \"fancy\" room""#));

        let script = send_text_script("KakaoTalk", "room", r#"say "hi""#);
        assert!(script.contains(r#"set value of tf to "say \"hi\"""#));
    }

    #[test]
    fn send_script_uses_two_stage_return() {
        let script = send_text_script("KakaoTalk", "room", "/강화");
        assert_eq!(script.matches("key code 36").count(), 2);
        assert!(script.contains(r#"set value of tf to "/강화""#));
    }
}
