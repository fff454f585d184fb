//! Clipboard writes through the system clipboard and a platform copy command.
//!
//! On X11/Wayland the copy command goes first: `xclip`/`xsel` keep serving the
//! selection after fleetview exits, an in-process owner does not.

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

use thiserror::Error;

use crate::render::format::{NOT_ASSIGNED, NOT_AVAILABLE};

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("system clipboard unavailable: {0}")]
    System(#[from] arboard::Error),

    #[error("clipboard command '{command}' failed: {source}")]
    Command {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("clipboard command '{0}' exited unsuccessfully")]
    CommandStatus(String),

    #[error("no clipboard command available")]
    NoCommand,
}

pub trait ClipboardBackend {
    fn name(&self) -> &'static str;
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Empty values and placeholders are never copied.
pub fn is_copyable(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != NOT_AVAILABLE && value != NOT_ASSIGNED
}

/// System clipboard using arboard, opened lazily.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self { inner: None }
    }
}

impl ClipboardBackend for SystemClipboard {
    fn name(&self) -> &'static str {
        "system"
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.inner.is_none() {
            self.inner = Some(arboard::Clipboard::new()?);
        }
        if let Some(clipboard) = self.inner.as_mut() {
            write_system(clipboard, text)?;
        }
        Ok(())
    }
}

/// How long an X11/Wayland selection is served before the process may exit.
pub const SELECTION_HOLD: Duration = Duration::from_secs(3);

// X11 and Wayland selections are served by the owning process, so the write
// blocks until another client takes ownership or the hold expires.
#[cfg(all(
    unix,
    not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))
))]
fn write_system(clipboard: &mut arboard::Clipboard, text: &str) -> Result<(), ClipboardError> {
    use arboard::SetExtLinux;

    let deadline = std::time::Instant::now() + SELECTION_HOLD;
    clipboard.set().wait_until(deadline).text(text.to_string())?;
    Ok(())
}

#[cfg(not(all(
    unix,
    not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))
)))]
fn write_system(clipboard: &mut arboard::Clipboard, text: &str) -> Result<(), ClipboardError> {
    clipboard.set_text(text.to_string())?;
    Ok(())
}

/// True where a copy command outlives the process and should be tried first.
pub fn prefers_command_backend() -> bool {
    cfg!(all(
        unix,
        not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))
    ))
}

pub type CopyCommand = (&'static str, &'static [&'static str]);

const NO_ARGS: &[&str] = &[];
const XCLIP_ARGS: &[&str] = &["-selection", "clipboard"];
const XSEL_ARGS: &[&str] = &["--clipboard", "--input"];

/// Pipes the text into the first copy command that succeeds on this platform.
pub struct CommandClipboard {
    candidates: Vec<CopyCommand>,
}

impl Default for CommandClipboard {
    fn default() -> Self {
        let candidates = if cfg!(target_os = "macos") {
            vec![("pbcopy", NO_ARGS)]
        } else if cfg!(target_os = "windows") {
            vec![("clip", NO_ARGS)]
        } else {
            vec![("xclip", XCLIP_ARGS), ("xsel", XSEL_ARGS)]
        };
        Self { candidates }
    }
}

impl CommandClipboard {
    pub fn with_commands(candidates: Vec<CopyCommand>) -> Self {
        Self { candidates }
    }

    fn run(program: &str, args: &[&str], text: &str) -> Result<(), ClipboardError> {
        let io_err = |source: std::io::Error| ClipboardError::Command {
            command: program.to_string(),
            source,
        };
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(io_err)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).map_err(io_err)?;
        }
        let status = child.wait().map_err(io_err)?;
        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::CommandStatus(program.to_string()))
        }
    }
}

impl ClipboardBackend for CommandClipboard {
    fn name(&self) -> &'static str {
        "command"
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut last_err = ClipboardError::NoCommand;
        for (program, args) in &self.candidates {
            match Self::run(program, args, text) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    log::debug!("clipboard command {program} failed: {e}");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}

/// Primary backend with one fallback.
pub struct Clipboard {
    primary: Box<dyn ClipboardBackend>,
    fallback: Box<dyn ClipboardBackend>,
}

impl Default for Clipboard {
    fn default() -> Self {
        let system: Box<dyn ClipboardBackend> = Box::new(SystemClipboard::new());
        let command: Box<dyn ClipboardBackend> = Box::new(CommandClipboard::default());
        if prefers_command_backend() {
            Self::new(command, system)
        } else {
            Self::new(system, command)
        }
    }
}

impl Clipboard {
    pub fn new(primary: Box<dyn ClipboardBackend>, fallback: Box<dyn ClipboardBackend>) -> Self {
        Self { primary, fallback }
    }

    /// Backend names in the order they are tried.
    pub fn backend_order(&self) -> [&'static str; 2] {
        [self.primary.name(), self.fallback.name()]
    }

    /// Returns the name of the backend that accepted the text.
    pub fn copy(&mut self, text: &str) -> Result<&'static str, ClipboardError> {
        match self.primary.set_text(text) {
            Ok(()) => Ok(self.primary.name()),
            Err(e) => {
                log::warn!("{} clipboard failed, trying fallback: {e}", self.primary.name());
                self.fallback.set_text(text)?;
                Ok(self.fallback.name())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Records writes; fails every write when `fail` is set.
    #[derive(Clone, Default)]
    pub struct RecordingBackend {
        pub name: &'static str,
        pub fail: bool,
        pub writes: Rc<RefCell<Vec<String>>>,
    }

    impl RecordingBackend {
        pub fn new(name: &'static str, fail: bool) -> Self {
            Self {
                name,
                fail,
                writes: Rc::default(),
            }
        }
    }

    impl ClipboardBackend for RecordingBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            self.writes.borrow_mut().push(text.to_string());
            if self.fail {
                Err(ClipboardError::CommandStatus(self.name.to_string()))
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingBackend;
    use super::*;

    #[test]
    fn placeholders_are_not_copyable() {
        assert!(!is_copyable(""));
        assert!(!is_copyable("  "));
        assert!(!is_copyable("N/A"));
        assert!(!is_copyable("Not assigned"));
        assert!(is_copyable("5CD123"));
    }

    #[test]
    fn falls_back_when_primary_fails() {
        let primary = RecordingBackend::new("system", true);
        let fallback = RecordingBackend::new("command", false);
        let writes = fallback.writes.clone();
        let mut clipboard = Clipboard::new(Box::new(primary), Box::new(fallback));
        assert_eq!(clipboard.copy("5CD123").unwrap(), "command");
        assert_eq!(writes.borrow().as_slice(), ["5CD123"]);
    }

    #[test]
    fn default_order_follows_platform() {
        let clipboard = Clipboard::default();
        if cfg!(target_os = "linux") {
            assert!(prefers_command_backend());
            assert_eq!(clipboard.backend_order(), ["command", "system"]);
        } else if cfg!(any(target_os = "macos", target_os = "windows")) {
            assert_eq!(clipboard.backend_order(), ["system", "command"]);
        }
    }

    #[test]
    fn primary_success_skips_fallback() {
        let fallback = RecordingBackend::new("command", false);
        let writes = fallback.writes.clone();
        let mut clipboard = Clipboard::new(
            Box::new(RecordingBackend::new("system", false)),
            Box::new(fallback),
        );
        assert_eq!(clipboard.copy("x").unwrap(), "system");
        assert!(writes.borrow().is_empty());
    }

    #[test]
    fn missing_command_reports_error() {
        let mut backend =
            CommandClipboard::with_commands(vec![("fleetview-no-such-clipboard-tool", NO_ARGS)]);
        assert!(matches!(
            backend.set_text("x"),
            Err(ClipboardError::Command { .. })
        ));
        let mut none = CommandClipboard::with_commands(Vec::new());
        assert!(matches!(none.set_text("x"), Err(ClipboardError::NoCommand)));
    }
}
