//! Live terminal probe for the einfo reporter.
//!
//! How the window size and cursor position are obtained is decided once, when
//! the probe is built:
//!
//! | Query | Source | Mechanism |
//! |-------|--------|-----------|
//! | size | [`DimensionSource::Winsize`] | `TIOCGWINSZ` on stdout |
//! | size | [`DimensionSource::Stty`] | `stty size`, output `"<rows> <cols>"` |
//! | cursor | [`CursorSource::Native`] | in-process CPR on stdin |
//! | cursor | [`CursorSource::Helper`] | an `ecma48-cpr` program, output `"<row> <col>"` |

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use einfo_core::{CprConfig, CprError, CursorPosition, Dimensions, TerminalProbe, query_cursor_position};

use crate::device::StdinTty;

/// Where the window size comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionSource {
    Winsize,
    Stty,
}

/// Where the cursor position comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorSource {
    Native,
    Helper(PathBuf),
    /// Stdin is not a terminal.
    Unavailable,
}

/// Parse two whitespace-separated numbers, as printed by `stty size` and
/// `ecma48-cpr`.
#[must_use]
pub fn parse_pair(text: &str) -> Option<(u16, u16)> {
    let mut fields = text.split_whitespace();
    let first = fields.next()?.parse().ok()?;
    let second = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some((first, second))
}

fn winsize() -> io::Result<Dimensions> {
    let ws = rustix::termios::tcgetwinsize(io::stdout()).map_err(io::Error::from)?;
    Dimensions::new(ws.ws_row, ws.ws_col)
        .ok_or_else(|| io::Error::other("terminal reported a zero window size"))
}

fn stty_size() -> io::Result<Dimensions> {
    let output = Command::new("stty")
        .arg("size")
        .stdin(Stdio::inherit())
        .stderr(Stdio::null())
        .output()?;
    if !output.status.success() {
        return Err(io::Error::other(format!("stty size failed: {}", output.status)));
    }
    let text = String::from_utf8_lossy(&output.stdout);
    parse_pair(&text)
        .and_then(|(rows, cols)| Dimensions::new(rows, cols))
        .ok_or_else(|| io::Error::other(format!("unexpected stty output: {:?}", text.trim())))
}

/// [`TerminalProbe`] over the process's stdin and stdout.
#[derive(Debug, Clone)]
pub struct NativeProbe {
    dimensions: DimensionSource,
    cursor: CursorSource,
    cpr: CprConfig,
    route_signals: bool,
}

impl NativeProbe {
    /// Pick the sources available right now.
    ///
    /// The window size is read with `TIOCGWINSZ` when stdout answers it and
    /// with `stty size` otherwise. The cursor is queried in-process when
    /// stdin is a terminal.
    #[must_use]
    pub fn detect(cpr: CprConfig) -> Self {
        let dimensions = if winsize().is_ok() {
            DimensionSource::Winsize
        } else {
            DimensionSource::Stty
        };
        let cursor = if io::stdin().is_terminal() {
            CursorSource::Native
        } else {
            CursorSource::Unavailable
        };
        tracing::debug!(?dimensions, ?cursor, "terminal probe sources resolved");
        Self::with_sources(dimensions, cursor, cpr)
    }

    #[must_use]
    pub fn with_sources(dimensions: DimensionSource, cursor: CursorSource, cpr: CprConfig) -> Self {
        Self {
            dimensions,
            cursor,
            cpr,
            route_signals: false,
        }
    }

    /// Query the cursor through an external helper program instead.
    #[must_use]
    pub fn with_cursor_helper(mut self, program: impl Into<PathBuf>) -> Self {
        self.cursor = CursorSource::Helper(program.into());
        self
    }

    /// Let `SIGINT`/`SIGTERM` cancel native cursor queries.
    #[must_use]
    pub fn with_signal_routing(mut self, enabled: bool) -> Self {
        self.route_signals = enabled;
        self
    }

    #[must_use]
    pub fn dimension_source(&self) -> DimensionSource {
        self.dimensions
    }

    #[must_use]
    pub fn cursor_source(&self) -> &CursorSource {
        &self.cursor
    }

    fn native_cursor(&self) -> Result<CursorPosition, CprError> {
        let mut tty = StdinTty::open()?;
        if self.route_signals {
            tty = tty.with_signal_routing()?;
        }
        query_cursor_position(&mut tty, &self.cpr)
    }

    fn helper_cursor(program: &Path) -> Result<CursorPosition, CprError> {
        let output = Command::new(program)
            .stdin(Stdio::inherit())
            .output()
            .map_err(|err| CprError::Helper(format!("{}: {err}", program.display())))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr.trim();
            return Err(CprError::Helper(if reason.is_empty() {
                format!("{} exited with {}", program.display(), output.status)
            } else {
                reason.to_owned()
            }));
        }
        let text = String::from_utf8_lossy(&output.stdout);
        parse_pair(&text)
            .and_then(|(row, col)| CursorPosition::new(row, col))
            .ok_or_else(|| CprError::Helper(format!("unexpected output: {:?}", text.trim())))
    }
}

impl TerminalProbe for NativeProbe {
    fn is_terminal(&self) -> bool {
        io::stdin().is_terminal() && io::stdout().is_terminal()
    }

    fn is_stderr_terminal(&self) -> bool {
        io::stderr().is_terminal()
    }

    fn dimensions(&mut self) -> io::Result<Dimensions> {
        match self.dimensions {
            DimensionSource::Winsize => winsize(),
            DimensionSource::Stty => stty_size(),
        }
    }

    fn cursor_position(&mut self) -> Result<CursorPosition, CprError> {
        let result = match &self.cursor {
            CursorSource::Native => self.native_cursor(),
            CursorSource::Helper(program) => Self::helper_cursor(program),
            CursorSource::Unavailable => Err(CprError::NotATerminal),
        };
        if let Err(err) = &result {
            tracing::debug!(error = %err, source = ?self.cursor, "cursor query failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_parsing() {
        assert_eq!(parse_pair("24 80\n"), Some((24, 80)));
        assert_eq!(parse_pair("  3\t17 "), Some((3, 17)));
        assert_eq!(parse_pair("24"), None);
        assert_eq!(parse_pair("24 80 1"), None);
        assert_eq!(parse_pair("rows cols"), None);
        assert_eq!(parse_pair("70000 1"), None);
    }

    #[test]
    fn unavailable_cursor_source_reports_not_a_terminal() {
        let mut probe = NativeProbe::with_sources(
            DimensionSource::Winsize,
            CursorSource::Unavailable,
            CprConfig::default(),
        );
        assert!(matches!(probe.cursor_position(), Err(CprError::NotATerminal)));
    }

    #[test]
    fn helper_failure_surfaces_its_diagnostic() {
        let mut probe = NativeProbe::with_sources(
            DimensionSource::Stty,
            CursorSource::Unavailable,
            CprConfig::default(),
        )
        .with_cursor_helper("/nonexistent/ecma48-cpr");
        match probe.cursor_position() {
            Err(CprError::Helper(msg)) => assert!(msg.contains("/nonexistent/ecma48-cpr")),
            other => panic!("expected helper error, got {other:?}"),
        }
    }

    #[test]
    fn helper_without_a_position_is_an_error() {
        let mut probe = NativeProbe::with_sources(
            DimensionSource::Winsize,
            CursorSource::Helper(PathBuf::from("echo")),
            CprConfig::default(),
        );
        // `echo` with no arguments prints an empty line.
        assert!(matches!(probe.cursor_position(), Err(CprError::Helper(_))));

        let mut probe = probe.with_cursor_helper("true");
        assert!(matches!(probe.cursor_position(), Err(CprError::Helper(_))));
    }
}
