//! Errors raised while querying the terminal for its cursor position.

use std::fmt;
use std::io;

/// The terminal-attribute operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    /// Reading the current attributes.
    Save,
    /// Switching to query mode.
    Apply,
    /// Discarding unread input before the query.
    Flush,
    /// Reapplying the saved attributes.
    Restore,
}

impl SettingsAction {
    const fn describe(self) -> &'static str {
        match self {
            Self::Save => "failed to obtain the current terminal settings",
            Self::Apply => "failed to modify the terminal settings",
            Self::Flush => "failed to flush the terminal's input queue",
            Self::Restore => "failed to restore the terminal settings",
        }
    }
}

/// Cursor position query failures.
///
/// Malformed replies never surface here: they are discarded and scanning
/// continues within the same read budget.
#[derive(Debug)]
pub enum CprError {
    /// Standard input is not a terminal.
    NotATerminal,
    /// The terminal descriptor could not be duplicated.
    Open(io::Error),
    /// Saving, applying, flushing or restoring attributes failed.
    TerminalSettings {
        action: SettingsAction,
        source: io::Error,
    },
    /// The timeout or signal routing could not be set up.
    Timer(io::Error),
    /// Writing the CPR request failed.
    Write(io::Error),
    /// Reading the reply failed.
    Read(io::Error),
    /// No valid reply before the deadline.
    Timeout,
    /// A routed signal cancelled the query.
    Interrupted,
    /// The terminal went quiet, closed, or exhausted the read budget.
    NoReply,
    /// The external helper program failed.
    Helper(String),
}

impl CprError {
    pub(crate) fn settings(action: SettingsAction, source: io::Error) -> Self {
        Self::TerminalSettings { action, source }
    }

    /// Whether the query ran out of time (as opposed to failing outright).
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl fmt::Display for CprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotATerminal => write!(
                f,
                "cannot determine the cursor position because stdin is not a tty"
            ),
            Self::Open(err) => write!(f, "failed to dup stdin: {err}"),
            Self::TerminalSettings { action, source } => {
                write!(f, "{}: {source}", action.describe())
            }
            Self::Timer(err) => write!(f, "failed to arm the response timer: {err}"),
            Self::Write(err) => {
                write!(f, "failed to write the CPR sequence to the terminal: {err}")
            }
            Self::Read(err) => write!(f, "failed to read from the terminal: {err}"),
            Self::Timeout => write!(f, "timed out waiting for the terminal to respond to CPR"),
            Self::Interrupted => write!(f, "interrupted while waiting for the CPR response"),
            Self::NoReply => write!(f, "failed to read the cursor position"),
            Self::Helper(msg) => write!(f, "cursor helper failed: {msg}"),
        }
    }
}

impl std::error::Error for CprError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open(err) | Self::Timer(err) | Self::Write(err) | Self::Read(err) => Some(err),
            Self::TerminalSettings { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A negative exit code handed to `eend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidExitCode(pub i32);

impl fmt::Display for InvalidExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not a valid return code", self.0)
    }
}

impl std::error::Error for InvalidExitCode {}
