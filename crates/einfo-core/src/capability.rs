//! Terminal grading with a throttled dimension query.
//!
//! # Levels
//!
//! | Level | Condition |
//! |-------|-----------|
//! | [`TtyLevel::None`] | stdin/stdout is not a terminal |
//! | [`TtyLevel::Dumb`] | a terminal whose `TERM` contains `dumb`, or whose size query fails |
//! | [`TtyLevel::Smart`] | a terminal reporting positive dimensions |
//!
//! Cursor position support is assumed for smart terminals and verified lazily
//! by the indicator placer.
//!
//! # Throttling
//!
//! Size queries can cost a fork per call (`stty size`). Within
//! [`GradeConfig::throttle`] of the last query the cached dimensions and level
//! are reused. The first grading of a terminal always queries.

use std::io;
use std::time::{Duration, Instant};

use crate::cpr::CursorPosition;
use crate::error::CprError;

/// Default window in which a size query is reused.
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(500);

/// How capable the terminal is of cursor positioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TtyLevel {
    /// Not a terminal (pipes, files, logs).
    #[default]
    None = 0,
    /// A terminal that cannot be positioned reliably.
    Dumb = 1,
    /// A terminal that reports its dimensions.
    Smart = 2,
}

impl TtyLevel {
    /// Numeric level, 0 through 2.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Terminal size in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub rows: u16,
    pub cols: u16,
}

impl Dimensions {
    /// Build dimensions; both must be positive.
    #[must_use]
    pub const fn new(rows: u16, cols: u16) -> Option<Self> {
        if rows == 0 || cols == 0 {
            None
        } else {
            Some(Self { rows, cols })
        }
    }
}

/// Everything known about the terminal in this process.
///
/// `cursor` holds the position recorded right after the last in-progress
/// message. Output printed since then may have scrolled it off its row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminalState {
    pub level: TtyLevel,
    pub dimensions: Option<Dimensions>,
    pub cursor: Option<CursorPosition>,
    /// When the dimensions were last queried.
    pub last_probe: Option<Instant>,
    /// The last stdout message left its line open.
    pub pending_newline: bool,
}

/// Access to the live terminal.
pub trait TerminalProbe {
    /// Whether both standard input and standard output are terminals.
    fn is_terminal(&self) -> bool;

    /// Whether standard error is a terminal.
    fn is_stderr_terminal(&self) -> bool;

    /// Query the window size.
    fn dimensions(&mut self) -> io::Result<Dimensions>;

    /// Query the cursor position.
    fn cursor_position(&mut self) -> Result<CursorPosition, CprError>;
}

/// Grading tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeConfig {
    /// Window in which a previous size query is reused.
    pub throttle: Duration,
}

impl Default for GradeConfig {
    fn default() -> Self {
        Self {
            throttle: DEFAULT_THROTTLE,
        }
    }
}

/// Classifies the terminal into a [`TtyLevel`].
#[derive(Debug, Clone)]
pub struct CapabilityGrader {
    config: GradeConfig,
    dumb_term: bool,
}

impl CapabilityGrader {
    /// `dumb_term` marks a `TERM` that declares itself dumb.
    #[must_use]
    pub const fn new(config: GradeConfig, dumb_term: bool) -> Self {
        Self { config, dumb_term }
    }

    /// The configured tunables.
    #[must_use]
    pub const fn config(&self) -> GradeConfig {
        self.config
    }

    /// Grade the terminal now.
    pub fn grade<P: TerminalProbe + ?Sized>(
        &self,
        state: &mut TerminalState,
        probe: &mut P,
    ) -> TtyLevel {
        self.grade_at(state, probe, Instant::now())
    }

    /// Grade the terminal as of `now`.
    pub fn grade_at<P: TerminalProbe + ?Sized>(
        &self,
        state: &mut TerminalState,
        probe: &mut P,
        now: Instant,
    ) -> TtyLevel {
        if !probe.is_terminal() {
            Self::demote(state, TtyLevel::None);
            return state.level;
        }
        if self.dumb_term {
            Self::demote(state, TtyLevel::Dumb);
            return state.level;
        }
        if let Some(last) = state.last_probe
            && now.saturating_duration_since(last) < self.config.throttle
        {
            return state.level;
        }

        state.last_probe = Some(now);
        match probe.dimensions() {
            Ok(dims) => {
                state.dimensions = Some(dims);
                state.level = TtyLevel::Smart;
            }
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %_err, "size query failed; grading terminal as dumb");
                state.dimensions = None;
                state.cursor = None;
                state.level = TtyLevel::Dumb;
            }
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(level = state.level.as_u8(), dims = ?state.dimensions, "terminal graded");
        state.level
    }

    fn demote(state: &mut TerminalState, level: TtyLevel) {
        state.level = level;
        state.dimensions = None;
        state.cursor = None;
        state.last_probe = None;
    }
}
