//! Right-aligned `[ ok ]` / `[ !! ]` status indicators.
//!
//! The placer tries to put the indicator at the right edge of the line that
//! holds the in-progress message. It only does so when the terminal is smart,
//! its size has not changed since the message was printed, and the position
//! recorded after the message is known:
//!
//! ```text
//! * Starting sshd ...                                      [ ok ]
//!                   ^ DECRC here, then CHA to cols - 6
//! ```
//!
//! Every other situation, and any failure while probing, falls back to the
//! plain form `" [ ok ]\n"` which contains no positioning bytes.

use std::io::{self, Write};

use crate::capability::{CapabilityGrader, TerminalProbe, TerminalState, TtyLevel};
use crate::cpr::CursorPosition;
use crate::cursor;
use crate::error::InvalidExitCode;
use crate::style::{Palette, Tone};

/// Width of the indicator itself: `[ ok ]`.
pub const INDICATOR_COLUMNS: i32 = 6;

/// Width of the indicator with its leading separator: `" [ ok ]"`.
pub const INDICATOR_SPAN: i32 = INDICATOR_COLUMNS + 1;

/// Outcome shown by the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Failed,
    /// A failure reported as a warning (`ewend`).
    Warning,
}

impl Status {
    /// `Ok` for exit code zero, `Failed` otherwise.
    #[must_use]
    pub const fn from_exit_code(code: i32) -> Self {
        if code == 0 { Self::Ok } else { Self::Failed }
    }

    /// Text between the brackets.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Failed | Self::Warning => "!!",
        }
    }

    const fn tone(self) -> Tone {
        match self {
            Self::Ok => Tone::Good,
            Self::Failed => Tone::Bad,
            Self::Warning => Tone::Warn,
        }
    }
}

/// A finished step waiting for its indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorRequest {
    exit_code: i32,
    message: Option<String>,
    warning: bool,
}

impl IndicatorRequest {
    /// # Errors
    ///
    /// Returns [`InvalidExitCode`] when `exit_code` is negative.
    pub fn new(exit_code: i32, message: Option<String>) -> Result<Self, InvalidExitCode> {
        if exit_code < 0 {
            return Err(InvalidExitCode(exit_code));
        }
        Ok(Self {
            exit_code,
            message,
            warning: false,
        })
    }

    /// Like [`IndicatorRequest::new`], but a negative code is replaced by 2
    /// and the rejection is handed back for reporting.
    #[must_use]
    pub fn coerce(exit_code: i32, message: Option<String>) -> (Self, Option<InvalidExitCode>) {
        let invalid = (exit_code < 0).then_some(InvalidExitCode(exit_code));
        let request = Self {
            exit_code: if invalid.is_some() { 2 } else { exit_code },
            message,
            warning: false,
        };
        (request, invalid)
    }

    /// Show a failure as a warning.
    #[must_use]
    pub fn as_warning(mut self) -> Self {
        self.warning = true;
        self
    }

    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// The explanatory message, if one was given and is not blank.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }

    #[must_use]
    pub const fn status(&self) -> Status {
        match Status::from_exit_code(self.exit_code) {
            Status::Failed if self.warning => Status::Warning,
            status => status,
        }
    }
}

/// Where the indicator ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Appended to the current output with no cursor movement.
    Plain,
    /// Moved right to `column` on the message line.
    Aligned { column: u16 },
    /// The message filled the line exactly; printed where the cursor was.
    InPlace,
    /// The message overran the line; printed on a new line at `column`.
    Wrapped { column: u16 },
}

/// Columns to move right from `col` so that the indicator ends at the last
/// column. `offset` is added as-is (negative to keep clear of the margin).
#[must_use]
pub fn indicator_indent(cols: u16, col: u16, offset: i32) -> i32 {
    i32::from(cols) - i32::from(col) - INDICATOR_COLUMNS + offset
}

/// Column at which an indicator starts on a fresh line.
fn wrapped_column(cols: u16, offset: i32) -> u16 {
    let column = i32::from(cols) - INDICATOR_COLUMNS + offset;
    u16::try_from(column.max(1)).unwrap_or(1)
}

/// Writes status indicators, positioned when the terminal allows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorPlacer {
    palette: Palette,
    column_offset: i32,
}

impl IndicatorPlacer {
    /// `column_offset` is added to every computed indent (see
    /// [`crate::Settings::column_offset`]).
    #[must_use]
    pub const fn new(palette: Palette, column_offset: i32) -> Self {
        Self {
            palette,
            column_offset,
        }
    }

    #[must_use]
    pub const fn column_offset(&self) -> i32 {
        self.column_offset
    }

    /// Write the indicator for `request`.
    ///
    /// The request's message is not printed here. Probing failures are
    /// absorbed by falling back to plain output; only write errors surface.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn place<W, P>(
        &self,
        out: &mut W,
        state: &mut TerminalState,
        grader: &CapabilityGrader,
        probe: &mut P,
        request: IndicatorRequest,
    ) -> io::Result<Placement>
    where
        W: Write,
        P: TerminalProbe + ?Sized,
    {
        let previous_dims = state.dimensions;
        let saved = state.cursor.take();
        let level = grader.grade(state, probe);
        let palette = Palette::new(self.palette.is_enabled() && level > TtyLevel::None);

        let placement = match (level, previous_dims, saved) {
            (TtyLevel::Smart, Some(before), Some(saved)) if state.dimensions == Some(before) => {
                self.position(out, probe, before.cols, saved)?
            }
            _ => {
                #[cfg(feature = "tracing")]
                tracing::trace!(
                    level = level.as_u8(),
                    resized = previous_dims != state.dimensions,
                    known_cursor = saved.is_some(),
                    "indicator placed without positioning"
                );
                Placement::Plain
            }
        };

        write_indicator(out, palette, request.status())?;
        out.flush()?;
        state.pending_newline = false;
        Ok(placement)
    }

    fn position<W, P>(
        &self,
        out: &mut W,
        probe: &mut P,
        cols: u16,
        saved: CursorPosition,
    ) -> io::Result<Placement>
    where
        W: Write,
        P: TerminalProbe + ?Sized,
    {
        cursor::restore(out)?;
        out.flush()?;

        let now = match probe.cursor_position() {
            Ok(now) => now,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %_err, "cursor query failed; indicator placed plainly");
                return Ok(Placement::Plain);
            }
        };

        let drift = i32::from(now.row) - i32::from(saved.row);
        let col = if drift == 0 || drift == 1 {
            now.col
        } else {
            #[cfg(feature = "tracing")]
            tracing::debug!(drift, saved = %saved, "restored cursor drifted; moving back");
            cursor::move_to(out, saved)?;
            saved.col
        };

        let indent = indicator_indent(cols, col, self.column_offset);
        match indent {
            i32::MIN..=-1 => {
                let column = wrapped_column(cols, self.column_offset);
                out.write_all(b"\n")?;
                cursor::move_to_column(out, column)?;
                Ok(Placement::Wrapped { column })
            }
            0 => Ok(Placement::InPlace),
            _ => {
                let column = u16::try_from(i32::from(col) + indent).unwrap_or(cols);
                cursor::move_to_column(out, column)?;
                Ok(Placement::Aligned { column })
            }
        }
    }
}

/// Write `" [ ok ]\n"` or `" [ !! ]\n"`.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_indicator<W: Write>(
    out: &mut W,
    palette: Palette,
    status: Status,
) -> io::Result<()> {
    out.write_all(b" ")?;
    palette.paint(out, Tone::Bracket, "[ ")?;
    palette.paint(out, status.tone(), status.label())?;
    palette.paint(out, Tone::Bracket, " ]")?;
    out.write_all(b"\n")
}
