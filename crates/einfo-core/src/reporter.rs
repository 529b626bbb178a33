//! Init-script style progress messages.
//!
//! ```text
//!  * Mounting filesystems ...                                  [ ok ]
//!  * Starting sshd ...                                         [ !! ]
//!  * sshd: missing host key
//! ```
//!
//! `ebegin` leaves a step open and `eend` closes it with an indicator placed by
//! [`IndicatorPlacer`]. On a smart terminal `ebegin` records the cursor right
//! after its message and moves to a fresh line, so output produced by the step
//! itself does not collide with the indicator. Elsewhere the line is left open
//! and the indicator is appended to it.
//!
//! Informational messages go to stdout, warnings and errors to stderr.

use std::io::{self, Write};

use crate::capability::{CapabilityGrader, TerminalProbe, TerminalState, TtyLevel};
use crate::cursor;
use crate::indicator::{IndicatorPlacer, IndicatorRequest, Placement};
use crate::settings::Settings;
use crate::style::{Palette, Tone};

/// Columns added per indentation level.
pub const INDENT_STEP: usize = 2;

/// Maximum indentation in columns.
pub const MAX_INDENT: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Out,
    Err,
}

/// Writes progress messages and status indicators.
#[derive(Debug)]
pub struct Reporter<P, O = io::Stdout, E = io::Stderr> {
    out: O,
    err: E,
    probe: P,
    state: TerminalState,
    grader: CapabilityGrader,
    placer: IndicatorPlacer,
    settings: Settings,
    indent: usize,
}

impl<P: TerminalProbe> Reporter<P> {
    /// A reporter on the process's stdout and stderr.
    pub fn stdio(probe: P, settings: Settings) -> Self {
        Self::with_writers(probe, settings, io::stdout(), io::stderr())
    }
}

impl<P, O, E> Reporter<P, O, E>
where
    P: TerminalProbe,
    O: Write,
    E: Write,
{
    pub fn with_writers(probe: P, settings: Settings, out: O, err: E) -> Self {
        Self {
            out,
            err,
            probe,
            state: TerminalState::default(),
            grader: CapabilityGrader::new(settings.grade, settings.dumb_term),
            placer: IndicatorPlacer::new(Palette::new(settings.color), settings.column_offset()),
            settings,
            indent: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> &TerminalState {
        &self.state
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current indentation in columns.
    #[must_use]
    pub fn indent(&self) -> usize {
        self.indent
    }

    /// The stdout writer.
    pub fn out(&self) -> &O {
        &self.out
    }

    /// The stderr writer.
    pub fn err(&self) -> &E {
        &self.err
    }

    /// Grade the terminal now.
    pub fn level(&mut self) -> TtyLevel {
        self.grader.grade(&mut self.state, &mut self.probe)
    }

    /// Informational message.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails. Likewise for every message method.
    pub fn einfo(&mut self, msg: &str) -> io::Result<()> {
        if self.settings.quiet {
            return Ok(());
        }
        self.message(Stream::Out, Tone::Good, msg, true)
    }

    /// Informational message without a trailing newline.
    pub fn einfon(&mut self, msg: &str) -> io::Result<()> {
        if self.settings.quiet {
            return Ok(());
        }
        self.message(Stream::Out, Tone::Good, msg, false)
    }

    pub fn ewarn(&mut self, msg: &str) -> io::Result<()> {
        if self.settings.quiet {
            return Ok(());
        }
        self.message(Stream::Err, Tone::Warn, msg, true)
    }

    /// Error message; never silenced.
    pub fn eerror(&mut self, msg: &str) -> io::Result<()> {
        self.message(Stream::Err, Tone::Bad, msg, true)
    }

    /// Start a step: `" * msg ..."`.
    pub fn ebegin(&mut self, msg: &str) -> io::Result<()> {
        if self.settings.quiet {
            return Ok(());
        }
        let msg = msg.trim_end_matches('\n');
        self.flush_pending_newline()?;
        self.write_prefix(Stream::Out, Tone::Good)?;
        write!(self.out, "{msg} ...")?;

        self.state.cursor = None;
        if self.level() == TtyLevel::Smart {
            cursor::save(&mut self.out)?;
            self.out.flush()?;
            match self.probe.cursor_position() {
                Ok(position) => self.state.cursor = Some(position),
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(error = %_err, "cursor query after ebegin failed");
                }
            }
            self.out.write_all(b"\n")?;
        } else {
            self.state.pending_newline = true;
        }
        self.out.flush()
    }

    /// Close the current step with `[ ok ]` for zero or `[ !! ]` otherwise.
    ///
    /// A failing code with a message prints it through [`Reporter::eerror`]
    /// first. Returns the code, with negative codes replaced by 2.
    pub fn eend(&mut self, code: i32, msg: Option<&str>) -> io::Result<i32> {
        self.end("eend", code, msg, false)
    }

    /// Like [`Reporter::eend`], but failures are shown as warnings.
    pub fn ewend(&mut self, code: i32, msg: Option<&str>) -> io::Result<i32> {
        self.end("ewend", code, msg, true)
    }

    /// Indent later messages by one step.
    pub fn eindent(&mut self) {
        self.eindent_by(1);
    }

    /// Outdent later messages by one step.
    pub fn eoutdent(&mut self) {
        self.eoutdent_by(1);
    }

    pub fn eindent_by(&mut self, steps: usize) {
        self.indent = self
            .indent
            .saturating_add(steps.saturating_mul(INDENT_STEP))
            .min(MAX_INDENT);
    }

    pub fn eoutdent_by(&mut self, steps: usize) {
        self.indent = self
            .indent
            .saturating_sub(steps.saturating_mul(INDENT_STEP));
    }

    pub fn veinfo(&mut self, msg: &str) -> io::Result<()> {
        if !self.settings.verbose {
            return Ok(());
        }
        self.einfo(msg)
    }

    pub fn vewarn(&mut self, msg: &str) -> io::Result<()> {
        if !self.settings.verbose {
            return Ok(());
        }
        self.ewarn(msg)
    }

    pub fn vebegin(&mut self, msg: &str) -> io::Result<()> {
        if !self.settings.verbose {
            return Ok(());
        }
        self.ebegin(msg)
    }

    /// Returns `code` untouched when verbose mode is off.
    pub fn veend(&mut self, code: i32, msg: Option<&str>) -> io::Result<i32> {
        if !self.settings.verbose {
            return Ok(code);
        }
        self.eend(code, msg)
    }

    /// Returns `code` untouched when verbose mode is off.
    pub fn vewend(&mut self, code: i32, msg: Option<&str>) -> io::Result<i32> {
        if !self.settings.verbose {
            return Ok(code);
        }
        self.ewend(code, msg)
    }

    fn end(&mut self, caller: &str, code: i32, msg: Option<&str>, warning: bool) -> io::Result<i32> {
        let (mut request, invalid) = IndicatorRequest::coerce(code, msg.map(str::to_owned));
        if let Some(invalid) = invalid {
            writeln!(self.err, "{caller}: {invalid}")?;
        }
        if warning {
            request = request.as_warning();
        }
        let code = request.exit_code();

        if code != 0
            && let Some(text) = request.message()
        {
            if warning {
                self.ewarn(text)?;
            } else {
                self.eerror(text)?;
            }
        }

        if code == 0 && self.settings.quiet {
            self.state.cursor = None;
            return Ok(code);
        }

        let _placement: Placement = self.placer.place(
            &mut self.out,
            &mut self.state,
            &self.grader,
            &mut self.probe,
            request,
        )?;
        #[cfg(feature = "tracing")]
        tracing::trace!(code, placement = ?_placement, "step closed");
        Ok(code)
    }

    fn message(&mut self, stream: Stream, tone: Tone, msg: &str, newline: bool) -> io::Result<()> {
        self.flush_pending_newline()?;
        self.write_prefix(stream, tone)?;
        let writer: &mut dyn Write = match stream {
            Stream::Out => &mut self.out,
            Stream::Err => &mut self.err,
        };
        writer.write_all(msg.as_bytes())?;
        if newline {
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        if stream == Stream::Out {
            self.state.pending_newline = !newline;
        }
        Ok(())
    }

    /// `" * "` plus indentation, colored only when `stream` is a terminal.
    fn write_prefix(&mut self, stream: Stream, tone: Tone) -> io::Result<()> {
        let indent = self.indent;
        match stream {
            Stream::Out => {
                let palette = Palette::new(self.settings.color && self.probe.is_terminal());
                write_prefix_to(&mut self.out, palette, tone, indent)
            }
            Stream::Err => {
                let palette = Palette::new(self.settings.color && self.probe.is_stderr_terminal());
                write_prefix_to(&mut self.err, palette, tone, indent)
            }
        }
    }

    fn flush_pending_newline(&mut self) -> io::Result<()> {
        if self.state.pending_newline {
            self.state.pending_newline = false;
            self.out.write_all(b"\n")?;
            self.out.flush()?;
        }
        Ok(())
    }
}

fn write_prefix_to<W: Write>(w: &mut W, palette: Palette, tone: Tone, indent: usize) -> io::Result<()> {
    w.write_all(b" ")?;
    palette.paint(w, tone, "*")?;
    write!(w, " {:indent$}", "")
}
