//! Print the cursor position of the terminal on stdin as `"<row> <col>"`.
//!
//! Exits with status 1 and a diagnostic on stderr when stdin is not a terminal,
//! the terminal settings cannot be changed, or no reply arrives in time.

use std::io::{self, Write};
use std::process::ExitCode;

#[cfg(unix)]
fn run() -> Result<einfo_core::CursorPosition, einfo_core::CprError> {
    let settings = einfo_core::Settings::from_env();
    let mut tty = einfo_tty::StdinTty::open()?.with_signal_routing()?;
    einfo_core::query_cursor_position(&mut tty, &settings.cpr)
}

#[cfg(not(unix))]
fn run() -> Result<einfo_core::CursorPosition, einfo_core::CprError> {
    Err(einfo_core::CprError::NotATerminal)
}

fn main() -> ExitCode {
    einfo_tty::logging::init();
    match run() {
        Ok(position) => {
            let mut stdout = io::stdout().lock();
            if writeln!(stdout, "{position}").and_then(|()| stdout.flush()).is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!(error = ?err, "cursor position query failed");
            eprintln!("ecma48-cpr: {err}");
            ExitCode::FAILURE
        }
    }
}
