//! Print whether stdin is a `vt`, `serial` line, `pty` or `unknown`.
//!
//! The exit status is the class index (0 through 3), or 0 when the first
//! argument is `stdout`.

use std::env;
use std::io::{self, Write};
use std::process::ExitCode;

use einfo_tty::ConsoleType;

#[cfg(unix)]
fn classify() -> ConsoleType {
    einfo_tty::consoletype::detect()
}

#[cfg(not(unix))]
fn classify() -> ConsoleType {
    ConsoleType::Unknown
}

fn main() -> ExitCode {
    einfo_tty::logging::init();
    let class = classify();
    let mut stdout = io::stdout().lock();
    if writeln!(stdout, "{class}").and_then(|()| stdout.flush()).is_err() {
        return ExitCode::FAILURE;
    }
    if env::args().nth(1).is_some_and(|arg| arg == "stdout") {
        return ExitCode::SUCCESS;
    }
    ExitCode::from(u8::try_from(class.exit_code()).unwrap_or(u8::MAX))
}
