#![forbid(unsafe_code)]
//! Native Unix terminal access for einfo.
//!
//! Implements the [`einfo_core`] device and probe traits on top of termios and
//! `poll(2)`, and backs the `ecma48-cpr` and `consoletype` helper programs.

pub mod consoletype;
#[cfg(unix)]
pub mod device;
pub mod logging;
#[cfg(unix)]
pub mod probe;

pub use consoletype::ConsoleType;
#[cfg(unix)]
pub use device::StdinTty;
#[cfg(unix)]
pub use probe::{CursorSource, DimensionSource, NativeProbe};

/// A reporter on stdout/stderr backed by the live terminal.
#[cfg(unix)]
pub type StdioReporter = einfo_core::Reporter<NativeProbe>;

/// Build a [`StdioReporter`] from the process environment.
#[cfg(unix)]
#[must_use]
pub fn stdio_reporter() -> StdioReporter {
    let settings = einfo_core::Settings::from_env();
    let probe = NativeProbe::detect(settings.cpr.clone());
    einfo_core::Reporter::stdio(probe, settings)
}
