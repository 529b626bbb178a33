#![forbid(unsafe_code)]

//! Core: terminal grading, cursor position reports, and status-indicator placement.
//!
//! Everything here is platform-neutral. Real terminals are reached through the
//! [`tty_session::TtyDevice`] and [`capability::TerminalProbe`] traits, which the
//! `einfo-tty` crate implements for Unix.

pub mod cancel;
pub mod capability;
pub mod cpr;
pub mod cursor;
pub mod error;
pub mod indicator;
pub mod reporter;
pub mod settings;
pub mod style;
pub mod tty_session;

#[cfg(test)]
pub(crate) mod testing;

pub use capability::{CapabilityGrader, Dimensions, TerminalProbe, TerminalState, TtyLevel};
pub use cpr::{CprConfig, CursorPosition, query_cursor_position};
pub use error::{CprError, InvalidExitCode};
pub use indicator::{IndicatorPlacer, IndicatorRequest, Placement, Status};
pub use reporter::Reporter;
pub use settings::Settings;
