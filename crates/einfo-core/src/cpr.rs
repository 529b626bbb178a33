//! ECMA-48 Cursor Position Report (CPR) query.
//!
//! Query:    `ESC [ 6 n`
//! Response: `ESC [ Pr ; Pc R` (both 1-based)
//!
//! # Safety Contract
//!
//! - **Bounded wait**: an [`AlarmTimer`] cancels the read after
//!   [`CprConfig::timeout`] (default 250ms). A cancelled query returns within
//!   one read slice.
//! - **Bounded reads**: at most [`CprConfig::max_reads`] reads (default 20), so a
//!   terminal dribbling bytes forever cannot stall the caller.
//! - **Bounded buffer**: replies accumulate in [`CprConfig::buffer_size`] bytes
//!   (default 100).
//! - **Tolerant scanning**: an escape sequence that is not a CPR reply is skipped
//!   and scanning continues with later bytes.
//! - **Restoration**: the terminal is put back through [`RawTtySession`] on every
//!   path, including timeouts and interrupts.

use std::fmt;
use std::time::Duration;

use crate::cancel::{AlarmTimer, CancelReason};
use crate::error::{CprError, SettingsAction};
use crate::tty_session::{RawTtySession, Recv, TtyDevice};

/// The CPR request sequence.
pub const CPR_QUERY: &[u8] = b"\x1b[6n";

/// Default wall-clock budget for a reply.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(250);

/// Default read-iteration budget.
pub const DEFAULT_MAX_READS: u32 = 20;

/// Default reply buffer size in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 100;

/// Default `VTIME` (deciseconds of inter-byte silence ending a read).
pub const DEFAULT_INTER_BYTE_DECISECONDS: u8 = 1;

const ESC: u8 = 0x1b;

/// A 1-based cursor position as reported by the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorPosition {
    pub row: u16,
    pub col: u16,
}

impl CursorPosition {
    /// Build a position; both coordinates must be at least 1.
    #[must_use]
    pub const fn new(row: u16, col: u16) -> Option<Self> {
        if row == 0 || col == 0 {
            None
        } else {
            Some(Self { row, col })
        }
    }
}

impl fmt::Display for CursorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.row, self.col)
    }
}

/// Tunables for a CPR query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CprConfig {
    /// Wall-clock budget for the whole reply.
    pub timeout: Duration,
    /// Maximum number of reads before giving up.
    pub max_reads: u32,
    /// Reply buffer size in bytes.
    pub buffer_size: usize,
    /// `VTIME` applied while querying.
    pub inter_byte_deciseconds: u8,
}

impl Default for CprConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_reads: DEFAULT_MAX_READS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            inter_byte_deciseconds: DEFAULT_INTER_BYTE_DECISECONDS,
        }
    }
}

impl CprConfig {
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn max_reads(mut self, reads: u32) -> Self {
        self.max_reads = reads;
        self
    }

    #[must_use]
    pub const fn buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes;
        self
    }

    #[must_use]
    pub const fn inter_byte_deciseconds(mut self, deciseconds: u8) -> Self {
        self.inter_byte_deciseconds = deciseconds;
        self
    }
}

/// Find the first well-formed CPR reply anywhere in `bytes`.
///
/// Every `ESC` is tried in turn, so noise or an unrelated escape sequence in
/// front of the reply does not hide it. Zero coordinates are rejected.
#[must_use]
pub fn parse_cpr_reply(bytes: &[u8]) -> Option<CursorPosition> {
    bytes
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == ESC)
        .find_map(|(i, _)| parse_at(&bytes[i..]))
}

fn parse_at(seq: &[u8]) -> Option<CursorPosition> {
    let rest = seq.strip_prefix(b"\x1b[")?;
    let (row, rest) = split_number(rest)?;
    let rest = rest.strip_prefix(b";")?;
    let (col, rest) = split_number(rest)?;
    if rest.first() != Some(&b'R') {
        return None;
    }
    CursorPosition::new(row, col)
}

fn split_number(bytes: &[u8]) -> Option<(u16, &[u8])> {
    let len = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if len == 0 {
        return None;
    }
    let value = std::str::from_utf8(&bytes[..len]).ok()?.parse().ok()?;
    Some((value, &bytes[len..]))
}

/// Accumulates reply bytes in a fixed buffer and rescans after each read.
#[derive(Debug)]
pub struct ReplyScanner {
    buf: Vec<u8>,
    filled: usize,
}

impl ReplyScanner {
    /// A scanner holding at most `capacity - 1` bytes, like a C string buffer.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity.max(1)],
            filled: 0,
        }
    }

    /// Space left for the next read.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        let limit = self.buf.len() - 1;
        &mut self.buf[self.filled..limit]
    }

    /// Whether no further bytes fit.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.filled >= self.buf.len() - 1
    }

    /// Record `n` freshly read bytes and rescan.
    pub fn commit(&mut self, n: usize) -> Option<CursorPosition> {
        let limit = self.buf.len() - 1;
        self.filled = (self.filled + n).min(limit);
        parse_cpr_reply(self.filled())
    }

    /// Bytes received so far.
    #[must_use]
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.filled]
    }
}

/// Ask `device` for its cursor position.
///
/// The device is switched into query mode for the duration of the call and
/// restored before returning, whatever the outcome.
///
/// # Errors
///
/// - [`CprError::TerminalSettings`] when saving, applying, flushing or
///   restoring the terminal attributes fails.
/// - [`CprError::Timeout`] when no valid reply arrives within the timeout.
/// - [`CprError::Interrupted`] when a routed signal cancels the read.
/// - [`CprError::NoReply`] when the read budget or buffer runs out, or the
///   terminal closes.
pub fn query_cursor_position<D: TtyDevice>(
    device: &mut D,
    config: &CprConfig,
) -> Result<CursorPosition, CprError> {
    let mut session = RawTtySession::enter(device, config.inter_byte_deciseconds)?;
    let outcome = exchange(session.device(), config);
    match (outcome, session.restore()) {
        (Ok(position), Ok(())) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(row = position.row, col = position.col, "cpr reply parsed");
            Ok(position)
        }
        (Ok(_), Err(err)) => Err(err),
        (Err(err), _restored) => {
            #[cfg(feature = "tracing")]
            if let Err(restore_err) = &_restored {
                tracing::warn!(error = %restore_err, "tty restore failed after cpr error");
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(error = %err, "cpr query failed");
            Err(err)
        }
    }
}

fn exchange<D: TtyDevice>(device: &mut D, config: &CprConfig) -> Result<CursorPosition, CprError> {
    device
        .discard_input()
        .map_err(|err| CprError::settings(SettingsAction::Flush, err))?;
    device.send(CPR_QUERY).map_err(CprError::Write)?;

    let token = device.cancel_token();
    let alarm = AlarmTimer::arm(config.timeout, token.clone()).map_err(CprError::Timer)?;

    let mut scanner = ReplyScanner::new(config.buffer_size);
    let mut result = Err(CprError::NoReply);
    for _ in 0..config.max_reads {
        if scanner.is_full() {
            break;
        }
        match device.recv(scanner.spare_mut(), &token) {
            Ok(Recv::Data(n)) => {
                if let Some(position) = scanner.commit(n) {
                    result = Ok(position);
                    break;
                }
            }
            Ok(Recv::Cancelled | Recv::Closed) => break,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
            Err(err) => {
                result = Err(CprError::Read(err));
                break;
            }
        }
    }
    alarm.disarm();

    if result.is_ok() {
        return result;
    }
    match token.reason() {
        Some(CancelReason::Deadline) => Err(CprError::Timeout),
        Some(CancelReason::Interrupt) => Err(CprError::Interrupted),
        None => result,
    }
}
